//! Session runtime - single-writer loop around the consistency engine.
//!
//! Owns all companion-side mutable session state (engine, clock, sample
//! windows, workout history) and multiplexes three inputs with
//! `tokio::select!`: typed inbound messages, the display clock tick, and
//! the frame-timeout chain. Readers observe the session only through the
//! published `SessionSnapshot` watch channel.

use std::time::{Duration, Instant};

use async_channel::Receiver;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use analysis::{cadence_optimization, efficiency_trend, overtraining_risk, pace_stability, SampleWindow};
use contracts::{
    InboundMessage, ProfileStore, SessionConfig, SyncStatus, TelemetryFrame, WorkoutStore,
    WorkoutSummary,
};
use observability::SessionStatsAggregator;

use crate::engine::ConsistencyEngine;
use crate::snapshot::{AnalysisReport, SessionSnapshot};

/// Parks the timeout timer while no session is active
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365);

/// Timeout chain phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeoutPhase {
    /// No session; timer parked
    Disarmed,
    /// Frame timeout armed
    Armed,
    /// Timeout fired; grace window running
    Grace,
}

/// Index-aligned per-metric sample windows
struct MetricWindows {
    pace: SampleWindow,
    cadence: SampleWindow,
    heart_rate: SampleWindow,
}

impl MetricWindows {
    fn new(capacity: usize) -> Self {
        Self {
            pace: SampleWindow::new(capacity),
            cadence: SampleWindow::new(capacity),
            heart_rate: SampleWindow::new(capacity),
        }
    }

    fn push(&mut self, frame: &TelemetryFrame) {
        self.pace.push(frame.pace_sec_per_km);
        self.cadence.push(frame.cadence_spm);
        self.heart_rate.push(frame.heart_rate_bpm);
    }

    fn clear(&mut self) {
        self.pace.clear();
        self.cadence.clear();
        self.heart_rate.clear();
    }
}

/// Companion-side session runtime
pub struct SessionRuntime<W: WorkoutStore, P: ProfileStore> {
    config: SessionConfig,
    engine: ConsistencyEngine,
    inbound: Receiver<InboundMessage>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    workout_store: W,
    profile_store: P,
    windows: MetricWindows,
    /// One mean efficiency per completed workout, oldest first
    workout_efficiencies: Vec<f64>,
    latest_analysis: Option<AnalysisReport>,
    accepted_since_report: u64,
    stats: SessionStatsAggregator,
}

impl<W, P> SessionRuntime<W, P>
where
    W: WorkoutStore + Send + 'static,
    P: ProfileStore + Send + 'static,
{
    /// Create a runtime over a typed inbound stream.
    ///
    /// Returns the runtime and the snapshot watch receiver.
    pub fn new(
        config: SessionConfig,
        inbound: Receiver<InboundMessage>,
        workout_store: W,
        profile_store: P,
    ) -> (Self, watch::Receiver<SessionSnapshot>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
        let windows = MetricWindows::new(config.window_capacity);
        let engine = ConsistencyEngine::new(config.clone());

        (
            Self {
                config,
                engine,
                inbound,
                snapshot_tx,
                workout_store,
                profile_store,
                windows,
                workout_efficiencies: Vec::new(),
                latest_analysis: None,
                accepted_since_report: 0,
                stats: SessionStatsAggregator::new(),
            },
            snapshot_rx,
        )
    }

    /// Spawn the runtime loop; resolves to the session statistics once
    /// the inbound stream closes
    pub fn spawn(self) -> JoinHandle<SessionStatsAggregator> {
        tokio::spawn(async move { self.run().await })
    }

    /// Run the session loop until the inbound stream closes
    #[instrument(name = "session_runtime_run", skip(self))]
    pub async fn run(mut self) -> SessionStatsAggregator {
        let mut clock_tick = tokio::time::interval(self.config.clock_tick);
        clock_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let timeout = tokio::time::sleep(FAR_FUTURE);
        tokio::pin!(timeout);
        let mut timeout_phase = TimeoutPhase::Disarmed;

        info!(
            frame_timeout_ms = self.config.frame_timeout.as_millis() as u64,
            teardown_grace_ms = self.config.teardown_grace.as_millis() as u64,
            "Session runtime started"
        );

        loop {
            tokio::select! {
                message = self.inbound.recv() => {
                    let Ok(message) = message else {
                        debug!("Inbound stream closed");
                        break;
                    };
                    match message {
                        InboundMessage::Realtime(frame) => {
                            self.handle_frame(frame);
                            timeout_phase = TimeoutPhase::Armed;
                            timeout.as_mut().reset(
                                tokio::time::Instant::now() + self.config.frame_timeout,
                            );
                        }
                        InboundMessage::WorkoutComplete(summary) => {
                            self.finish_workout(Some(summary)).await;
                            timeout_phase = TimeoutPhase::Disarmed;
                            timeout.as_mut().reset(tokio::time::Instant::now() + FAR_FUTURE);
                        }
                        InboundMessage::WorkoutEnd => {
                            self.finish_workout(None).await;
                            timeout_phase = TimeoutPhase::Disarmed;
                            timeout.as_mut().reset(tokio::time::Instant::now() + FAR_FUTURE);
                        }
                        InboundMessage::ProfileSync(fields) => {
                            self.apply_profile(fields).await;
                        }
                    }
                }

                _ = clock_tick.tick() => {
                    if self.engine.is_receiving() {
                        self.publish();
                    }
                }

                () = &mut timeout => {
                    match timeout_phase {
                        TimeoutPhase::Armed => {
                            if self.engine.mark_timeout() {
                                observability::record_sync_status(self.engine.status());
                                self.publish();
                            }
                            timeout_phase = TimeoutPhase::Grace;
                            timeout.as_mut().reset(
                                tokio::time::Instant::now() + self.config.teardown_grace,
                            );
                        }
                        TimeoutPhase::Grace => {
                            warn!("Grace window expired, tearing session down");
                            self.teardown();
                            timeout_phase = TimeoutPhase::Disarmed;
                            timeout.as_mut().reset(tokio::time::Instant::now() + FAR_FUTURE);
                        }
                        TimeoutPhase::Disarmed => {
                            timeout.as_mut().reset(tokio::time::Instant::now() + FAR_FUTURE);
                        }
                    }
                }
            }
        }

        info!(
            frames = self.stats.total_frames,
            "Session runtime stopped"
        );
        self.stats
    }

    /// Accept one realtime frame through the consistency engine
    fn handle_frame(&mut self, frame: TelemetryFrame) {
        let was_synchronized = *self.engine.status() == SyncStatus::Synchronized;
        let accepted = self.engine.accept(frame, Instant::now());

        observability::record_frame_accepted(&accepted.meta);
        if !was_synchronized {
            observability::record_sync_status(self.engine.status());
        }
        self.stats.update(&accepted.frame, &accepted.meta);
        self.windows.push(&accepted.frame);

        self.accepted_since_report += 1;
        if self.accepted_since_report >= self.config.report_interval_frames {
            self.accepted_since_report = 0;
            self.latest_analysis = Some(self.run_analysis());
        }

        self.publish();
    }

    /// Run every analysis function over the current windows
    fn run_analysis(&self) -> AnalysisReport {
        let paces = self.windows.pace.values();
        let cadences = self.windows.cadence.values();
        let heart_rates = self.windows.heart_rate.values();

        AnalysisReport {
            stability: pace_stability(&paces),
            efficiency: efficiency_trend(&paces, &heart_rates),
            cadence: cadence_optimization(&paces, &cadences, &heart_rates),
            risk: overtraining_risk(&self.workout_efficiencies),
        }
    }

    /// End the session, recording the workout when a summary arrived
    async fn finish_workout(&mut self, summary: Option<WorkoutSummary>) {
        // One mean efficiency per workout feeds the risk score
        let paces = self.windows.pace.values();
        let heart_rates = self.windows.heart_rate.values();
        if let Some(trend) = efficiency_trend(&paces, &heart_rates) {
            self.workout_efficiencies.push(trend.mean);
        }

        if let Some(summary) = summary {
            info!(
                total_calories = summary.total_calories,
                is_assessment = summary.is_assessment,
                "Workout complete, storing summary"
            );
            match self.workout_store.store_workout(&summary).await {
                Ok(()) => {
                    observability::metrics::record_workout_stored(self.workout_store.name());
                }
                Err(e) => {
                    error!(store = self.workout_store.name(), error = %e, "Workout store failed");
                }
            }
        } else {
            info!("End-of-session signal received");
        }

        self.teardown();
    }

    /// Forward synced profile fields to the collaborator, untouched
    async fn apply_profile(&mut self, fields: serde_json::Map<String, serde_json::Value>) {
        debug!(fields = fields.len(), "Applying profile sync");
        match self.profile_store.apply_profile(&fields).await {
            Ok(()) => {
                observability::metrics::record_profile_applied(self.profile_store.name());
            }
            Err(e) => {
                error!(store = self.profile_store.name(), error = %e, "Profile store failed");
            }
        }
    }

    /// Tear down session state and publish the disconnected snapshot
    fn teardown(&mut self) {
        self.engine.teardown();
        self.windows.clear();
        self.latest_analysis = None;
        self.accepted_since_report = 0;
        observability::record_sync_status(self.engine.status());
        self.publish();
    }

    /// Publish the current snapshot to every watcher
    fn publish(&self) {
        let snapshot = SessionSnapshot {
            status: self.engine.status().clone(),
            display_elapsed: self.engine.display_elapsed(Instant::now()).unwrap_or(0.0),
            frame: self.engine.last_frame().cloned(),
            frame_count: self.engine.frame_count(),
            analysis: self.latest_analysis.clone(),
        };
        observability::record_display_elapsed(snapshot.display_elapsed);
        let _ = self.snapshot_tx.send(snapshot);
    }
}
