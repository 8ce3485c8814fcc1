//! Demo link orchestrator - coordinates all components.
//!
//! Wires the sensor peer (simulator + dispatcher + monitor + durable
//! pump) to the companion peer (router + session runtime + collaborators)
//! over an in-process `MemoryLink` pair, runs the scripted workout, and
//! collects statistics from every stage.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{LinkProfile, SyncStatus};
use dispatcher::{MemoryLink, OutboundDispatcher, SessionMonitor};
use ingestion::InboundRouter;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::collaborators::{JsonWorkoutStore, LoggingProfileStore};
use crate::simulator::WorkoutSimulator;
use consistency::{SessionRuntime, SessionSnapshot};

use super::LinkStats;

/// How long to wait for teardown and durable flush during shutdown
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Demo link configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The loaded link profile
    pub profile: LinkProfile,

    /// Simulated workout duration override (None = use profile)
    pub duration_override: Option<f64>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main demo link orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the demo link to completion
    pub async fn run(self) -> Result<LinkStats> {
        let start_time = Instant::now();
        let profile = &self.config.profile;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Transport pair: sensor side drives the link condition
        let (sensor, companion) = MemoryLink::pair(profile.dispatch.immediate_capacity);
        info!(
            immediate_capacity = profile.dispatch.immediate_capacity,
            "Transport pair created"
        );

        // Sensor peer: dispatcher + monitor + durable pump
        let dispatcher = Arc::new(OutboundDispatcher::new(Arc::clone(&sensor)));
        let (monitor, state_rx) = SessionMonitor::new(
            Arc::clone(&sensor),
            Arc::clone(&dispatcher),
            profile.probe_interval(),
        );
        let monitor_handle = monitor.spawn();
        let pump_handle =
            sensor.spawn_pump(Duration::from_millis(profile.dispatch.durable_pump_interval_ms));

        // Companion peer: router + session runtime + collaborators
        let mut router = InboundRouter::new(companion.inbox(), profile.dispatch.channel_capacity);
        let inbound_rx = router
            .take_receiver()
            .context("Failed to take router receiver")?;
        let router_metrics = router.metrics();
        let router_handle = router.spawn();

        let workout_store = JsonWorkoutStore::new(profile.storage.output_dir.clone());
        let (runtime, snapshot_rx) = SessionRuntime::new(
            profile.to_session_config(),
            inbound_rx,
            workout_store,
            LoggingProfileStore,
        );
        let runtime_handle = runtime.spawn();

        // Log companion-side status transitions as they are published
        let status_logger = tokio::spawn(log_status_transitions(snapshot_rx.clone()));

        // Sensor peer: the scripted workout
        let mut plan = profile.simulation.clone();
        if let Some(duration) = self.config.duration_override {
            info!(duration_secs = duration, "Overriding workout duration");
            plan.duration_secs = duration;
        }

        let simulator =
            WorkoutSimulator::new(plan, Arc::clone(&dispatcher), Arc::clone(&sensor));
        let simulator_report = simulator.run().await;

        // Let the completion message land and the session tear down
        let mut snapshot_rx = snapshot_rx;
        wait_for_teardown(&mut snapshot_rx).await;
        flush_durable(&sensor, profile.dispatch.durable_pump_interval_ms).await;

        let dispatch_snapshot = dispatcher.metrics().snapshot();
        let router_snapshot = router_metrics.snapshot();

        // Shutdown: closing both endpoints unwinds router, runtime, pump
        info!("Shutting down link...");
        sensor.close();
        companion.close();

        let session_stats = runtime_handle
            .await
            .context("Session runtime task failed")?;
        let _ = tokio::time::timeout(Duration::from_secs(5), router_handle).await;
        let _ = tokio::time::timeout(Duration::from_secs(5), pump_handle).await;
        let _ = status_logger.await;

        // Monitor exits once its last state receiver is gone
        drop(state_rx);
        let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, monitor_handle).await;

        let stats = LinkStats {
            simulator: simulator_report,
            dispatch: dispatch_snapshot,
            router: router_snapshot,
            session: session_stats.summary(),
            duration: start_time.elapsed(),
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            frames_accepted = stats.session.total_frames,
            "Link shutdown complete"
        );

        Ok(stats)
    }
}

/// Log every published sync-status transition until the runtime exits
async fn log_status_transitions(mut snapshot_rx: watch::Receiver<SessionSnapshot>) {
    let mut last = snapshot_rx.borrow().status.clone();
    while snapshot_rx.changed().await.is_ok() {
        let status = snapshot_rx.borrow().status.clone();
        if status != last {
            info!(
                from = last.as_str(),
                to = status.as_str(),
                "Session status changed"
            );
            last = status;
        }
    }
}

/// Wait (bounded) for the companion session to tear down after completion
async fn wait_for_teardown(snapshot_rx: &mut watch::Receiver<SessionSnapshot>) {
    let wait = async {
        loop {
            if snapshot_rx.borrow().status == SyncStatus::Disconnected {
                break;
            }
            if snapshot_rx.changed().await.is_err() {
                break;
            }
        }
    };

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait).await.is_err() {
        warn!("Session did not tear down before shutdown timeout");
    }
}

/// Wait (bounded) for the durable outbox to drain
async fn flush_durable(sensor: &Arc<MemoryLink>, pump_interval_ms: u64) {
    let interval = Duration::from_millis(pump_interval_ms.max(1));
    let deadline = Instant::now() + SHUTDOWN_TIMEOUT;

    while sensor.durable_pending() > 0 {
        if Instant::now() >= deadline {
            warn!(
                pending = sensor.durable_pending(),
                "Durable outbox not fully drained before shutdown"
            );
            break;
        }
        tokio::time::sleep(interval).await;
    }
}
