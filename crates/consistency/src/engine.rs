//! Temporal consistency engine.
//!
//! Corrects rather than rejects: structurally valid frames that violate
//! temporal monotonicity are adjusted in place against the last accepted
//! frame, so the display never runs backwards and never freezes waiting
//! for a retransmit.

use std::time::Instant;

use tracing::{debug, info, warn};

use contracts::{CorrectionKind, FrameMeta, SessionConfig, SyncStatus, TelemetryFrame};

use crate::clock::SessionClock;

/// Engine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No active session
    Idle,
    /// Frames arriving, clock running
    Receiving,
    /// Frame timeout fired; retained state survives until teardown
    TimedOut,
}

/// One accepted frame plus its acceptance metadata
#[derive(Debug, Clone)]
pub struct Accepted {
    pub frame: TelemetryFrame,
    pub meta: FrameMeta,
}

/// Per-session consistency engine
#[derive(Debug)]
pub struct ConsistencyEngine {
    config: SessionConfig,
    phase: Phase,
    status: SyncStatus,
    last_frame: Option<TelemetryFrame>,
    clock: Option<SessionClock>,
    frame_count: u64,
    last_arrival: Option<Instant>,
}

impl ConsistencyEngine {
    /// Create an idle engine
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            status: SyncStatus::Disconnected,
            last_frame: None,
            clock: None,
            frame_count: 0,
            last_arrival: None,
        }
    }

    /// Current session status
    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// Whether frames are currently being received
    pub fn is_receiving(&self) -> bool {
        self.phase == Phase::Receiving
    }

    /// Frames accepted this session
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The last accepted (corrected) frame
    pub fn last_frame(&self) -> Option<&TelemetryFrame> {
        self.last_frame.as_ref()
    }

    /// Extrapolated elapsed time, None while no session clock exists
    pub fn display_elapsed(&self, now: Instant) -> Option<f64> {
        self.clock.map(|clock| clock.display_elapsed(now))
    }

    /// Accept a structurally valid frame, correcting temporal violations.
    ///
    /// Never fails: structural rejection happened upstream, and temporal
    /// problems are corrected here, not refused.
    pub fn accept(&mut self, mut frame: TelemetryFrame, now: Instant) -> Accepted {
        let recovered_from_timeout = self.phase == Phase::TimedOut;
        let mut corrections = Vec::new();

        if let Some(last) = &self.last_frame {
            if frame.elapsed_time <= last.elapsed_time {
                let corrected = last.elapsed_time + self.config.elapsed_step_secs;
                warn!(
                    observed = frame.elapsed_time,
                    corrected,
                    last = last.elapsed_time,
                    "Elapsed time regressed, bumping forward"
                );
                frame.elapsed_time = corrected;
                corrections.push(CorrectionKind::ElapsedRegression);
            }

            if frame.distance_meters < last.distance_meters {
                warn!(
                    observed = frame.distance_meters,
                    corrected = last.distance_meters,
                    "Distance regressed, holding flat"
                );
                frame.distance_meters = last.distance_meters;
                corrections.push(CorrectionKind::DistanceRegression);
            } else if frame.distance_meters - last.distance_meters > self.config.max_distance_jump_m
            {
                let corrected = last.distance_meters + self.config.distance_epsilon_m;
                warn!(
                    observed = frame.distance_meters,
                    corrected,
                    last = last.distance_meters,
                    "Implausible distance jump, clamping"
                );
                frame.distance_meters = corrected;
                corrections.push(CorrectionKind::DistanceJump);
            }
        }

        let arrival_gap_secs = self
            .last_arrival
            .map(|previous| now.duration_since(previous).as_secs_f64());
        self.last_arrival = Some(now);

        // Reseed, never average: the frame's elapsed time wins outright
        match &mut self.clock {
            Some(clock) => clock.reseed(frame.elapsed_time, now),
            None => {
                info!(elapsed = frame.elapsed_time, "Session clock seeded");
                self.clock = Some(SessionClock::seed(frame.elapsed_time, now));
            }
        }

        if recovered_from_timeout {
            debug!("Frame arrived during grace window, session re-established");
        }
        if self.status != SyncStatus::Synchronized {
            info!(from = self.status.as_str(), "Session synchronized");
            self.status = SyncStatus::Synchronized;
        }
        self.phase = Phase::Receiving;

        let meta = FrameMeta {
            frame_index: self.frame_count,
            arrival_gap_secs,
            corrections,
            recovered_from_timeout,
        };
        self.frame_count += 1;
        self.last_frame = Some(frame.clone());

        Accepted { frame, meta }
    }

    /// Frame timeout fired. Returns true when the engine transitioned
    /// into the timed-out phase (grace window begins).
    pub fn mark_timeout(&mut self) -> bool {
        if self.phase != Phase::Receiving {
            return false;
        }
        warn!(
            frames = self.frame_count,
            "Frame timeout, entering grace window"
        );
        self.phase = Phase::TimedOut;
        self.status = SyncStatus::Timeout;
        true
    }

    /// Tear the session down: discard the clock and retained state
    pub fn teardown(&mut self) {
        if self.phase != Phase::Idle {
            info!(frames = self.frame_count, "Session torn down");
        }
        self.phase = Phase::Idle;
        self.status = SyncStatus::Disconnected;
        self.last_frame = None;
        self.clock = None;
        self.frame_count = 0;
        self.last_arrival = None;
    }
}
