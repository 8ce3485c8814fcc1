//! Session metrics collection
//!
//! Records delivery-core metrics from FrameMeta and the dispatcher/monitor
//! and aggregates in-memory statistics for the end-of-run summary.

use contracts::{ConnectionState, CorrectionKind, FrameMeta, Priority, SyncStatus, TelemetryFrame};
use metrics::{counter, gauge, histogram};

/// Record an accepted telemetry frame
///
/// Call once per frame accepted by the consistency engine.
pub fn record_frame_accepted(meta: &FrameMeta) {
    counter!("stridelink_frames_total").increment(1);
    gauge!("stridelink_last_frame_index").set(meta.frame_index as f64);

    if let Some(gap) = meta.arrival_gap_secs {
        histogram!("stridelink_frame_gap_ms").record(gap * 1000.0);
    }

    if meta.corrected() {
        counter!("stridelink_frames_corrected_total").increment(1);
        for kind in &meta.corrections {
            counter!("stridelink_corrections_total", "kind" => kind.as_str()).increment(1);
        }
    }

    if meta.recovered_from_timeout {
        counter!("stridelink_timeout_recoveries_total").increment(1);
    }
}

/// Record a rejected inbound envelope
pub fn record_envelope_rejected(reason: &str) {
    counter!("stridelink_envelopes_rejected_total", "reason" => reason.to_string()).increment(1);
}

/// Record an outbound dispatch outcome
pub fn record_dispatch_outcome(priority: Priority, outcome: &str) {
    counter!(
        "stridelink_dispatch_total",
        "priority" => priority.as_str(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record the current retry queue depth
pub fn record_retry_queue_depth(depth: usize) {
    gauge!("stridelink_retry_queue_depth").set(depth as f64);
}

/// Record the observed connection state (0 = disconnected, 1 = weak, 2 = strong)
pub fn record_connection_state(state: ConnectionState) {
    let value = match state {
        ConnectionState::Disconnected => 0.0,
        ConnectionState::Weak => 1.0,
        ConnectionState::Strong => 2.0,
    };
    gauge!("stridelink_connection_state").set(value);
    counter!("stridelink_connection_transitions_total", "state" => state.as_str()).increment(1);
}

/// Record the companion-side session status (0 = disconnected, 1 = synchronized, 2 = timeout, 3 = error)
pub fn record_sync_status(status: &SyncStatus) {
    let value = match status {
        SyncStatus::Disconnected => 0.0,
        SyncStatus::Synchronized => 1.0,
        SyncStatus::Timeout => 2.0,
        SyncStatus::Error(_) => 3.0,
    };
    gauge!("stridelink_sync_status").set(value);
    counter!("stridelink_sync_status_transitions_total", "status" => status.as_str()).increment(1);
}

/// Record the companion-side display clock (seconds since session start)
pub fn record_display_elapsed(elapsed_secs: f64) {
    gauge!("stridelink_display_elapsed_seconds").set(elapsed_secs);
}

/// Record the durable outbox depth
pub fn record_durable_pending(depth: usize) {
    gauge!("stridelink_durable_pending").set(depth as f64);
}

/// Record a stored workout summary
pub fn record_workout_stored(store_name: &str) {
    counter!("stridelink_workouts_stored_total", "store" => store_name.to_string()).increment(1);
}

/// Record an applied profile sync
pub fn record_profile_applied(store_name: &str) {
    counter!("stridelink_profiles_applied_total", "store" => store_name.to_string()).increment(1);
}

/// Session statistics aggregator
///
/// Aggregates per-frame statistics in memory for the end-of-run summary.
#[derive(Debug, Clone, Default)]
pub struct SessionStatsAggregator {
    /// Total accepted frames
    pub total_frames: u64,

    /// Frames that needed at least one correction
    pub corrected_frames: u64,

    /// Elapsed-time regression corrections
    pub elapsed_regressions: u64,

    /// Distance regression corrections
    pub distance_regressions: u64,

    /// Implausible distance jump corrections
    pub distance_jumps: u64,

    /// Silent recoveries after a frame timeout
    pub timeout_recoveries: u64,

    /// Inter-frame arrival gap statistics (ms)
    pub gap_stats: RunningStats,

    /// Pace statistics (sec/km)
    pub pace_stats: RunningStats,

    /// Heart rate statistics (bpm)
    pub heart_rate_stats: RunningStats,

    /// Cadence statistics (spm)
    pub cadence_stats: RunningStats,
}

impl SessionStatsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Update aggregate statistics from an accepted frame
    pub fn update(&mut self, frame: &TelemetryFrame, meta: &FrameMeta) {
        self.total_frames += 1;

        if meta.corrected() {
            self.corrected_frames += 1;
        }
        for kind in &meta.corrections {
            match kind {
                CorrectionKind::ElapsedRegression => self.elapsed_regressions += 1,
                CorrectionKind::DistanceRegression => self.distance_regressions += 1,
                CorrectionKind::DistanceJump => self.distance_jumps += 1,
            }
        }
        if meta.recovered_from_timeout {
            self.timeout_recoveries += 1;
        }

        if let Some(gap) = meta.arrival_gap_secs {
            self.gap_stats.push(gap * 1000.0);
        }
        if frame.pace_sec_per_km > 0.0 {
            self.pace_stats.push(frame.pace_sec_per_km);
        }
        if frame.heart_rate_bpm > 0.0 {
            self.heart_rate_stats.push(frame.heart_rate_bpm);
        }
        if frame.cadence_spm > 0.0 {
            self.cadence_stats.push(frame.cadence_spm);
        }
    }

    /// Produce a summary report
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            total_frames: self.total_frames,
            corrected_frames: self.corrected_frames,
            elapsed_regressions: self.elapsed_regressions,
            distance_regressions: self.distance_regressions,
            distance_jumps: self.distance_jumps,
            timeout_recoveries: self.timeout_recoveries,
            correction_rate: if self.total_frames > 0 {
                self.corrected_frames as f64 / self.total_frames as f64 * 100.0
            } else {
                0.0
            },
            gap_ms: StatsSummary::from(&self.gap_stats),
            pace_sec_per_km: StatsSummary::from(&self.pace_stats),
            heart_rate_bpm: StatsSummary::from(&self.heart_rate_stats),
            cadence_spm: StatsSummary::from(&self.cadence_stats),
        }
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Session summary
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub total_frames: u64,
    pub corrected_frames: u64,
    pub elapsed_regressions: u64,
    pub distance_regressions: u64,
    pub distance_jumps: u64,
    pub timeout_recoveries: u64,
    pub correction_rate: f64,
    pub gap_ms: StatsSummary,
    pub pace_sec_per_km: StatsSummary,
    pub heart_rate_bpm: StatsSummary,
    pub cadence_spm: StatsSummary,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Session Summary ===")?;
        writeln!(f, "Total frames: {}", self.total_frames)?;
        writeln!(
            f,
            "Corrected frames: {} ({:.2}%)",
            self.corrected_frames, self.correction_rate
        )?;
        writeln!(
            f,
            "Corrections: elapsed={} distance={} jump={}",
            self.elapsed_regressions, self.distance_regressions, self.distance_jumps
        )?;
        writeln!(f, "Timeout recoveries: {}", self.timeout_recoveries)?;
        writeln!(f, "Arrival gap (ms): {}", self.gap_ms)?;
        writeln!(f, "Pace (sec/km): {}", self.pace_sec_per_km)?;
        writeln!(f, "Heart rate (bpm): {}", self.heart_rate_bpm)?;
        writeln!(f, "Cadence (spm): {}", self.cadence_spm)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}
