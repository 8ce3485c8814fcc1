//! Published session state.

use analysis::{CadenceBand, EfficiencyTrend, RiskReport, StabilityReport};
use contracts::{SyncStatus, TelemetryFrame};

/// One windowed analysis pass over the current session
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Pace stability classification
    pub stability: StabilityReport,
    /// Efficiency trend, None below the sample floor
    pub efficiency: Option<EfficiencyTrend>,
    /// Recommended cadence band
    pub cadence: CadenceBand,
    /// Overtraining risk from completed-workout history
    pub risk: RiskReport,
}

/// Immutable view of the companion-side session, published via watch.
///
/// Readers never touch the engine's mutable state; the runtime is the
/// single writer.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Session status
    pub status: SyncStatus,

    /// Extrapolated elapsed time to display (0 when no session)
    pub display_elapsed: f64,

    /// Last accepted (corrected) frame
    pub frame: Option<TelemetryFrame>,

    /// Frames accepted this session
    pub frame_count: u64,

    /// Latest analysis report, refreshed every report interval
    pub analysis: Option<AnalysisReport>,
}
