//! Session runtime configuration contracts that can be shared across crates.

use std::time::Duration;

/// Inbound consistency engine and session runtime tuning
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Frame timeout: no accepted frame within this window fires `Timeout`
    pub frame_timeout: Duration,

    /// Grace window after `Timeout` before the session is torn down
    pub teardown_grace: Duration,

    /// Local clock tick for elapsed-time extrapolation
    pub clock_tick: Duration,

    /// Maximum plausible distance gain in one frame (meters)
    pub max_distance_jump_m: f64,

    /// Step applied when clamping an implausible distance jump (meters)
    pub distance_epsilon_m: f64,

    /// Step applied when bumping a regressed elapsed time (seconds)
    pub elapsed_step_secs: f64,

    /// Capacity of the rolling analysis sample windows
    pub window_capacity: usize,

    /// Run the analysis engine every N accepted frames
    pub report_interval_frames: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_timeout: Duration::from_secs(10),
            teardown_grace: Duration::from_secs(5),
            clock_tick: Duration::from_millis(100),
            max_distance_jump_m: 500.0,
            distance_epsilon_m: 10.0,
            elapsed_step_secs: 1.0,
            window_capacity: 30,
            report_interval_frames: 10,
        }
    }
}
