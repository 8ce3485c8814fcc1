//! LinkProfile - Config Loader output
//!
//! Describes the full link deployment: session tuning, monitor cadence,
//! dispatch capacities, analysis windows, storage paths and the demo
//! simulation plan.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::SessionConfig;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete link configuration profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkProfile {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Consistency engine and session runtime tuning
    #[serde(default)]
    pub session: SessionTuning,

    /// Session monitor tuning
    #[serde(default)]
    pub monitor: MonitorTuning,

    /// Outbound dispatcher and transport capacities
    #[serde(default)]
    pub dispatch: DispatchTuning,

    /// Analysis window tuning
    #[serde(default)]
    pub analysis: AnalysisTuning,

    /// Collaborator storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Demo workout simulation plan
    #[serde(default)]
    pub simulation: SimulationPlan,
}

/// Session tuning: timeouts, correction thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTuning {
    /// Frame timeout in seconds
    #[serde(default = "default_frame_timeout_secs")]
    pub frame_timeout_secs: f64,

    /// Teardown grace window in seconds
    #[serde(default = "default_teardown_grace_secs")]
    pub teardown_grace_secs: f64,

    /// Local clock extrapolation tick in milliseconds
    #[serde(default = "default_clock_tick_ms")]
    pub clock_tick_ms: u64,

    /// Maximum plausible single-frame distance gain (meters)
    #[serde(default = "default_max_distance_jump_m")]
    pub max_distance_jump_m: f64,

    /// Clamp step for implausible distance jumps (meters)
    #[serde(default = "default_distance_epsilon_m")]
    pub distance_epsilon_m: f64,

    /// Bump step for regressed elapsed times (seconds)
    #[serde(default = "default_elapsed_step_secs")]
    pub elapsed_step_secs: f64,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            frame_timeout_secs: default_frame_timeout_secs(),
            teardown_grace_secs: default_teardown_grace_secs(),
            clock_tick_ms: default_clock_tick_ms(),
            max_distance_jump_m: default_max_distance_jump_m(),
            distance_epsilon_m: default_distance_epsilon_m(),
            elapsed_step_secs: default_elapsed_step_secs(),
        }
    }
}

fn default_frame_timeout_secs() -> f64 {
    10.0
}

fn default_teardown_grace_secs() -> f64 {
    5.0
}

fn default_clock_tick_ms() -> u64 {
    100
}

fn default_max_distance_jump_m() -> f64 {
    500.0
}

fn default_distance_epsilon_m() -> f64 {
    10.0
}

fn default_elapsed_step_secs() -> f64 {
    1.0
}

/// Session monitor tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorTuning {
    /// Transport probe interval in seconds
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: f64,
}

impl Default for MonitorTuning {
    fn default() -> Self {
        Self {
            probe_interval_secs: default_probe_interval_secs(),
        }
    }
}

fn default_probe_interval_secs() -> f64 {
    5.0
}

/// Dispatcher and transport capacities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchTuning {
    /// Immediate-tier channel capacity (fails fast when full)
    #[serde(default = "default_immediate_capacity")]
    pub immediate_capacity: usize,

    /// Inter-component channel capacity
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Durable outbox pump interval in milliseconds
    #[serde(default = "default_pump_interval_ms")]
    pub durable_pump_interval_ms: u64,
}

impl Default for DispatchTuning {
    fn default() -> Self {
        Self {
            immediate_capacity: default_immediate_capacity(),
            channel_capacity: default_channel_capacity(),
            durable_pump_interval_ms: default_pump_interval_ms(),
        }
    }
}

fn default_immediate_capacity() -> usize {
    32
}

fn default_channel_capacity() -> usize {
    64
}

fn default_pump_interval_ms() -> u64 {
    200
}

/// Analysis window tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisTuning {
    /// Rolling window capacity (samples)
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,

    /// Run analysis every N accepted frames
    #[serde(default = "default_report_interval_frames")]
    pub report_interval_frames: u64,
}

impl Default for AnalysisTuning {
    fn default() -> Self {
        Self {
            window_capacity: default_window_capacity(),
            report_interval_frames: default_report_interval_frames(),
        }
    }
}

fn default_window_capacity() -> usize {
    30
}

fn default_report_interval_frames() -> u64 {
    10
}

/// Collaborator storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory where completed workouts are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("workouts")
}

/// Demo simulation plan for the workout producer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationPlan {
    /// Simulated workout duration in seconds
    #[serde(default = "default_duration_secs")]
    pub duration_secs: f64,

    /// Telemetry tick rate in Hz
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,

    /// Emit a normal-priority fallback copy every N ticks
    #[serde(default = "default_fallback_every_ticks")]
    pub fallback_every_ticks: u64,

    /// When to emit the one-off profile sync (seconds, None = never)
    #[serde(default = "default_profile_sync_at_secs")]
    pub profile_sync_at_secs: Option<f64>,

    /// Athlete baseline the simulator oscillates around
    #[serde(default)]
    pub athlete: AthleteBaseline,

    /// Scheduled transport dropout windows
    #[serde(default)]
    pub dropouts: Vec<DropoutWindow>,
}

impl Default for SimulationPlan {
    fn default() -> Self {
        Self {
            duration_secs: default_duration_secs(),
            tick_hz: default_tick_hz(),
            fallback_every_ticks: default_fallback_every_ticks(),
            profile_sync_at_secs: default_profile_sync_at_secs(),
            athlete: AthleteBaseline::default(),
            dropouts: Vec::new(),
        }
    }
}

fn default_duration_secs() -> f64 {
    60.0
}

fn default_tick_hz() -> f64 {
    1.0
}

fn default_fallback_every_ticks() -> u64 {
    10
}

fn default_profile_sync_at_secs() -> Option<f64> {
    Some(5.0)
}

/// Baseline values for the simulated athlete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthleteBaseline {
    /// Baseline pace (seconds per kilometer)
    #[serde(default = "default_pace")]
    pub pace_sec_per_km: f64,

    /// Baseline heart rate (bpm)
    #[serde(default = "default_heart_rate")]
    pub heart_rate_bpm: f64,

    /// Baseline cadence (steps per minute)
    #[serde(default = "default_cadence")]
    pub cadence_spm: f64,
}

impl Default for AthleteBaseline {
    fn default() -> Self {
        Self {
            pace_sec_per_km: default_pace(),
            heart_rate_bpm: default_heart_rate(),
            cadence_spm: default_cadence(),
        }
    }
}

fn default_pace() -> f64 {
    330.0
}

fn default_heart_rate() -> f64 {
    150.0
}

fn default_cadence() -> f64 {
    172.0
}

/// One scheduled transport degradation window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropoutWindow {
    /// Window start, seconds into the simulation
    pub start_secs: f64,

    /// Window end, seconds into the simulation
    pub end_secs: f64,

    /// Degradation kind during the window
    #[serde(default)]
    pub kind: DropoutKind,
}

/// Transport degradation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropoutKind {
    /// Session active, peer unreachable (durable tier only)
    #[default]
    Weak,
    /// Session layer inactive
    Disconnected,
}

impl LinkProfile {
    /// Build a SessionConfig from the profile's session and analysis tuning
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            frame_timeout: Duration::from_secs_f64(self.session.frame_timeout_secs),
            teardown_grace: Duration::from_secs_f64(self.session.teardown_grace_secs),
            clock_tick: Duration::from_millis(self.session.clock_tick_ms),
            max_distance_jump_m: self.session.max_distance_jump_m,
            distance_epsilon_m: self.session.distance_epsilon_m,
            elapsed_step_secs: self.session.elapsed_step_secs,
            window_capacity: self.analysis.window_capacity,
            report_interval_frames: self.analysis.report_interval_frames,
        }
    }

    /// Monitor probe interval as a Duration
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs_f64(self.monitor.probe_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_protocol() {
        let profile = LinkProfile::default();
        assert_eq!(profile.session.frame_timeout_secs, 10.0);
        assert_eq!(profile.session.teardown_grace_secs, 5.0);
        assert_eq!(profile.session.clock_tick_ms, 100);
        assert_eq!(profile.session.max_distance_jump_m, 500.0);
        assert_eq!(profile.session.distance_epsilon_m, 10.0);
        assert_eq!(profile.monitor.probe_interval_secs, 5.0);
        assert_eq!(profile.analysis.window_capacity, 30);
    }

    #[test]
    fn test_to_session_config() {
        let mut profile = LinkProfile::default();
        profile.session.frame_timeout_secs = 0.25;
        profile.session.clock_tick_ms = 20;
        profile.analysis.window_capacity = 12;

        let config = profile.to_session_config();
        assert_eq!(config.frame_timeout, Duration::from_millis(250));
        assert_eq!(config.clock_tick, Duration::from_millis(20));
        assert_eq!(config.window_capacity, 12);
        assert_eq!(config.max_distance_jump_m, 500.0);
    }

    #[test]
    fn test_empty_document_is_valid_profile() {
        let profile: LinkProfile = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(profile.version, ConfigVersion::V1);
        assert!(profile.simulation.dropouts.is_empty());
    }
}
