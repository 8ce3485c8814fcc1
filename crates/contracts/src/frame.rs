//! TelemetryFrame - Ingestion output
//!
//! One instant of sensor-peer state, plus the metadata the consistency
//! engine attaches to each accepted frame.

use serde::{Deserialize, Serialize};

/// Upper bound for a plausible heart-rate reading (bpm)
pub const MAX_HEART_RATE_BPM: f64 = 250.0;

/// One discrete telemetry sample from the sensor peer.
///
/// Wire field names follow the envelope protocol; `source_timestamp` is
/// carried by the envelope itself and filled in during decode. Once a frame
/// is accepted it is owned by the consistency engine and mutated only
/// through the correction step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Producer wall clock (seconds since epoch), taken from the envelope
    #[serde(default)]
    pub source_timestamp: f64,

    /// Seconds since session start, monotonic non-decreasing by contract
    pub elapsed_time: f64,

    /// Cumulative distance, monotonic non-decreasing by contract
    #[serde(rename = "distance")]
    pub distance_meters: f64,

    /// Current pace (seconds per kilometer)
    #[serde(rename = "current_pace")]
    pub pace_sec_per_km: f64,

    /// Heart rate in [0, 250]
    #[serde(rename = "heart_rate")]
    pub heart_rate_bpm: f64,

    /// Cadence (steps per minute)
    #[serde(rename = "cadence")]
    pub cadence_spm: f64,

    /// Cumulative calories burned
    #[serde(rename = "current_calories")]
    pub calories_kcal: f64,

    /// Recent pace history, most-recent-last
    #[serde(default)]
    pub recent_paces: Vec<f64>,

    /// Recent cadence history, most-recent-last
    #[serde(default)]
    pub recent_cadences: Vec<f64>,

    /// Recent heart-rate history, most-recent-last
    #[serde(default)]
    pub recent_heart_rates: Vec<f64>,

    /// Whether the producer is showing a warning
    #[serde(rename = "is_warning_active", default)]
    pub warning_active: bool,

    /// Warning text, empty when no warning is active
    #[serde(rename = "warning_message", default)]
    pub warning_text: String,
}

/// Which correction the consistency engine applied to a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionKind {
    /// `elapsed_time` regressed (or repeated) and was bumped forward
    ElapsedRegression,
    /// `distance_meters` regressed and was held flat
    DistanceRegression,
    /// `distance_meters` jumped past the plausibility ceiling and was clamped
    DistanceJump,
}

impl CorrectionKind {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionKind::ElapsedRegression => "elapsed_regression",
            CorrectionKind::DistanceRegression => "distance_regression",
            CorrectionKind::DistanceJump => "distance_jump",
        }
    }
}

/// Per-frame acceptance metadata, produced alongside every accepted frame
#[derive(Debug, Clone, Default)]
pub struct FrameMeta {
    /// Index of the frame within the session (0-based)
    pub frame_index: u64,

    /// Local receive-time gap since the previous accepted frame (seconds)
    pub arrival_gap_secs: Option<f64>,

    /// Corrections applied to the raw frame, in application order
    pub corrections: Vec<CorrectionKind>,

    /// Frame arrived during the timeout grace window and silently
    /// re-established the session
    pub recovered_from_timeout: bool,
}

impl FrameMeta {
    /// Whether any correction was applied
    pub fn corrected(&self) -> bool {
        !self.corrections.is_empty()
    }
}

/// Workout completion summary, forwarded whole to the storage collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSummary {
    /// Opaque serialized summary blob, not interpreted by this core
    #[serde(rename = "workoutData")]
    pub workout_data: serde_json::Value,

    /// Total calories for the workout
    pub total_calories: f64,

    /// Whether this workout was an assessment run
    #[serde(rename = "isAssessment", default)]
    pub is_assessment: bool,
}

/// Routed inbound message - InboundRouter output
#[derive(Debug, Clone)]
pub enum InboundMessage {
    /// Realtime telemetry frame (either realtime type)
    Realtime(TelemetryFrame),

    /// Workout completed; also ends the session immediately
    WorkoutComplete(WorkoutSummary),

    /// Explicit end-of-session signal
    WorkoutEnd,

    /// User profile fields, forwarded untouched to the profile collaborator
    ProfileSync(serde_json::Map<String, serde_json::Value>),
}
