//! # Analysis
//!
//! Windowed statistical analysis over telemetry samples.
//!
//! All analysis functions are pure and deterministic: they take
//! caller-supplied sample slices and return a report, with no shared
//! state. The session runtime owns the rolling [`SampleWindow`] rings
//! and decides when to invoke them.

mod cadence;
mod efficiency;
mod risk;
mod stability;
mod window;

pub use cadence::{cadence_optimization, CadenceBand};
pub use efficiency::{efficiency_trend, instantaneous_efficiency, EfficiencyAdvice, EfficiencyTrend};
pub use risk::{overtraining_risk, RiskLevel, RiskReport};
pub use stability::{pace_stability, StabilityClass, StabilityReport};
pub use window::SampleWindow;
