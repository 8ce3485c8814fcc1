//! # Consistency
//!
//! Companion-side session core: the temporal consistency engine, the
//! local session clock, and the single-writer session runtime that ties
//! them to the analysis windows and the snapshot watch channel.

pub mod clock;
pub mod engine;
pub mod runtime;
pub mod snapshot;

pub use clock::SessionClock;
pub use engine::{Accepted, ConsistencyEngine};
pub use runtime::SessionRuntime;
pub use snapshot::{AnalysisReport, SessionSnapshot};
