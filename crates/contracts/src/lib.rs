//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - `source_timestamp` is the producer's wall clock (seconds since epoch, f64)
//! - `elapsed_time` is seconds since session start, monotonic non-decreasing by contract
//! - The receiver derives its own display clock; producer clocks are never trusted directly

mod collaborators;
mod error;
mod frame;
mod message;
mod message_id;
mod profile;
mod session_config;
mod status;
mod transport;

pub use collaborators::*;
pub use error::*;
pub use frame::*;
pub use message::*;
pub use message_id::MessageId;
pub use profile::*;
pub use session_config::*;
pub use status::*;
pub use transport::*;
