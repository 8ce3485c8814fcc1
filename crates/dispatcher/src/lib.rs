//! # Dispatcher
//!
//! Outbound delivery module.
//!
//! Responsibilities:
//! - Priority-aware dispatch over a two-tier [`contracts::PeerTransport`]
//! - Retry queue for normal-priority messages while disconnected
//! - Session monitoring: probe the link, derive `ConnectionState`, drive
//!   retry drains
//! - In-process `MemoryLink` transport pair for demos and tests

pub mod dispatcher;
pub mod link;
pub mod metrics;
pub mod monitor;

pub use contracts::{ConnectionState, PeerTransport, Priority};
pub use dispatcher::{DispatchFailure, DispatchOutcome, OutboundDispatcher};
pub use link::MemoryLink;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use monitor::SessionMonitor;
