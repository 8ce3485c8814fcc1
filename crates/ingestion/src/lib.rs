//! # Ingestion
//!
//! Inbound message ingestion module.
//!
//! Responsibilities:
//! - Decode raw transport bytes into `MessageEnvelope`s
//! - Route envelopes by type tag into typed `InboundMessage`s
//! - Structural validation of realtime frames (reject, never correct)
//! - Emit downstream via async-channel
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::InboundRouter;
//!
//! let mut router = InboundRouter::new(transport_inbox, 64);
//! let messages = router.take_receiver().unwrap();
//! router.spawn();
//!
//! while let Ok(message) = messages.recv().await {
//!     // Hand to the session runtime
//! }
//! ```

mod decode;
mod error;
mod metrics;
mod router;

// Re-exports
pub use contracts::InboundMessage;
pub use decode::{decode_envelope, route_envelope, validate_frame};
pub use error::{IngestionError, Result};
pub use metrics::{MetricsSnapshot, RouterMetrics};
pub use router::InboundRouter;
