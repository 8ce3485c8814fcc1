//! Ingestion error types

use thiserror::Error;

/// Ingestion errors
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Envelope bytes could not be decoded
    #[error("failed to decode envelope: {message}")]
    DecodeFailed {
        /// Error message
        message: String,
    },

    /// Envelope type tag not in the dispatch table
    #[error("unknown message type '{message_type}'")]
    UnknownMessageType {
        /// The offending type tag
        message_type: String,
    },

    /// Payload did not deserialize into the expected shape
    #[error("invalid payload for '{message_type}': {message}")]
    PayloadInvalid {
        /// Message type tag
        message_type: String,
        /// Error message
        message: String,
    },

    /// Frame failed structural validation
    #[error(transparent)]
    Validation(#[from] contracts::ContractError),
}

impl IngestionError {
    /// Stable rejection-reason label for metrics
    pub fn reason_label(&self) -> &'static str {
        match self {
            IngestionError::DecodeFailed { .. } => "decode",
            IngestionError::UnknownMessageType { .. } => "unknown_type",
            IngestionError::PayloadInvalid { .. } => "payload",
            IngestionError::Validation(_) => "validation",
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
