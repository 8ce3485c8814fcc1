//! Layered error definitions
//!
//! Categorized by source: config / frame / transport / collaborator

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Frame Errors =====
    /// Telemetry frame failed structural validation
    #[error("frame validation error at '{field}': {message}")]
    FrameValidation { field: String, message: String },

    // ===== Transport Errors =====
    /// Immediate send attempted while the peer is not reachable
    #[error("peer not reachable: {message}")]
    LinkUnreachable { message: String },

    /// Transport endpoint has shut down
    #[error("link closed")]
    LinkClosed,

    /// Envelope encode error
    #[error("envelope encode error: {message}")]
    Encode { message: String },

    /// Envelope decode error
    #[error("envelope decode error: {message}")]
    Decode { message: String },

    // ===== Collaborator Errors =====
    /// Collaborator store write error
    #[error("store '{store_name}' write error: {message}")]
    StoreWrite { store_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create frame validation error
    pub fn frame_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FrameValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create link unreachable error
    pub fn link_unreachable(message: impl Into<String>) -> Self {
        Self::LinkUnreachable {
            message: message.into(),
        }
    }

    /// Create store write error
    pub fn store_write(store_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreWrite {
            store_name: store_name.into(),
            message: message.into(),
        }
    }
}
