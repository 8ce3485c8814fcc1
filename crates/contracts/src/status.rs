//! Connection and session status enums
//!
//! `ConnectionState` is derived exclusively from transport probes by the
//! session monitor; `SyncStatus` is the companion-side session state and
//! every transition is logged and published, never silent.

use serde::{Deserialize, Serialize};

/// One observation of transport reachability and session activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkProbe {
    /// Whether the peers are currently mutually reachable (immediate tier viable)
    pub reachable: bool,

    /// Whether the session layer is active on the peer
    pub session_active: bool,
}

/// Observed connection quality, driven solely by the session monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Session layer inactive
    Disconnected,
    /// Session active but peer unreachable; only durable transfer is viable
    Weak,
    /// Session active and peer reachable; immediate send is viable
    Strong,
}

impl ConnectionState {
    /// Derive the connection state from a transport probe
    pub fn from_probe(probe: LinkProbe) -> Self {
        match (probe.session_active, probe.reachable) {
            (false, _) => ConnectionState::Disconnected,
            (true, true) => ConnectionState::Strong,
            (true, false) => ConnectionState::Weak,
        }
    }

    /// Whether the immediate tier is worth attempting
    pub fn can_send_immediate(self) -> bool {
        self == ConnectionState::Strong
    }

    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Weak => "weak",
            ConnectionState::Strong => "strong",
        }
    }
}

/// Companion-side session status, published with every snapshot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// No active session
    #[default]
    Disconnected,
    /// Frames are arriving and being displayed
    Synchronized,
    /// Frame timeout fired; teardown pending unless a frame arrives
    Timeout,
    /// Unrecoverable session error (reason attached)
    Error(String),
}

impl SyncStatus {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Disconnected => "disconnected",
            SyncStatus::Synchronized => "synchronized",
            SyncStatus::Timeout => "timeout",
            SyncStatus::Error(_) => "error",
        }
    }
}
