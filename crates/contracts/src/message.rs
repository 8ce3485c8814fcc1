//! OutboundMessage and MessageEnvelope - Dispatcher input/output
//!
//! The outbound message is the dispatcher-side view (with priority); the
//! envelope is the symmetric on-wire shape carried by both delivery tiers.

use serde::{Deserialize, Serialize};

use crate::{ContractError, MessageId};

/// Well-known message type tags (symmetric protocol, both peers use them)
pub mod message_type {
    pub const REALTIME_DATA: &str = "realtime_data";
    pub const REALTIME_DATA_FALLBACK: &str = "realtime_data_fallback";
    pub const WORKOUT_COMPLETE: &str = "workout_complete";
    pub const WORKOUT_END_SIGNAL: &str = "workout_end_signal";
    pub const USER_PROFILE_SYNC: &str = "user_profile_sync";
}

/// Delivery priority for outbound messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Real-time telemetry: immediate send only, dropped on failure
    High,
    /// Discrete events: immediate send with durable fallback
    Normal,
    /// Profile/configuration sync: durable transfer only
    Low,
}

impl Priority {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

/// One outbound message, owned by the dispatcher until delivered or superseded
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Message type tag (see [`message_type`])
    pub message_type: String,

    /// Opaque key/value payload
    pub payload: serde_json::Map<String, serde_json::Value>,

    /// Delivery priority
    pub priority: Priority,

    /// Queue de-duplication key; repeated enqueue of a logically-identical
    /// message overwrites rather than duplicates
    pub message_id: MessageId,

    /// Stamp time (seconds since epoch)
    pub timestamp: f64,
}

impl OutboundMessage {
    /// Build the on-wire envelope for this message
    pub fn envelope(&self) -> MessageEnvelope {
        MessageEnvelope {
            message_type: self.message_type.clone(),
            message_id: self.message_id.clone(),
            timestamp: self.timestamp,
            payload: self.payload.clone(),
        }
    }
}

/// The on-wire message shape, shared by the immediate and durable tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Message type tag
    #[serde(rename = "type")]
    pub message_type: String,

    /// Originating message id (diagnostics; receivers treat frames by intent)
    pub message_id: MessageId,

    /// Producer wall clock at stamp time (seconds since epoch)
    pub timestamp: f64,

    /// Flattened payload fields
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl MessageEnvelope {
    /// Encode for the durable tier
    pub fn encode(&self) -> Result<Vec<u8>, ContractError> {
        serde_json::to_vec(self).map_err(|e| ContractError::Encode {
            message: e.to_string(),
        })
    }

    /// Decode from the durable tier
    pub fn decode(bytes: &[u8]) -> Result<Self, ContractError> {
        serde_json::from_slice(bytes).map_err(|e| ContractError::Decode {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_flattens_payload() {
        let mut payload = serde_json::Map::new();
        payload.insert("elapsed_time".into(), 10.0.into());

        let envelope = MessageEnvelope {
            message_type: message_type::REALTIME_DATA.to_string(),
            message_id: "realtime_data".into(),
            timestamp: 1_700_000_000.0,
            payload,
        };

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "realtime_data");
        // Payload fields sit at the top level, not nested
        assert_eq!(json["elapsed_time"], 10.0);
    }

    #[test]
    fn test_envelope_encode_decode() {
        let mut payload = serde_json::Map::new();
        payload.insert("total_calories".into(), 300.0.into());

        let envelope = MessageEnvelope {
            message_type: message_type::WORKOUT_COMPLETE.to_string(),
            message_id: "workout_complete-7".into(),
            timestamp: 1_700_000_123.5,
            payload,
        };

        let bytes = envelope.encode().unwrap();
        let decoded = MessageEnvelope::decode(&bytes).unwrap();
        assert_eq!(decoded.message_type, envelope.message_type);
        assert_eq!(decoded.message_id, envelope.message_id);
        assert_eq!(decoded.payload["total_calories"], 300.0);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(MessageEnvelope::decode(b"not json").is_err());
    }
}
