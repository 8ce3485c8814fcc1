//! Envelope decoding, routing and frame validation.

use contracts::{
    message_type, ContractError, InboundMessage, MessageEnvelope, TelemetryFrame, WorkoutSummary,
    MAX_HEART_RATE_BPM,
};

use crate::error::{IngestionError, Result};

/// Decode raw transport bytes into an envelope
pub fn decode_envelope(bytes: &[u8]) -> Result<MessageEnvelope> {
    MessageEnvelope::decode(bytes).map_err(|e| IngestionError::DecodeFailed {
        message: e.to_string(),
    })
}

/// Route an envelope to its typed inbound message.
///
/// Realtime frames are validated structurally before they leave this
/// function; profile payloads pass through untouched.
pub fn route_envelope(envelope: MessageEnvelope) -> Result<InboundMessage> {
    match envelope.message_type.as_str() {
        message_type::REALTIME_DATA | message_type::REALTIME_DATA_FALLBACK => {
            let mut frame: TelemetryFrame =
                serde_json::from_value(serde_json::Value::Object(envelope.payload)).map_err(
                    |e| IngestionError::PayloadInvalid {
                        message_type: envelope.message_type,
                        message: e.to_string(),
                    },
                )?;
            frame.source_timestamp = envelope.timestamp;
            validate_frame(&frame)?;
            Ok(InboundMessage::Realtime(frame))
        }
        message_type::WORKOUT_COMPLETE => {
            let summary: WorkoutSummary =
                serde_json::from_value(serde_json::Value::Object(envelope.payload)).map_err(
                    |e| IngestionError::PayloadInvalid {
                        message_type: envelope.message_type,
                        message: e.to_string(),
                    },
                )?;
            if !summary.total_calories.is_finite() || summary.total_calories < 0.0 {
                return Err(ContractError::frame_validation(
                    "total_calories",
                    format!("must be finite and >= 0, got {}", summary.total_calories),
                )
                .into());
            }
            Ok(InboundMessage::WorkoutComplete(summary))
        }
        message_type::WORKOUT_END_SIGNAL => Ok(InboundMessage::WorkoutEnd),
        message_type::USER_PROFILE_SYNC => Ok(InboundMessage::ProfileSync(envelope.payload)),
        other => Err(IngestionError::UnknownMessageType {
            message_type: other.to_string(),
        }),
    }
}

/// Structural validation of a raw telemetry frame.
///
/// Rejection here never mutates session state; temporal consistency is
/// the consistency engine's job.
pub fn validate_frame(frame: &TelemetryFrame) -> std::result::Result<(), ContractError> {
    check_non_negative("elapsed_time", frame.elapsed_time)?;
    check_non_negative("distance", frame.distance_meters)?;
    check_non_negative("current_pace", frame.pace_sec_per_km)?;
    check_non_negative("heart_rate", frame.heart_rate_bpm)?;
    check_non_negative("cadence", frame.cadence_spm)?;
    check_non_negative("current_calories", frame.calories_kcal)?;

    if frame.heart_rate_bpm > MAX_HEART_RATE_BPM {
        return Err(ContractError::frame_validation(
            "heart_rate",
            format!(
                "must be <= {MAX_HEART_RATE_BPM}, got {}",
                frame.heart_rate_bpm
            ),
        ));
    }

    for (name, values) in [
        ("recent_paces", &frame.recent_paces),
        ("recent_cadences", &frame.recent_cadences),
        ("recent_heart_rates", &frame.recent_heart_rates),
    ] {
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ContractError::frame_validation(
                name,
                "history values must be finite and >= 0",
            ));
        }
    }

    Ok(())
}

fn check_non_negative(field: &'static str, value: f64) -> std::result::Result<(), ContractError> {
    if !value.is_finite() {
        return Err(ContractError::frame_validation(
            field,
            format!("must be finite, got {value}"),
        ));
    }
    if value < 0.0 {
        return Err(ContractError::frame_validation(
            field,
            format!("must be >= 0, got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn realtime_envelope(json: serde_json::Value) -> MessageEnvelope {
        let serde_json::Value::Object(payload) = json else {
            panic!("payload must be an object");
        };
        MessageEnvelope {
            message_type: message_type::REALTIME_DATA.to_string(),
            message_id: "realtime_data".into(),
            timestamp: 1_700_000_000.0,
            payload,
        }
    }

    #[test]
    fn test_route_realtime_frame() {
        let envelope = realtime_envelope(serde_json::json!({
            "elapsed_time": 12.0,
            "distance": 34.5,
            "current_pace": 320.0,
            "heart_rate": 148.0,
            "cadence": 172.0,
            "current_calories": 10.5
        }));

        let routed = route_envelope(envelope).unwrap();
        let InboundMessage::Realtime(frame) = routed else {
            panic!("expected realtime frame");
        };
        assert_eq!(frame.elapsed_time, 12.0);
        // Envelope timestamp carried onto the frame
        assert_eq!(frame.source_timestamp, 1_700_000_000.0);
    }

    #[test]
    fn test_route_rejects_missing_fields() {
        let envelope = realtime_envelope(serde_json::json!({
            "elapsed_time": 12.0
        }));
        let result = route_envelope(envelope);
        assert!(matches!(
            result,
            Err(IngestionError::PayloadInvalid { .. })
        ));
    }

    #[test]
    fn test_route_rejects_unknown_type() {
        let envelope = MessageEnvelope {
            message_type: "firmware_update".to_string(),
            message_id: "firmware_update".into(),
            timestamp: 0.0,
            payload: serde_json::Map::new(),
        };
        let result = route_envelope(envelope);
        assert!(matches!(
            result,
            Err(IngestionError::UnknownMessageType { .. })
        ));
    }

    #[test]
    fn test_route_workout_complete() {
        let mut payload = serde_json::Map::new();
        payload.insert("workoutData".into(), serde_json::json!({"splits": [300]}));
        payload.insert("total_calories".into(), 512.0.into());
        let envelope = MessageEnvelope {
            message_type: message_type::WORKOUT_COMPLETE.to_string(),
            message_id: "workout_complete-0".into(),
            timestamp: 0.0,
            payload,
        };

        let routed = route_envelope(envelope).unwrap();
        assert!(matches!(routed, InboundMessage::WorkoutComplete(_)));
    }

    #[test]
    fn test_route_profile_sync_passthrough() {
        let mut payload = serde_json::Map::new();
        payload.insert("weight_kg".into(), 70.5.into());
        payload.insert("nickname".into(), "runner".into());
        let envelope = MessageEnvelope {
            message_type: message_type::USER_PROFILE_SYNC.to_string(),
            message_id: "user_profile_sync".into(),
            timestamp: 0.0,
            payload,
        };

        let routed = route_envelope(envelope).unwrap();
        let InboundMessage::ProfileSync(fields) = routed else {
            panic!("expected profile sync");
        };
        assert_eq!(fields["weight_kg"], 70.5);
        assert_eq!(fields["nickname"], "runner");
    }

    #[test]
    fn test_validate_rejects_negative_distance() {
        let frame = TelemetryFrame {
            elapsed_time: 1.0,
            distance_meters: -5.0,
            ..Default::default()
        };
        let err = validate_frame(&frame).unwrap_err();
        assert!(err.to_string().contains("distance"));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let frame = TelemetryFrame {
            elapsed_time: f64::NAN,
            ..Default::default()
        };
        assert!(validate_frame(&frame).is_err());
    }

    #[test]
    fn test_validate_rejects_implausible_heart_rate() {
        let frame = TelemetryFrame {
            heart_rate_bpm: 300.0,
            ..Default::default()
        };
        let err = validate_frame(&frame).unwrap_err();
        assert!(err.to_string().contains("heart_rate"));
    }

    #[test]
    fn test_validate_accepts_zero_heart_rate() {
        // No signal reads as zero, which is valid
        let frame = TelemetryFrame::default();
        assert!(validate_frame(&frame).is_ok());
    }
}
