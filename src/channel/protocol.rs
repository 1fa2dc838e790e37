use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::Role;

/// Missing, unknown, expired or already used ticket.
pub const CLOSE_UNAUTHENTICATED: u16 = 4001;
/// Authenticated, but not a participant of this transportation.
pub const CLOSE_FORBIDDEN: u16 = 4003;
pub const CLOSE_NOT_FOUND: u16 = 4004;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    LocationUpdate {
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        note: Option<String>,
    },
    Ping,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ParticipantJoined {
        user_id: Uuid,
        role: Role,
        timestamp: DateTime<Utc>,
    },
    Pong {
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn to_text(&self) -> String {
        // Every variant is a plain struct of strings, uuids and timestamps.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"error"}"#.to_string())
    }
}

/// Parses an inbound frame, keeping the raw object so a location update can
/// be re-broadcast exactly as the sender wrote it.
pub fn parse_client_message(text: &str) -> Result<(ClientMessage, Value), serde_json::Error> {
    let raw: Value = serde_json::from_str(text)?;
    let message = ClientMessage::deserialize(&raw)?;
    Ok((message, raw))
}

/// Adds the server receive time to a client location message.
pub fn stamp_location(mut raw: Value, received_at: DateTime<Utc>) -> Value {
    if let Value::Object(fields) = &mut raw {
        fields.insert(
            "last_update".to_string(),
            Value::String(received_at.to_rfc3339()),
        );
    }
    raw
}

pub fn location_frame(
    latitude: f64,
    longitude: f64,
    note: Option<&str>,
    received_at: DateTime<Utc>,
) -> Value {
    stamp_location(
        serde_json::json!({
            "type": "location_update",
            "latitude": latitude,
            "longitude": longitude,
            "note": note,
        }),
        received_at,
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::{parse_client_message, stamp_location, ClientMessage, ServerMessage};

    #[test]
    fn location_update_keeps_unknown_fields_for_rebroadcast() {
        let (message, raw) = parse_client_message(
            r#"{"type":"location_update","latitude":41.0,"longitude":29.0,"speed_kmh":72}"#,
        )
        .unwrap();

        assert_eq!(
            message,
            ClientMessage::LocationUpdate {
                latitude: 41.0,
                longitude: 29.0,
                note: None
            }
        );

        let stamped = stamp_location(raw, Utc::now());
        assert_eq!(stamped["speed_kmh"], 72);
        assert!(stamped["last_update"].is_string());
    }

    #[test]
    fn ping_parses_without_payload() {
        let (message, _) = parse_client_message(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(message, ClientMessage::Ping);
    }

    #[test]
    fn unknown_type_is_an_error() {
        assert!(parse_client_message(r#"{"type":"teleport"}"#).is_err());
        assert!(parse_client_message("not json").is_err());
    }

    #[test]
    fn server_messages_are_tagged() {
        let text = ServerMessage::Error {
            message: "nope".to_string(),
        }
        .to_text();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({"type": "error", "message": "nope"}));
    }
}
