//! Message envelope shared by both ends of the channel.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

/// Envelope payload: an open JSON object.
///
/// Components only read the keys their contract names (`model`, `status`, ...)
/// and pass everything else through untouched.
pub type Payload = serde_json::Map<String, Value>;

/// Current UTC time as an ISO-8601 string with microsecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Message kinds understood by the server and the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Client asks for the server configuration snapshot.
    ConfigRequest,
    /// Configuration push (server to client).
    Config,
    /// Inference request, either direction.
    Inference,
    /// Acknowledgement of an inference request.
    InferenceResponse,
    /// Informational status update.
    Status,
    /// Anything else. Accepted on the wire and ignored.
    Unknown(String),
}

impl MessageType {
    /// Wire representation of this type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ConfigRequest => "config_request",
            Self::Config => "config",
            Self::Inference => "inference",
            Self::InferenceResponse => "inference_response",
            Self::Status => "status",
            Self::Unknown(other) => other.as_str(),
        }
    }
}

impl From<&str> for MessageType {
    fn from(s: &str) -> Self {
        match s {
            "config_request" => Self::ConfigRequest,
            "config" => Self::Config,
            "inference" => Self::Inference,
            "inference_response" => Self::InferenceResponse,
            "status" => Self::Status,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{type, payload, timestamp}` wire message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type as sent on the wire.
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Message body.
    #[serde(default)]
    pub payload: Payload,

    /// ISO-8601 creation time.
    #[serde(default)]
    pub timestamp: String,
}

impl Envelope {
    /// Wrap a payload, stamping the current time.
    pub fn new(message_type: MessageType, payload: Payload) -> Self {
        Self {
            kind: message_type.as_str().to_string(),
            payload,
            timestamp: now_timestamp(),
        }
    }

    /// Typed view of the `type` field.
    pub fn message_type(&self) -> MessageType {
        MessageType::from(self.kind.as_str())
    }

    /// Serialize to the JSON text sent on the wire.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Parse JSON text received from a peer.
    ///
    /// Missing `payload` and `timestamp` fields default to empty values; a
    /// non-object document or a non-object payload is rejected.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

        if !value.is_object() {
            return Err(ProtocolError::Malformed(
                "envelope must be a JSON object".to_string(),
            ));
        }

        serde_json::from_value(value).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_encode_decode_preserves_type_and_payload() {
        let original = Envelope::new(
            MessageType::Inference,
            payload(json!({"model": "seg", "data": {"frames": [1, 2, 3]}})),
        );

        let text = original.encode().unwrap();
        let decoded = Envelope::decode(&text).unwrap();

        assert_eq!(decoded.message_type(), MessageType::Inference);
        assert_eq!(decoded.payload, original.payload);
        assert_eq!(decoded.timestamp, original.timestamp);
    }

    #[test]
    fn test_wire_field_names() {
        let envelope = Envelope::new(MessageType::ConfigRequest, Payload::new());
        let value: Value = serde_json::from_str(&envelope.encode().unwrap()).unwrap();

        assert_eq!(value["type"], "config_request");
        assert!(value["payload"].as_object().unwrap().is_empty());
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_decode_defaults_missing_fields() {
        let decoded = Envelope::decode(r#"{"type":"config_request"}"#).unwrap();
        assert_eq!(decoded.message_type(), MessageType::ConfigRequest);
        assert!(decoded.payload.is_empty());
        assert!(decoded.timestamp.is_empty());
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        let err = Envelope::decode("{not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(Envelope::decode("[1, 2]").is_err());
        assert!(Envelope::decode(r#""config""#).is_err());
        assert!(Envelope::decode(r#"{"type":"config","payload":[1]}"#).is_err());
    }

    #[test]
    fn test_unknown_type_round_trips() {
        let decoded = Envelope::decode(r#"{"type":"telemetry","payload":{}}"#).unwrap();
        assert_eq!(
            decoded.message_type(),
            MessageType::Unknown("telemetry".to_string())
        );
        assert_eq!(decoded.message_type().to_string(), "telemetry");
    }

    #[test]
    fn test_message_type_strings() {
        for kind in [
            MessageType::ConfigRequest,
            MessageType::Config,
            MessageType::Inference,
            MessageType::InferenceResponse,
            MessageType::Status,
        ] {
            assert_eq!(MessageType::from(kind.as_str()), kind);
        }
    }
}
