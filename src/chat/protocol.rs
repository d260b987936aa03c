//! Chat Wire Protocol
//!
//! JSON frames exchanged with the chat endpoint. Every frame is tagged by
//! `type` and carries its payload under `data`:
//!
//! ```json
//! {"type": "join",    "data": {"cityId": "12", "userId": "a@b.c", "userName": "Ama"}}
//! {"type": "message", "data": {"cityId": "12", "userId": "a@b.c", "userName": "Ama", "message": "hi"}}
//! ```
//!
//! The server echoes accepted messages to every room member, sender included,
//! as `{"type": "message", "data": {"messageId": ..., "timestamp": ..., ...}}`.

use serde::{Deserialize, Serialize};

use super::message::WireMessage;

/// Frames sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Presence announcement, first frame after the transport opens
    Join(JoinPayload),
    /// A chat line for the room
    Message(MessagePayload),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub city_id: String,
    pub user_id: String,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub city_id: String,
    pub user_id: String,
    pub user_name: String,
    pub message: String,
}

impl OutboundFrame {
    /// Serialize for the transport
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Frames received from the server
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// A room message (live or echoed)
    Message(WireMessage),
    /// Any other frame type, or a message frame without payload
    Ignored { kind: String },
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

impl InboundFrame {
    /// Parse a text frame
    ///
    /// Fails only when the text is not a JSON object with a `type`, or when a
    /// `message` payload does not have the message shape.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawFrame = serde_json::from_str(text)?;
        match (raw.kind.as_str(), raw.data) {
            ("message", Some(data)) if !data.is_null() => {
                Ok(InboundFrame::Message(serde_json::from_value(data)?))
            }
            _ => Ok(InboundFrame::Ignored { kind: raw.kind }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_frame_shape() {
        let frame = OutboundFrame::Join(JoinPayload {
            city_id: "12".to_string(),
            user_id: "ama@example.com".to_string(),
            user_name: "Ama".to_string(),
        });
        let value: serde_json::Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "join");
        assert_eq!(value["data"]["cityId"], "12");
        assert_eq!(value["data"]["userId"], "ama@example.com");
        assert_eq!(value["data"]["userName"], "Ama");
    }

    #[test]
    fn test_message_frame_shape() {
        let frame = OutboundFrame::Message(MessagePayload {
            city_id: "12".to_string(),
            user_id: "u".to_string(),
            user_name: "U".to_string(),
            message: "hello".to_string(),
        });
        let json = frame.to_json().unwrap();
        assert!(json.contains("\"type\":\"message\""));
        assert!(json.contains("\"message\":\"hello\""));
    }

    #[test]
    fn test_parse_message_frame() {
        let text = r#"{"type":"message","data":{"messageId":"m-1","userId":"u","userName":"U","message":"hi","timestamp":1700000000000}}"#;
        match InboundFrame::parse(text).unwrap() {
            InboundFrame::Message(msg) => {
                assert_eq!(msg.message_id, "m-1");
                assert_eq!(msg.message, "hi");
            }
            other => panic!("Expected Message, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_ignores_other_types() {
        let frame = InboundFrame::parse(r#"{"type":"join","data":{"userId":"u"}}"#).unwrap();
        assert_eq!(
            frame,
            InboundFrame::Ignored {
                kind: "join".to_string()
            }
        );

        let frame = InboundFrame::parse(r#"{"type":"message"}"#).unwrap();
        assert!(matches!(frame, InboundFrame::Ignored { .. }));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(InboundFrame::parse("not json").is_err());
        assert!(InboundFrame::parse(r#"{"data":{}}"#).is_err());
        assert!(InboundFrame::parse(r#"{"type":"message","data":{"message":"no id"}}"#).is_err());
    }
}
