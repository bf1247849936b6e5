//! Hub messages of the JSON hub protocol.
//!
//! A connection starts with a handshake: the client sends
//! `{"protocol":"json","version":1}` and the server answers `{}` (or an
//! object with an `error`). Afterwards each record is a JSON object with a
//! numeric `type`:
//!
//! | type | Kind        | Handling                                  |
//! |------|-------------|-------------------------------------------|
//! | 1    | Invocation  | forwarded if the target is subscribed     |
//! | 6    | Ping        | keeps the connection alive                |
//! | 7    | Close       | ends the connection, maybe reconnecting   |
//! | else | Other       | ignored                                   |
//!
//! Every record is terminated by [`RECORD_SEPARATOR`].

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{ProtocolError, Result};

/// Record terminator (ASCII RS).
pub const RECORD_SEPARATOR: u8 = 0x1E;

const TYPE_INVOCATION: u8 = 1;
const TYPE_PING: u8 = 6;
const TYPE_CLOSE: u8 = 7;

/// First record sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeRequest {
    pub protocol: String,
    pub version: u32,
}

impl HandshakeRequest {
    /// Handshake for the JSON protocol, version 1.
    pub fn json() -> Self {
        Self {
            protocol: "json".to_string(),
            version: 1,
        }
    }

    pub fn to_record(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Server answer to the handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor_version: Option<u32>,
}

impl HandshakeResponse {
    /// Parse a handshake record, turning a server-side error into `Err`.
    pub fn parse(record: &str) -> Result<Self> {
        let response: HandshakeResponse = serde_json::from_str(record)?;
        match response.error {
            Some(error) => Err(ProtocolError::HandshakeRejected(error)),
            None => Ok(response),
        }
    }
}

/// A hub message after the handshake.
#[derive(Debug, Clone, PartialEq)]
pub enum HubMessage {
    /// Server calls a client-side method.
    Invocation {
        invocation_id: Option<String>,
        target: String,
        arguments: Vec<Value>,
    },

    /// Keep-alive.
    Ping,

    /// Server is closing the connection.
    Close {
        error: Option<String>,
        allow_reconnect: bool,
    },

    /// Any message kind the kiosk does not act on.
    Other(u8),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHubMessage {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    invocation_id: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    arguments: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    allow_reconnect: Option<bool>,
}

impl HubMessage {
    /// Parse one record (without its terminator).
    pub fn parse(record: &str) -> Result<Self> {
        let raw: RawHubMessage = serde_json::from_str(record)?;
        match raw.kind {
            TYPE_INVOCATION => Ok(HubMessage::Invocation {
                invocation_id: raw.invocation_id,
                target: raw.target.ok_or(ProtocolError::MissingField("target"))?,
                arguments: raw.arguments.unwrap_or_default(),
            }),
            TYPE_PING => Ok(HubMessage::Ping),
            TYPE_CLOSE => Ok(HubMessage::Close {
                error: raw.error,
                allow_reconnect: raw.allow_reconnect.unwrap_or(false),
            }),
            other => Ok(HubMessage::Other(other)),
        }
    }

    /// Build an invocation of `target` with a single argument.
    pub fn invocation(target: impl Into<String>, argument: Value) -> Self {
        HubMessage::Invocation {
            invocation_id: None,
            target: target.into(),
            arguments: vec![argument],
        }
    }

    /// Serialize to a record (without its terminator).
    pub fn to_record(&self) -> Result<String> {
        let value = match self {
            HubMessage::Invocation {
                invocation_id,
                target,
                arguments,
            } => {
                let mut value = json!({
                    "type": TYPE_INVOCATION,
                    "target": target,
                    "arguments": arguments,
                });
                if let Some(id) = invocation_id {
                    value["invocationId"] = json!(id);
                }
                value
            }
            HubMessage::Ping => json!({ "type": TYPE_PING }),
            HubMessage::Close {
                error,
                allow_reconnect,
            } => {
                let mut value = json!({ "type": TYPE_CLOSE, "allowReconnect": allow_reconnect });
                if let Some(error) = error {
                    value["error"] = json!(error);
                }
                value
            }
            HubMessage::Other(kind) => json!({ "type": kind }),
        };
        Ok(serde_json::to_string(&value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_handshake_request_record() {
        let record = HandshakeRequest::json().to_record().unwrap();
        assert_eq!(record, r#"{"protocol":"json","version":1}"#);
    }

    #[test]
    fn test_handshake_response_ok() {
        let response = HandshakeResponse::parse("{}").unwrap();
        assert_eq!(response, HandshakeResponse::default());
    }

    #[test]
    fn test_handshake_response_error() {
        let result = HandshakeResponse::parse(r#"{"error":"Requested protocol 'json' is not available."}"#);
        assert!(matches!(result, Err(ProtocolError::HandshakeRejected(msg)) if msg.contains("json")));
    }

    #[test]
    fn test_parse_invocation() {
        let message = HubMessage::parse(
            r#"{"type":1,"target":"NewPallet","arguments":[{"success":true}]}"#,
        )
        .unwrap();

        match message {
            HubMessage::Invocation {
                target, arguments, ..
            } => {
                assert_eq!(target, "NewPallet");
                assert_eq!(arguments.len(), 1);
                assert_eq!(arguments[0]["success"], Value::Bool(true));
            }
            other => panic!("expected invocation, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_invocation_without_target() {
        let result = HubMessage::parse(r#"{"type":1,"arguments":[]}"#);
        assert!(matches!(result, Err(ProtocolError::MissingField("target"))));
    }

    #[rstest]
    #[case(r#"{"type":6}"#, HubMessage::Ping)]
    #[case(r#"{"type":7}"#, HubMessage::Close { error: None, allow_reconnect: false })]
    #[case(r#"{"type":7,"error":"shutdown","allowReconnect":true}"#, HubMessage::Close { error: Some("shutdown".into()), allow_reconnect: true })]
    #[case(r#"{"type":3,"invocationId":"1"}"#, HubMessage::Other(3))]
    fn test_parse_other_kinds(#[case] record: &str, #[case] expected: HubMessage) {
        assert_eq!(HubMessage::parse(record).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("not json")]
    #[case(r#"{"target":"NewPallet"}"#)]
    fn test_parse_rejects_garbage(#[case] record: &str) {
        assert!(HubMessage::parse(record).is_err());
    }

    #[test]
    fn test_invocation_record_parses_back() {
        let message = HubMessage::invocation("NewAssociation", json!({"success": true}));
        let record = message.to_record().unwrap();
        assert_eq!(HubMessage::parse(&record).unwrap(), message);
    }

    #[test]
    fn test_ping_record() {
        assert_eq!(HubMessage::Ping.to_record().unwrap(), r#"{"type":6}"#);
    }
}
