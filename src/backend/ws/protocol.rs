/**
 * Editor Channel Wire Protocol
 *
 * One JSON object per WebSocket text frame.
 *
 * Inbound:
 * - `{"type":"patch","ops":[{"op":"...", ...}, ...]}`
 * - `{"type":"commit","snapshot":{...}}`
 * - `{"type":"ping"}`
 *
 * Outbound:
 * - `{"type":"welcome","client_id":"..."}`
 * - `{"type":"ack","saved":0|1}`
 * - `{"type":"committed","ok":true|false}`
 * - `{"type":"pong"}`
 * - `{"type":"error","detail":"..."}`
 *
 * Close codes are distinct so clients can tell retry-with-new-token
 * apart from fatal misconfiguration.
 */

use axum::extract::ws::{Message, WebSocket};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Close code for connections without a resolvable user
pub const CLOSE_UNAUTHENTICATED: u16 = 4001;
/// Close code for connections missing the client id path segment
pub const CLOSE_MISSING_CLIENT_ID: u16 = 4002;

/// Message from the editor client
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Incremental batch of edit operations
    Patch { ops: Vec<Value> },
    /// Full snapshot replace
    Commit { snapshot: Value },
    /// Liveness probe
    Ping,
}

/// Message to the editor client
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Welcome { client_id: String },
    Ack { saved: u8 },
    Committed { ok: bool },
    Pong,
    Error { detail: String },
}

/// Decode one inbound frame
///
/// An unrecognized `type` and a recognized type with malformed fields
/// are both reported as an `Err` detail for an `error` reply; neither
/// closes the connection.
pub fn decode(raw: &str) -> Result<ClientMessage, String> {
    let mut value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => return Err("invalid json".to_string()),
    };

    let msg_type = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_ascii_lowercase();

    if let Some(slot) = value.get_mut("type") {
        *slot = Value::String(msg_type.clone());
    }

    match msg_type.as_str() {
        "patch" | "commit" | "ping" => serde_json::from_value(value)
            .map_err(|_| format!("malformed {} message", msg_type)),
        _ => Err("unknown message type".to_string()),
    }
}

/// Serialize and send one outbound frame
pub async fn send_message(
    socket: &mut WebSocket,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(message).map_err(axum::Error::new)?;
    socket.send(Message::Text(payload.into())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_decode_patch() {
        let message = decode(r#"{"type":"patch","ops":[{"op":"set_name","name":"x"}]}"#).unwrap();
        match message {
            ClientMessage::Patch { ops } => assert_eq!(ops.len(), 1),
            other => panic!("expected patch, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_commit_and_ping() {
        assert!(matches!(
            decode(r#"{"type":"commit","snapshot":{"pages":[]}}"#),
            Ok(ClientMessage::Commit { .. })
        ));
        assert_eq!(decode(r#"{"type":"ping"}"#), Ok(ClientMessage::Ping));
        // Type matching is case-insensitive
        assert_eq!(decode(r#"{"type":"PING"}"#), Ok(ClientMessage::Ping));
    }

    #[test]
    fn test_decode_unknown_type() {
        assert_eq!(
            decode(r#"{"type":"events","events":[]}"#),
            Err("unknown message type".to_string())
        );
        assert_eq!(
            decode(r#"{"no_type": true}"#),
            Err("unknown message type".to_string())
        );
    }

    #[test]
    fn test_decode_malformed_fields() {
        // ops must be a list
        assert_eq!(
            decode(r#"{"type":"patch","ops":"oops"}"#),
            Err("malformed patch message".to_string())
        );
        // snapshot field missing entirely
        assert_eq!(
            decode(r#"{"type":"commit"}"#),
            Err("malformed commit message".to_string())
        );
    }

    #[test]
    fn test_encode_shapes() {
        let welcome = serde_json::to_value(ServerMessage::Welcome {
            client_id: "tab-1".to_string(),
        })
        .unwrap();
        assert_eq!(welcome, json!({"type": "welcome", "client_id": "tab-1"}));

        let ack = serde_json::to_value(ServerMessage::Ack { saved: 1 }).unwrap();
        assert_eq!(ack, json!({"type": "ack", "saved": 1}));

        let committed = serde_json::to_value(ServerMessage::Committed { ok: false }).unwrap();
        assert_eq!(committed, json!({"type": "committed", "ok": false}));

        let pong = serde_json::to_value(ServerMessage::Pong).unwrap();
        assert_eq!(pong, json!({"type": "pong"}));
    }

    #[test]
    fn test_close_codes_are_distinct() {
        assert_ne!(CLOSE_UNAUTHENTICATED, CLOSE_MISSING_CLIENT_ID);
        assert_ne!(CLOSE_UNAUTHENTICATED, 1000);
        assert_ne!(CLOSE_MISSING_CLIENT_ID, 1000);
    }
}
