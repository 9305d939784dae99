/**
 * Editor Session Handler
 *
 * Per-connection actor for the editor channel. One task per
 * connection; messages within a connection are handled strictly in
 * receipt order, while different connections (including several tabs
 * of the same user) run in parallel and serialize only at the draft
 * store.
 *
 * # State Machine
 *
 * Connecting -> Open on gateway success (the `welcome` frame marks the
 * transition), Connecting -> Closed on gateway rejection, Open -> Open
 * on every inbound message, Open -> Closed on transport disconnect.
 * There are no fatal errors once a session is open: a failed patch or
 * commit is reported in the acknowledgement and the connection stays
 * up, because a later full commit always resets state correctly.
 */

use axum::extract::ws::{Message, WebSocket};
use serde_json::Value;
use uuid::Uuid;

use crate::backend::draft::snapshot::Snapshot;
use crate::backend::error::StoreError;
use crate::backend::server::state::AppState;
use crate::backend::ws::protocol::{self, ClientMessage, ServerMessage};

/// Serve an authenticated editor session until the transport closes
///
/// Entered from the gateway after authentication; the first frame sent
/// is the `welcome` acknowledgement echoing the client id.
pub async fn serve_session(
    state: AppState,
    mut socket: WebSocket,
    user_id: Uuid,
    client_id: String,
) {
    let welcome = ServerMessage::Welcome {
        client_id: client_id.clone(),
    };
    if protocol::send_message(&mut socket, &welcome).await.is_err() {
        return;
    }

    loop {
        let Some(message) = socket.recv().await else {
            break;
        };

        match message {
            Ok(Message::Text(raw)) => {
                let reply = match protocol::decode(&raw) {
                    Ok(inbound) => dispatch(&state, user_id, &client_id, inbound).await,
                    Err(detail) => ServerMessage::Error { detail },
                };
                if protocol::send_message(&mut socket, &reply).await.is_err() {
                    break;
                }
            }
            Ok(Message::Ping(payload)) => {
                if socket.send(Message::Pong(payload)).await.is_err() {
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                if protocol::send_message(&mut socket, &binary_frame_reply())
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(user_id = %user_id, client_id, "websocket receive error: {}", err);
                break;
            }
        }
    }

    // No compensating action on disconnect: the durable draft already
    // reflects the last successful write
    tracing::info!(user_id = %user_id, client_id, "editor session closed");
}

/// Reply for binary frames; the channel carries text frames only
fn binary_frame_reply() -> ServerMessage {
    ServerMessage::Error {
        detail: "binary frames are not supported".to_string(),
    }
}

/// Dispatch one decoded message and produce the reply frame
pub async fn dispatch(
    state: &AppState,
    user_id: Uuid,
    client_id: &str,
    message: ClientMessage,
) -> ServerMessage {
    match message {
        ClientMessage::Ping => ServerMessage::Pong,
        ClientMessage::Patch { ops } => handle_patch(state, user_id, client_id, ops).await,
        ClientMessage::Commit { snapshot } => {
            handle_commit(state, user_id, client_id, snapshot).await
        }
    }
}

/// Apply a patch batch through the draft store
///
/// `saved` reports whether anything changed. A patch arriving before
/// the first commit finds no draft; that is normal client behavior and
/// acknowledged as success-with-no-effect, never as an error.
async fn handle_patch(
    state: &AppState,
    user_id: Uuid,
    client_id: &str,
    ops: Vec<Value>,
) -> ServerMessage {
    // Recovery trail first; failures there never block the patch
    state.event_log.append(user_id, client_id, &ops).await;

    match state.store.apply_patch(user_id, &ops).await {
        Ok(outcome) => ServerMessage::Ack {
            saved: u8::from(outcome.applied > 0),
        },
        Err(StoreError::NotFound) => ServerMessage::Ack { saved: 0 },
        Err(err) => {
            tracing::error!(user_id = %user_id, client_id, "patch write failed: {}", err);
            ServerMessage::Ack { saved: 0 }
        }
    }
}

/// Commit a full snapshot through the draft store
///
/// The authoritative save path: on success the client's event trail is
/// dropped. A non-object snapshot is coerced to the empty document; an
/// object with malformed pages is reported as an error without
/// touching the stored draft.
async fn handle_commit(
    state: &AppState,
    user_id: Uuid,
    client_id: &str,
    snapshot: Value,
) -> ServerMessage {
    let snapshot: Snapshot = if snapshot.is_object() {
        match serde_json::from_value(snapshot) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::debug!(user_id = %user_id, "rejecting malformed commit snapshot: {}", err);
                return ServerMessage::Error {
                    detail: "malformed commit snapshot".to_string(),
                };
            }
        }
    } else {
        Snapshot::default()
    };

    match state.store.commit(user_id, snapshot).await {
        Ok(()) => {
            state.event_log.clear_for_client(user_id, client_id).await;
            ServerMessage::Committed { ok: true }
        }
        Err(err) => {
            tracing::error!(user_id = %user_id, client_id, "commit failed: {}", err);
            ServerMessage::Committed { ok: false }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_binary_frames_get_an_error_reply() {
        assert_eq!(
            binary_frame_reply(),
            ServerMessage::Error {
                detail: "binary frames are not supported".to_string(),
            }
        );
    }
}
