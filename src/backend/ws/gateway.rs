/**
 * Connection Gateway
 *
 * Authenticates an inbound WebSocket upgrade on the editor channel and
 * binds it to {user identity, client id} before any application
 * message is read.
 *
 * # Token Location
 *
 * The bearer token is looked up in the connection string first
 * (`?token=...`), then in the `Authorization: Bearer` header. Malformed,
 * expired, and unknown-user tokens are all rejected with the same close
 * code - the close frame never reveals which check failed.
 *
 * # Close Codes
 *
 * - 4002 when the client id path segment is missing or blank
 * - 4001 when no user could be resolved from the token
 *
 * The only side effect of authentication is the user lookup read; no
 * writes happen until the session processes its first message.
 */

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{header::AUTHORIZATION, HeaderMap},
    response::Response,
};
use serde::Deserialize;

use crate::backend::auth::resolve_user;
use crate::backend::server::state::AppState;
use crate::backend::ws::protocol::{CLOSE_MISSING_CLIENT_ID, CLOSE_UNAUTHENTICATED};
use crate::backend::ws::session::serve_session;

/// Connection-string parameters of the editor channel
#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub token: Option<String>,
}

/// Extract the bearer token from the query string or the authorization
/// header (query wins)
pub fn bearer_token(query: &AuthQuery, headers: &HeaderMap) -> Option<String> {
    if let Some(token) = query.token.as_deref() {
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    let auth = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = auth.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => {
            Some(token.to_string())
        }
        _ => None,
    }
}

/// Upgrade handler for `GET /ws/editor/{client_id}`
pub async fn editor_ws(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let token = bearer_token(&query, &headers);

    ws.on_upgrade(move |socket| async move {
        accept_connection(state, socket, client_id, token).await;
    })
}

/// Run the gateway checks, then hand the socket to the session handler
async fn accept_connection(
    state: AppState,
    socket: WebSocket,
    client_id: String,
    token: Option<String>,
) {
    if client_id.trim().is_empty() {
        close_with_code(socket, CLOSE_MISSING_CLIENT_ID, "missing client id").await;
        return;
    }

    let user = match token {
        Some(token) => resolve_user(&state.db_pool, &token).await,
        None => None,
    };

    // Anonymous sessions are never accepted on this channel
    let Some(user) = user else {
        tracing::debug!(client_id, "rejecting unauthenticated editor connection");
        close_with_code(socket, CLOSE_UNAUTHENTICATED, "unauthenticated").await;
        return;
    };

    tracing::info!(user_id = %user.id, client_id, "editor session connected");
    serve_session(state, socket, user.id, client_id).await;
}

/// Send a close frame with an application close code
async fn close_with_code(mut socket: WebSocket, code: u16, reason: &str) {
    let frame = CloseFrame {
        code,
        reason: reason.to_string().into(),
    };
    let _ = socket.send(Message::Close(Some(frame))).await;
}
