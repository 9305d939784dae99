/**
 * Draft CRUD Handlers
 *
 * The HTTP side of the draft contract, used by the editor on page load
 * and for explicit save/clear actions. These handlers go through the
 * same `DraftStore` as the WebSocket channel, so both surfaces observe
 * the same atomicity and TTL behavior.
 *
 * - `GET  /api/draft` - current draft or `null` when absent/expired
 * - `POST /api/draft` - full save (equivalent to a WebSocket commit)
 * - `POST /api/draft/clear` - idempotent delete
 */

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::draft::snapshot::Snapshot;
use crate::backend::draft::store::DraftStore;
use crate::backend::error::BackendError;
use crate::backend::middleware::auth::AuthUser;

/// Draft payload returned to the editor
#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub data: Snapshot,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Body of a full save
#[derive(Debug, Deserialize)]
pub struct SaveDraftRequest {
    pub data: Snapshot,
}

/// Get the current draft for the authenticated user
///
/// Returns `null` when no live draft exists; an expired draft is
/// purged by the read and also reported as `null`.
pub async fn get_draft(
    State(store): State<DraftStore>,
    AuthUser(user): AuthUser,
) -> Result<Json<Option<DraftResponse>>, BackendError> {
    let draft = store.load(user.user_id).await?;
    Ok(Json(draft.map(|draft| DraftResponse {
        data: draft.data,
        updated_at: draft.updated_at,
        expires_at: draft.expires_at,
    })))
}

/// Save a full snapshot as the user's draft
pub async fn save_draft(
    State(store): State<DraftStore>,
    AuthUser(user): AuthUser,
    Json(request): Json<SaveDraftRequest>,
) -> Result<Json<Value>, BackendError> {
    store.commit(user.user_id, request.data).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Delete the user's draft; succeeds whether or not one existed
pub async fn clear_draft(
    State(store): State<DraftStore>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, BackendError> {
    store.clear(user.user_id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
