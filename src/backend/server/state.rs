/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` is the central state container:
 * - The PostgreSQL connection pool (token resolution reads)
 * - The draft store (single source of truth for drafts)
 * - The pluggable draft event log
 *
 * # Thread Safety
 *
 * Every field is cheap to clone and safe to share: the pool is
 * internally reference-counted, and the store/event log hold clones of
 * it. There is deliberately no in-process shared mutable state - the
 * per-user row lock in the draft store is the only serialization
 * point, so sessions in different processes behave identically to
 * sessions in one.
 */

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::backend::draft::events::DraftEventLog;
use crate::backend::draft::store::DraftStore;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db_pool: PgPool,

    /// Durable draft store
    pub store: DraftStore,

    /// Best-effort event log (may be the store-nothing variant)
    pub event_log: DraftEventLog,
}

/// Allow handlers to extract the pool directly
impl FromRef<AppState> for PgPool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}

/// Allow handlers to extract the draft store directly
impl FromRef<AppState> for DraftStore {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.store.clone()
    }
}

/// Allow handlers to extract the event log directly
impl FromRef<AppState> for DraftEventLog {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.event_log.clone()
    }
}
