/**
 * Server Initialization
 *
 * Initialization and setup of the Axum HTTP server: database pool,
 * draft store wiring, and route configuration.
 */

use axum::Router;

use crate::backend::billing::DraftTtl;
use crate::backend::draft::store::DraftStore;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, load_event_log, ConfigError};
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
///
/// # Initialization Steps
///
/// 1. Connect the database pool and run migrations
/// 2. Wire the TTL source and draft store over the pool
/// 3. Select the event log implementation
/// 4. Create the router with all routes
pub async fn create_app() -> Result<Router<()>, ConfigError> {
    tracing::info!("Initializing draft sync backend");

    // Step 1: database pool (required - the store has no other home)
    let db_pool = load_database().await?;

    // Step 2: TTL reads through billing on every write, never cached
    let ttl = DraftTtl::new(db_pool.clone());
    let store = DraftStore::new(db_pool.clone(), ttl);

    // Step 3: event log is pluggable, possibly store-nothing
    let event_log = load_event_log(&db_pool);

    let app_state = AppState {
        db_pool,
        store,
        event_log,
    };

    // Step 4: router
    tracing::info!("Router configured");
    Ok(create_router(app_state))
}
