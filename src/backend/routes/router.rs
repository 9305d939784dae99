/**
 * Router Configuration
 *
 * Assembles the editor WebSocket channel and the HTTP draft endpoints
 * into one Axum router.
 *
 * # Routes
 *
 * - `GET  /ws/editor/{client_id}` - real-time editor channel; the
 *   gateway handles authentication itself (close codes, not 401s)
 * - `GET  /api/draft` / `POST /api/draft` / `POST /api/draft/clear` -
 *   draft CRUD behind bearer authentication middleware
 */

use axum::{middleware, routing::get, routing::post, Router};

use crate::backend::middleware::auth::auth_middleware;
use crate::backend::routes::draft_routes::{clear_draft, get_draft, save_draft};
use crate::backend::server::state::AppState;
use crate::backend::ws::gateway::editor_ws;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let draft_api = Router::new()
        .route("/api/draft", get(get_draft).post(save_draft))
        .route("/api/draft/clear", post(clear_draft))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/ws/editor/{client_id}", get(editor_ws))
        .merge(draft_api)
        .fallback(|| async { "404 Not Found" })
        .with_state(app_state)
}
