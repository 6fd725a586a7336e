pub mod block;
pub mod health;
pub mod session;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree, minus the upload route.
///
/// Route hierarchy:
///
/// ```text
/// /config                                  client limits (GET)
///
/// /session/create                          create session (POST)
/// /session/join                            join session (POST)
/// /session/destroy                         destroy session, host only (POST)
/// /session/transfer_host                   transfer host rights (POST)
/// /session/toggle_join                     toggle join permission (POST)
/// /session/{id}                            session snapshot (GET)
///
/// /block/create                            create text block (POST)
/// /block/delete                            delete block (DELETE)
/// /block/download/{session_id}/{block_id}  download payload (GET)
/// ```
///
/// `POST /block/upload` is mounted separately by
/// [`crate::router::build_app_router`] so it escapes the request-timeout
/// layer; the WebSocket endpoint (`/ws/...`) and `/health` live at root
/// level, also in the router builder.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/config", get(handlers::client_config::get_client_config))
        .nest("/session", session::router())
        .nest("/block", block::router())
}
