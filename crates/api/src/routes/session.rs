//! Route definitions for the session resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::session;
use crate::state::AppState;

/// Session routes mounted at `/session`.
///
/// ```text
/// POST /create         -> create_session
/// POST /join           -> join_session
/// POST /destroy        -> destroy_session
/// POST /transfer_host  -> transfer_host
/// POST /toggle_join    -> toggle_join
/// GET  /{id}           -> get_session
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(session::create_session))
        .route("/join", post(session::join_session))
        .route("/destroy", post(session::destroy_session))
        .route("/transfer_host", post(session::transfer_host))
        .route("/toggle_join", post(session::toggle_join))
        .route("/{id}", get(session::get_session))
}
