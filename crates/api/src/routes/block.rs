//! Route definitions for the block resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::config::ServerConfig;
use crate::handlers::block;
use crate::state::AppState;

/// Slack on top of the payload limit for multipart framing overhead. The
/// precise per-file check happens in the handler.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Block routes mounted at `/block`, upload excluded.
///
/// ```text
/// POST   /create                           -> create_text_block
/// DELETE /delete                           -> delete_block
/// GET    /download/{session_id}/{block_id} -> download_block
/// ```
///
/// `POST /upload` lives in [`upload_router`] so the router builder can
/// mount it outside the request-timeout layer.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(block::create_text_block))
        .route("/delete", delete(block::delete_block))
        .route(
            "/download/{session_id}/{block_id}",
            get(block::download_block),
        )
}

/// The upload route, mounted at `/block` next to [`router`].
///
/// Uploads are bounded by the configured payload size, not by wall clock:
/// a file near the 1 GiB default would never fit inside the request
/// timeout on an ordinary link.
pub fn upload_router(config: &ServerConfig) -> Router<AppState> {
    let upload_limit = (config.max_upload_bytes as usize).saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new().route(
        "/upload",
        post(block::upload_file_block).layer(DefaultBodyLimit::max(upload_limit)),
    )
}
