//! Handler for the client configuration endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Limits the client needs before it can talk to the API.
#[derive(Debug, Serialize)]
pub struct ClientConfig {
    /// Maximum accepted file-block payload, in bytes.
    pub max_file_size_bytes: u64,
    /// How often the client is expected to ping the real-time channel.
    pub heartbeat_interval_secs: u64,
}

/// GET /api/v1/config
pub async fn get_client_config(State(state): State<AppState>) -> Json<ClientConfig> {
    Json(ClientConfig {
        max_file_size_bytes: state.config.max_upload_bytes,
        heartbeat_interval_secs: state.config.heartbeat_interval_secs,
    })
}
