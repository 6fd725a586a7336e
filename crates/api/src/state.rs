use std::sync::Arc;

use clipdock_core::blobs::BlobStore;
use clipdock_core::registry::SessionRegistry;

use crate::config::ServerConfig;
use crate::ws::WsHub;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`). The registry is
/// created once at process start and passed here explicitly -- there is no
/// ambient global session map.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Owner of all live sessions.
    pub registry: Arc<SessionRegistry>,
    /// WebSocket connection hub (fan-out, liveness).
    pub hub: Arc<WsHub>,
    /// Blob storage for uploaded file blocks.
    pub blobs: Arc<BlobStore>,
}
