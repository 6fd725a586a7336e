//! Heartbeat monitor for WebSocket liveness.
//!
//! Clients send `{"type":"ping"}` at least once per interval. This task
//! additionally sends protocol-level Ping frames and tears down channels
//! that have been silent for the configured number of intervals, reporting
//! each as a disconnect so membership is cleaned up.

use crate::state::AppState;
use crate::teardown;

/// Spawn the background heartbeat task.
///
/// The task runs until aborted during shutdown. The returned `JoinHandle`
/// is used to stop it explicitly.
pub fn start_heartbeat(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(state.config.heartbeat_interval());
        let timeout = state.config.heartbeat_timeout();

        loop {
            interval.tick().await;

            let count = state.hub.connection_count().await;
            tracing::debug!(count, "WebSocket heartbeat ping");
            state.hub.ping_all().await;

            let stale = state.hub.stale_connections(timeout).await;
            for (session_id, user_id) in stale {
                if state.hub.disconnect(&session_id, &user_id).await {
                    tracing::info!(
                        session_id = %session_id,
                        user_id = %user_id,
                        "Heartbeat timeout, dropping connection"
                    );
                    teardown::handle_departure(&state, &session_id, &user_id).await;
                }
            }
        }
    })
}
