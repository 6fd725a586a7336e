//! Shared teardown sequences.
//!
//! Host-initiated destroys, sweeper evictions, and disconnect cleanup all
//! funnel through here so the ordering is identical on every path: the
//! mutation commits first, then the broadcast goes out, then channels close
//! and blobs are reclaimed. Nothing here holds a session lock across a
//! broadcast.

use clipdock_core::error::CoreError;

use crate::state::AppState;
use crate::ws::{DestroyReason, SessionEvent};

/// Finish destroying a session that has already been detached from the
/// registry: notify every remaining channel (actor included), close them,
/// and reclaim the session's blobs.
///
/// Blob reclamation failures are returned so the sweeper can retry on its
/// next cycle; the session is gone from the registry regardless.
pub async fn finish_destroy(
    state: &AppState,
    session_id: &str,
    reason: DestroyReason,
) -> Result<(), CoreError> {
    state
        .hub
        .broadcast(session_id, &SessionEvent::SessionDestroyed { reason }, None)
        .await;
    let closed = state.hub.close_session(session_id).await;
    tracing::info!(session_id = %session_id, closed, ?reason, "Session torn down");

    state.blobs.remove_session(session_id).await
}

/// Handle a confirmed departure: remove the user from the session and tell
/// the remaining members, carrying the promoted host's ID when the host
/// left.
pub async fn handle_departure(state: &AppState, session_id: &str, user_id: &str) {
    let Some(removed) = state.registry.remove_user(session_id, user_id).await else {
        // Session already destroyed, or the user was removed on another
        // path. Nothing to announce.
        return;
    };

    state
        .hub
        .broadcast(
            session_id,
            &SessionEvent::UserLeft {
                user_id: removed.user.id,
                new_host_id: removed.promoted_host_id,
            },
            None,
        )
        .await;
}
