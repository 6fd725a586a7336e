//! Handlers for the `/session` resource.
//!
//! Sessions are created and joined over HTTP; the resulting user ID is the
//! caller's credential for every later mutation and for the real-time
//! channel. Each mutation commits under the session's critical section
//! before its broadcast goes out.

use axum::extract::{Path, State};
use axum::Json;
use clipdock_core::session::SessionSnapshot;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::Ack;
use crate::state::AppState;
use crate::teardown;
use crate::ws::{DestroyReason, SessionEvent};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinSessionRequest {
    pub session_id: String,
    pub user_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DestroySessionRequest {
    pub session_id: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferHostRequest {
    pub session_id: String,
    pub current_host_id: String,
    pub new_host_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ToggleJoinRequest {
    pub session_id: String,
    pub user_id: String,
    pub allow_join: bool,
}

/// Credentials handed to a user on create/join.
#[derive(Debug, Serialize)]
pub struct SessionAccess {
    pub session_id: String,
    pub user_id: String,
    pub user_name: String,
    pub is_host: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/session/create
///
/// Create a new session with the caller as host. A display name is
/// generated when none is supplied.
pub async fn create_session(
    State(state): State<AppState>,
    Json(input): Json<CreateSessionRequest>,
) -> AppResult<Json<SessionAccess>> {
    let outcome = state.registry.create(input.user_name).await;

    Ok(Json(SessionAccess {
        session_id: outcome.session_id,
        user_id: outcome.user_id,
        user_name: outcome.user_name,
        is_host: outcome.is_host,
    }))
}

/// POST /api/v1/session/join
///
/// Join an existing session. Display names are de-duplicated against
/// current members ("Sam", "Sam(2)", ...). Remaining members are notified
/// with `user_joined`.
pub async fn join_session(
    State(state): State<AppState>,
    Json(input): Json<JoinSessionRequest>,
) -> AppResult<Json<SessionAccess>> {
    let session_id = input.session_id.to_lowercase();
    let outcome = state.registry.join(&session_id, input.user_name).await?;

    state
        .hub
        .broadcast(
            &session_id,
            &SessionEvent::UserJoined {
                user: outcome.user.clone(),
            },
            Some(&outcome.user.id),
        )
        .await;

    Ok(Json(SessionAccess {
        session_id: outcome.session_id,
        user_id: outcome.user.id,
        user_name: outcome.user.name,
        is_host: outcome.user.is_host,
    }))
}

/// GET /api/v1/session/{id}
///
/// Full session snapshot: members, blocks, join permission, host.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionSnapshot>> {
    let session_id = session_id.to_lowercase();
    let snapshot = state.registry.snapshot(&session_id).await?;
    Ok(Json(snapshot))
}

/// POST /api/v1/session/destroy
///
/// Destroy a session (host only). All members, the actor included, receive
/// `session_destroyed` before their channels close.
pub async fn destroy_session(
    State(state): State<AppState>,
    Json(input): Json<DestroySessionRequest>,
) -> AppResult<Json<Ack>> {
    let session_id = input.session_id.to_lowercase();
    state.registry.destroy(&session_id, &input.user_id).await?;

    if let Err(e) = teardown::finish_destroy(&state, &session_id, DestroyReason::HostAction).await {
        // The session is gone either way; the sweeper retries blob cleanup.
        tracing::error!(session_id = %session_id, error = %e, "Blob reclaim failed on destroy");
    }

    Ok(Json(Ack::ok()))
}

/// POST /api/v1/session/transfer_host
///
/// Transfer host rights to another member (host only).
pub async fn transfer_host(
    State(state): State<AppState>,
    Json(input): Json<TransferHostRequest>,
) -> AppResult<Json<Ack>> {
    let session_id = input.session_id.to_lowercase();
    state
        .registry
        .transfer_host(&session_id, &input.current_host_id, &input.new_host_id)
        .await?;

    state
        .hub
        .broadcast(
            &session_id,
            &SessionEvent::HostTransferred {
                new_host_id: input.new_host_id,
            },
            Some(&input.current_host_id),
        )
        .await;

    Ok(Json(Ack::ok()))
}

/// POST /api/v1/session/toggle_join
///
/// Enable or disable new members joining (host only). Existing members are
/// unaffected.
pub async fn toggle_join(
    State(state): State<AppState>,
    Json(input): Json<ToggleJoinRequest>,
) -> AppResult<Json<Ack>> {
    let session_id = input.session_id.to_lowercase();
    state
        .registry
        .toggle_join(&session_id, &input.user_id, input.allow_join)
        .await?;

    state
        .hub
        .broadcast(
            &session_id,
            &SessionEvent::JoinPermissionChanged {
                allow_join: input.allow_join,
            },
            Some(&input.user_id),
        )
        .await;

    Ok(Json(Ack::ok()))
}
