//! HTTP upgrade handler and per-connection socket loop.

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use crate::state::AppState;
use crate::teardown;
use crate::ws::events::{ClientMessage, PONG};

/// Policy-violation close code sent for unknown sessions or users.
const CLOSE_POLICY: u16 = 1008;

/// GET /ws/{session_id}/{user_id} -- upgrade to the real-time channel.
///
/// After the upgrade the connection is registered with the hub and managed
/// by two tasks (sender + receiver) until the socket closes or the
/// heartbeat monitor tears it down.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path((session_id, user_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let session_id = session_id.to_lowercase();
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id, user_id))
}

/// Manage a single WebSocket connection after upgrade.
///
/// 1. Validates the session and membership (closing 1008 otherwise).
/// 2. Registers with the hub (superseding any previous channel).
/// 3. Spawns a sender task that forwards hub messages to the sink.
/// 4. Processes inbound liveness messages on the current task.
/// 5. Cleans up on disconnect, unless a reconnect superseded this channel.
async fn handle_socket(mut socket: WebSocket, state: AppState, session_id: String, user_id: String) {
    let is_member = match state.registry.session(&session_id).await {
        Ok(handle) => handle.lock().await.is_member(&user_id),
        Err(_) => false,
    };
    if !is_member {
        tracing::debug!(
            session_id = %session_id,
            user_id = %user_id,
            "Rejecting WebSocket for unknown session or user"
        );
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: CLOSE_POLICY,
                reason: "Unknown session or user".into(),
            })))
            .await;
        return;
    }

    let registration = state.hub.register(&session_id, &user_id).await;
    let epoch = registration.epoch;
    let reply = registration.sender;
    let mut rx = registration.receiver;
    state.registry.touch(&session_id).await;
    tracing::info!(session_id = %session_id, user_id = %user_id, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward hub messages to the WebSocket sink.
    let send_session_id = session_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(session_id = %send_session_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    // Receiver loop: liveness signals and disconnect detection.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Text(text)) => {
                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Ping) => {
                        state.hub.mark_seen(&session_id, &user_id).await;
                        state.registry.touch(&session_id).await;
                        if reply.send(Message::Text(PONG.into())).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        tracing::trace!(session_id = %session_id, "Ignoring unknown client message");
                    }
                }
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                state.hub.mark_seen(&session_id, &user_id).await;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(session_id = %session_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    send_task.abort();

    // Only the channel that still owns the registration reports a
    // departure; a superseded socket must not evict its replacement.
    if state
        .hub
        .unregister_if_current(&session_id, &user_id, epoch)
        .await
    {
        teardown::handle_departure(&state, &session_id, &user_id).await;
    }
    tracing::info!(session_id = %session_id, user_id = %user_id, "WebSocket disconnected");
}
