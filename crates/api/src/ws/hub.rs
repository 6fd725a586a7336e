//! Connection hub: one addressable channel per connected (session, user)
//! pair, with fan-out and liveness tracking.
//!
//! Delivery is at-least-once, best-effort, in-order per channel: each
//! connection has an unbounded mpsc queue drained by its forwarder task, so
//! a slow or dead socket never stalls the broadcaster. A user holds at most
//! one live channel; registering again supersedes (closes) the previous one
//! so client auto-reconnects don't churn membership.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::ws::Message;
use clipdock_core::types::{SessionId, Timestamp, UserId};
use tokio::sync::{mpsc, RwLock};

use super::events::SessionEvent;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
    /// Last liveness signal (ping, pong, or registration).
    pub last_seen: Instant,
    /// Distinguishes this connection from a later one under the same key.
    pub epoch: u64,
}

/// The result of registering a connection.
pub struct Registration {
    /// Receiver the socket task drains into the WebSocket sink.
    pub receiver: mpsc::UnboundedReceiver<Message>,
    /// Sender for direct replies (pong) on this connection.
    pub sender: WsSender,
    /// Pass back to [`WsHub::unregister_if_current`] on disconnect so a
    /// superseded socket can't tear down its replacement.
    pub epoch: u64,
}

/// Manages all active WebSocket connections, keyed session-first.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application. The hub never mutates session state --
/// it only delivers events and reports liveness.
pub struct WsHub {
    sessions: RwLock<HashMap<SessionId, HashMap<UserId, WsConnection>>>,
    next_epoch: AtomicU64,
}

impl WsHub {
    /// Create a new, empty hub.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_epoch: AtomicU64::new(1),
        }
    }

    /// Register a connection for `(session_id, user_id)`.
    ///
    /// Latest channel wins: an existing registration under the same key is
    /// sent a Close frame and replaced. The duplicate is resolved here, not
    /// surfaced to the user.
    pub async fn register(&self, session_id: &str, user_id: &str) -> Registration {
        let (tx, rx) = mpsc::unbounded_channel();
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        let conn = WsConnection {
            sender: tx.clone(),
            connected_at: chrono::Utc::now(),
            last_seen: Instant::now(),
            epoch,
        };

        let mut sessions = self.sessions.write().await;
        let members = sessions.entry(session_id.to_string()).or_default();
        if let Some(previous) = members.insert(user_id.to_string(), conn) {
            let _ = previous.sender.send(Message::Close(None));
            tracing::debug!(
                session_id = %session_id,
                user_id = %user_id,
                "Superseded previous WebSocket connection"
            );
        }

        Registration {
            receiver: rx,
            sender: tx,
            epoch,
        }
    }

    /// Remove a registration, but only if it still belongs to the caller's
    /// epoch. Returns `true` when the entry was actually removed -- `false`
    /// means a newer connection took over and the caller must not treat the
    /// close as a departure.
    pub async fn unregister_if_current(
        &self,
        session_id: &str,
        user_id: &str,
        epoch: u64,
    ) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(members) = sessions.get_mut(session_id) else {
            return false;
        };
        let current = members.get(user_id).is_some_and(|c| c.epoch == epoch);
        if current {
            members.remove(user_id);
            if members.is_empty() {
                sessions.remove(session_id);
            }
        }
        current
    }

    /// Detach one connection unconditionally (heartbeat-timeout path),
    /// sending it a Close frame. Returns `true` if a connection was present.
    pub async fn disconnect(&self, session_id: &str, user_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(members) = sessions.get_mut(session_id) else {
            return false;
        };
        let Some(conn) = members.remove(user_id) else {
            return false;
        };
        let _ = conn.sender.send(Message::Close(None));
        if members.is_empty() {
            sessions.remove(session_id);
        }
        true
    }

    /// Broadcast an event to every registered channel of a session except
    /// `exclude`. The event is serialized once; closed channels are skipped
    /// (their socket tasks clean up on their own).
    pub async fn broadcast(
        &self,
        session_id: &str,
        event: &SessionEvent,
        exclude: Option<&str>,
    ) {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize broadcast event");
                return;
            }
        };

        let sessions = self.sessions.read().await;
        let Some(members) = sessions.get(session_id) else {
            return;
        };

        let mut delivered = 0usize;
        for (user_id, conn) in members {
            if exclude == Some(user_id.as_str()) {
                continue;
            }
            if conn.sender.send(Message::Text(json.clone().into())).is_ok() {
                delivered += 1;
            }
        }
        tracing::debug!(session_id = %session_id, delivered, "Broadcast event");
    }

    /// Record a liveness signal for a connection.
    pub async fn mark_seen(&self, session_id: &str, user_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(conn) = sessions
            .get_mut(session_id)
            .and_then(|members| members.get_mut(user_id))
        {
            conn.last_seen = Instant::now();
        }
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let sessions = self.sessions.read().await;
        for members in sessions.values() {
            for conn in members.values() {
                let _ = conn.sender.send(Message::Ping(Bytes::new()));
            }
        }
    }

    /// Connections silent for longer than `timeout`.
    pub async fn stale_connections(&self, timeout: std::time::Duration) -> Vec<(SessionId, UserId)> {
        let sessions = self.sessions.read().await;
        let mut stale = Vec::new();
        for (session_id, members) in sessions.iter() {
            for (user_id, conn) in members {
                if conn.last_seen.elapsed() > timeout {
                    stale.push((session_id.clone(), user_id.clone()));
                }
            }
        }
        stale
    }

    /// Send a Close frame to every channel of one session and drop them all.
    /// Returns the number of channels closed.
    pub async fn close_session(&self, session_id: &str) -> usize {
        let mut sessions = self.sessions.write().await;
        let Some(members) = sessions.remove(session_id) else {
            return 0;
        };
        let count = members.len();
        for conn in members.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        count
    }

    /// Return the current number of active connections across all sessions.
    pub async fn connection_count(&self) -> usize {
        self.sessions.read().await.values().map(HashMap::len).sum()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut sessions = self.sessions.write().await;
        let count: usize = sessions.values().map(HashMap::len).sum();
        for members in sessions.values() {
            for conn in members.values() {
                let _ = conn.sender.send(Message::Close(None));
            }
        }
        sessions.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }
}

impl Default for WsHub {
    fn default() -> Self {
        Self::new()
    }
}
