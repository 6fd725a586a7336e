//! Process-wide session registry.
//!
//! The registry is the only cross-session shared state in the system. It is
//! created at process start, passed explicitly to the coordinator and the
//! eviction sweeper, and drained at shutdown -- never reached through a
//! global.
//!
//! Locking discipline: the outer `RwLock` guards map structure only
//! (insert/remove/lookup) and is held strictly shorter than any per-session
//! critical section. Each session sits behind its own `tokio::sync::Mutex`,
//! serializing all mutations on that session while letting different
//! sessions proceed fully in parallel. No session lock is ever held across
//! a broadcast.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::{Mutex, RwLock};

use crate::error::CoreError;
use crate::session::{RemovedUser, Session, SessionSnapshot, User};
use crate::types::{SessionId, UserId};

/// Default generated session-ID length.
pub const DEFAULT_SESSION_ID_LENGTH: usize = 6;

/// Result of creating a session.
#[derive(Debug)]
pub struct CreateOutcome {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub user_name: String,
    pub is_host: bool,
}

/// Result of joining a session.
#[derive(Debug)]
pub struct JoinOutcome {
    pub session_id: SessionId,
    pub user: User,
}

/// Owner of all live sessions, keyed by session ID.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
    id_length: usize,
}

impl SessionRegistry {
    pub fn new(id_length: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            id_length,
        }
    }

    /// Create a new session with the creator as host.
    ///
    /// The generated ID is collision-checked under the map write lock, so
    /// two concurrent creates can never claim the same ID.
    pub async fn create(&self, user_name: Option<String>) -> CreateOutcome {
        let user_id = uuid::Uuid::new_v4().to_string();
        let user_name = user_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(crate::names::random_display_name);

        let mut sessions = self.sessions.write().await;
        let session_id = loop {
            let candidate = generate_session_id(self.id_length);
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let session = Session::new(session_id.clone(), user_id.clone(), user_name.clone());
        sessions.insert(session_id.clone(), Arc::new(Mutex::new(session)));
        drop(sessions);

        tracing::info!(session_id = %session_id, user_id = %user_id, "Session created");

        CreateOutcome {
            session_id,
            user_id,
            user_name,
            is_host: true,
        }
    }

    /// Look up a session handle. The returned `Arc` outlives the brief map
    /// read lock; callers take the session's own mutex for any access.
    pub async fn session(&self, session_id: &str) -> Result<Arc<Mutex<Session>>, CoreError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| CoreError::session_not_found(session_id))
    }

    /// Join an existing session as a non-host member.
    pub async fn join(
        &self,
        session_id: &str,
        user_name: Option<String>,
    ) -> Result<JoinOutcome, CoreError> {
        let handle = self.session(session_id).await?;
        let mut session = handle.lock().await;

        if !session.allow_join {
            return Err(CoreError::JoinDisabled);
        }

        let user_id = uuid::Uuid::new_v4().to_string();
        let user_name = user_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(crate::names::random_display_name);

        let user = session.add_user(user_id, &user_name).clone();

        tracing::info!(
            session_id = %session_id,
            user_id = %user.id,
            user_name = %user.name,
            "User joined session"
        );

        Ok(JoinOutcome {
            session_id: session_id.to_string(),
            user,
        })
    }

    /// Consistent point-in-time snapshot of a session.
    pub async fn snapshot(&self, session_id: &str) -> Result<SessionSnapshot, CoreError> {
        let handle = self.session(session_id).await?;
        let session = handle.lock().await;
        Ok(session.snapshot())
    }

    /// Transfer host rights from `requester` to `target`.
    pub async fn transfer_host(
        &self,
        session_id: &str,
        requester: &str,
        target: &str,
    ) -> Result<(), CoreError> {
        let handle = self.session(session_id).await?;
        let mut session = handle.lock().await;

        if !session.is_host(requester) {
            return Err(CoreError::Forbidden(
                "Only the host can transfer host rights".into(),
            ));
        }
        if !session.is_member(target) {
            return Err(CoreError::NotFound {
                entity: "User",
                id: target.to_string(),
            });
        }

        session.transfer_host(target);
        tracing::info!(session_id = %session_id, new_host_id = %target, "Host transferred");
        Ok(())
    }

    /// Enable or disable joining. Host only.
    pub async fn toggle_join(
        &self,
        session_id: &str,
        requester: &str,
        allow_join: bool,
    ) -> Result<(), CoreError> {
        let handle = self.session(session_id).await?;
        let mut session = handle.lock().await;

        if !session.is_host(requester) {
            return Err(CoreError::Forbidden(
                "Only the host can change the join permission".into(),
            ));
        }

        session.allow_join = allow_join;
        session.touch();
        tracing::info!(session_id = %session_id, allow_join, "Join permission changed");
        Ok(())
    }

    /// Remove a session at the host's request.
    ///
    /// The caller finishes the teardown (final broadcast, channel close,
    /// blob reclaim) outside any lock.
    pub async fn destroy(&self, session_id: &str, requester: &str) -> Result<(), CoreError> {
        let handle = self.session(session_id).await?;
        {
            let session = handle.lock().await;
            if !session.is_host(requester) {
                return Err(CoreError::Forbidden(
                    "Only the host can destroy the session".into(),
                ));
            }
        }

        // A racing sweep may already have removed the entry; the teardown
        // sequence is idempotent either way.
        self.sessions.write().await.remove(session_id);
        tracing::info!(session_id = %session_id, "Session destroyed by host");
        Ok(())
    }

    /// Unconditionally detach a session (eviction path).
    pub async fn take(&self, session_id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.write().await.remove(session_id)
    }

    /// Remove a user after their channel closed for good.
    ///
    /// Returns `None` when the session or user is already gone (both are
    /// normal during teardown races). Host departure promotes the
    /// earliest-joined remaining member; an emptied session is left in the
    /// registry for the sweeper so brief reconnect gaps don't destroy it.
    pub async fn remove_user(&self, session_id: &str, user_id: &str) -> Option<RemovedUser> {
        let handle = self.session(session_id).await.ok()?;
        let mut session = handle.lock().await;
        let removed = session.remove_user(user_id)?;

        tracing::info!(
            session_id = %session_id,
            user_id = %user_id,
            promoted = removed.promoted_host_id.as_deref().unwrap_or("-"),
            "User removed from session"
        );
        Some(removed)
    }

    /// Refresh a session's activity clock (heartbeat path). Unknown
    /// sessions are ignored.
    pub async fn touch(&self, session_id: &str) {
        if let Ok(handle) = self.session(session_id).await {
            handle.lock().await.touch();
        }
    }

    /// IDs of sessions that are idle past `idle_timeout` or have sat empty
    /// past `empty_grace`. The sweeper detaches and tears them down.
    pub async fn sweep_candidates(
        &self,
        idle_timeout: chrono::Duration,
        empty_grace: chrono::Duration,
    ) -> Vec<SessionId> {
        let handles: Vec<(SessionId, Arc<Mutex<Session>>)> = {
            let sessions = self.sessions.read().await;
            sessions
                .iter()
                .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
                .collect()
        };

        let mut expired = Vec::new();
        for (id, handle) in handles {
            let session = handle.lock().await;
            if session.is_expired(idle_timeout) || session.is_abandoned(empty_grace) {
                expired.push(id);
            }
        }
        expired
    }

    /// Number of live sessions.
    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Detach every session (shutdown path).
    pub async fn drain(&self) -> Vec<(SessionId, Arc<Mutex<Session>>)> {
        let mut sessions = self.sessions.write().await;
        sessions.drain().collect()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_ID_LENGTH)
    }
}

/// Generate a random lowercase alphanumeric session ID.
fn generate_session_id(length: usize) -> SessionId {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .map(|b| (b as char).to_ascii_lowercase())
        .take(length)
        .collect()
}
