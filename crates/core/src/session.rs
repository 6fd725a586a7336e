//! Session and user entities.
//!
//! A [`Session`] owns its members and its block ledger. All mutation goes
//! through the registry's per-session critical section, so nothing in here
//! needs its own locking.

use chrono::Utc;
use serde::Serialize;

use crate::ledger::{Block, BlockLedger};
use crate::names;
use crate::types::{SessionId, Timestamp, UserId};

/// A member of a session.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub is_host: bool,
    /// Join time; drives deterministic host promotion. Not on the wire.
    #[serde(skip)]
    pub joined_at: Timestamp,
}

/// Point-in-time view of a session, taken under its critical section.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub users: Vec<User>,
    pub blocks: Vec<Block>,
    pub allow_join: bool,
    pub host_id: UserId,
}

/// The result of removing a user, carrying what the caller needs for
/// follow-up broadcasts.
#[derive(Debug)]
pub struct RemovedUser {
    pub user: User,
    /// Set when the removed user was host and another member was promoted.
    pub promoted_host_id: Option<UserId>,
}

/// An ephemeral collaboration scope: one host, any number of members, an
/// ordered ledger of content blocks.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    /// Members in join order (index 0 is the longest-standing member).
    users: Vec<User>,
    pub ledger: BlockLedger,
    pub allow_join: bool,
    pub created_at: Timestamp,
    last_activity: Timestamp,
    /// Set when the last member disconnects; cleared on (re)join.
    empty_since: Option<Timestamp>,
}

impl Session {
    /// Create a session with its creator as host.
    pub fn new(id: SessionId, host_id: UserId, host_name: String) -> Self {
        let now = Utc::now();
        let host = User {
            id: host_id,
            name: host_name,
            is_host: true,
            joined_at: now,
        };
        Self {
            id,
            users: vec![host],
            ledger: BlockLedger::new(),
            allow_join: true,
            created_at: now,
            last_activity: now,
            empty_since: None,
        }
    }

    /// Refresh the last-activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Whether the session has been inactive longer than `timeout`.
    pub fn is_expired(&self, timeout: chrono::Duration) -> bool {
        Utc::now() - self.last_activity > timeout
    }

    /// Whether the session has had no members longer than `grace`.
    pub fn is_abandoned(&self, grace: chrono::Duration) -> bool {
        match self.empty_since {
            Some(since) => Utc::now() - since > grace,
            None => false,
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn member(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == user_id)
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.member(user_id).is_some()
    }

    pub fn is_host(&self, user_id: &str) -> bool {
        self.member(user_id).is_some_and(|u| u.is_host)
    }

    /// The current host's ID. Sessions always have exactly one host while
    /// they exist, so an empty result only happens transiently between the
    /// last disconnect and eviction.
    pub fn host_id(&self) -> Option<&UserId> {
        self.users.iter().find(|u| u.is_host).map(|u| &u.id)
    }

    /// Append a new non-host member. The supplied name is de-duplicated
    /// against existing members.
    pub fn add_user(&mut self, user_id: UserId, name: &str) -> &User {
        let unique = names::uniquify(name, self.users.iter().map(|u| u.name.as_str()));
        self.users.push(User {
            id: user_id,
            name: unique,
            is_host: self.users.is_empty(),
            joined_at: Utc::now(),
        });
        self.empty_since = None;
        self.touch();
        self.users.last().expect("just pushed")
    }

    /// Remove a member. If the host left and other members remain, the
    /// earliest-joined member is promoted so the single-host invariant is
    /// restored before anyone can observe the session.
    pub fn remove_user(&mut self, user_id: &str) -> Option<RemovedUser> {
        let idx = self.users.iter().position(|u| u.id == user_id)?;
        let user = self.users.remove(idx);

        let promoted_host_id = if user.is_host && !self.users.is_empty() {
            // Join order doubles as the earliest-joined tie-break: joins
            // serialize on the session lock, so index 0 is deterministic.
            self.users[0].is_host = true;
            Some(self.users[0].id.clone())
        } else {
            None
        };

        if self.users.is_empty() {
            self.empty_since = Some(Utc::now());
        }
        self.touch();

        Some(RemovedUser {
            user,
            promoted_host_id,
        })
    }

    /// Flip `is_host` from the current host to `new_host_id`. The caller
    /// has already verified that `new_host_id` is a member.
    pub fn transfer_host(&mut self, new_host_id: &str) {
        for user in &mut self.users {
            user.is_host = user.id == new_host_id;
        }
        self.touch();
    }

    /// Snapshot users, blocks, and permission state in one consistent view.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            users: self.users.clone(),
            blocks: self.ledger.list(),
            allow_join: self.allow_join,
            host_id: self.host_id().cloned().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new("abc123".into(), "host-1".into(), "Host".into())
    }

    #[test]
    fn creator_is_host() {
        let s = session();
        assert!(s.is_host("host-1"));
        assert_eq!(s.host_id(), Some(&"host-1".to_string()));
        assert!(s.allow_join);
    }

    #[test]
    fn exactly_one_host_after_transfer() {
        let mut s = session();
        s.add_user("user-2".into(), "Bob");
        s.transfer_host("user-2");

        let hosts: Vec<_> = s.users().iter().filter(|u| u.is_host).collect();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].id, "user-2");
        assert!(!s.is_host("host-1"));
    }

    #[test]
    fn duplicate_join_names_are_suffixed() {
        let mut s = session();
        s.add_user("user-2".into(), "Sam");
        let third = s.add_user("user-3".into(), "Sam");
        assert_eq!(third.name, "Sam(2)");
    }

    #[test]
    fn host_leave_promotes_earliest_joined() {
        let mut s = session();
        s.add_user("user-2".into(), "Bob");
        s.add_user("user-3".into(), "Eve");

        let removed = s.remove_user("host-1").expect("host is a member");
        assert_eq!(removed.promoted_host_id.as_deref(), Some("user-2"));
        assert!(s.is_host("user-2"));
        assert!(!s.is_host("user-3"));
    }

    #[test]
    fn non_host_leave_promotes_nobody() {
        let mut s = session();
        s.add_user("user-2".into(), "Bob");

        let removed = s.remove_user("user-2").expect("member");
        assert!(removed.promoted_host_id.is_none());
        assert!(s.is_host("host-1"));
    }

    #[test]
    fn last_leave_marks_session_empty() {
        let mut s = session();
        s.remove_user("host-1");
        assert!(s.users().is_empty());
        assert!(!s.is_abandoned(chrono::Duration::seconds(60)));
        assert!(s.is_abandoned(chrono::Duration::seconds(-1)));
    }

    #[test]
    fn rejoin_clears_empty_marker() {
        let mut s = session();
        s.remove_user("host-1");
        s.add_user("user-2".into(), "Bob");
        assert!(!s.is_abandoned(chrono::Duration::seconds(-1)));
        // The sole member of a previously-empty session becomes host.
        assert!(s.is_host("user-2"));
    }

    #[test]
    fn remove_unknown_user_is_none() {
        let mut s = session();
        assert!(s.remove_user("ghost").is_none());
    }

    #[test]
    fn snapshot_reflects_membership_and_permission() {
        let mut s = session();
        s.add_user("user-2".into(), "Bob");
        s.allow_join = false;

        let snap = s.snapshot();
        assert_eq!(snap.users.len(), 2);
        assert_eq!(snap.host_id, "host-1");
        assert!(!snap.allow_join);
    }
}
