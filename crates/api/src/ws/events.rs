//! Wire events for the real-time channel.
//!
//! The server-to-client vocabulary is a closed sum type so the broadcast
//! contract stays exhaustively checkable; clients dispatch on the `type`
//! tag. Client-to-server traffic is limited to liveness pings.

use clipdock_core::ledger::Block;
use clipdock_core::session::User;
use clipdock_core::types::{BlockId, UserId};
use serde::{Deserialize, Serialize};

/// Why a session was destroyed, carried in [`SessionEvent::SessionDestroyed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DestroyReason {
    /// The host destroyed the session explicitly.
    HostAction,
    /// The eviction sweeper reclaimed an idle or abandoned session.
    Timeout,
}

/// An event fanned out to a session's connected members.
///
/// Events are delivered to every registered channel of the session except
/// the actor that caused them; `SessionDestroyed` and `BlockDeleted` go to
/// everyone, actor included.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    UserJoined {
        user: User,
    },
    UserLeft {
        user_id: UserId,
        /// Present when the departing host's rights moved to another member.
        #[serde(skip_serializing_if = "Option::is_none")]
        new_host_id: Option<UserId>,
    },
    BlockCreated {
        block: Block,
    },
    BlockDeleted {
        block_id: BlockId,
    },
    HostTransferred {
        new_host_id: UserId,
    },
    JoinPermissionChanged {
        allow_join: bool,
    },
    SessionDestroyed {
        reason: DestroyReason,
    },
}

/// Messages clients may send over the channel.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Liveness signal; answered with [`PONG`] and an activity refresh.
    Ping,
}

/// Reply to a client ping.
pub const PONG: &str = r#"{"type":"pong"}"#;
