//! WebSocket infrastructure for real-time fan-out.
//!
//! Provides the connection hub, the event vocabulary, heartbeat
//! monitoring, and the HTTP upgrade handler used by the router.

pub mod events;
mod handler;
mod heartbeat;
pub mod hub;

pub use events::{DestroyReason, SessionEvent};
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use hub::WsHub;
