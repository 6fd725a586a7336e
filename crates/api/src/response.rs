//! Shared response types for API handlers.

use serde::Serialize;

/// Standard `{ "success": true }` acknowledgement for mutations that return
/// no payload. Use this instead of ad-hoc `serde_json::json!` literals so
/// the shape stays consistent across handlers.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
