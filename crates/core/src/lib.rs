//! clipdock domain layer.
//!
//! Owns the in-memory session registry, the per-session block ledger, the
//! blob store for uploaded file blocks, and the domain error taxonomy.
//! This crate is transport-agnostic: nothing in here knows about HTTP or
//! WebSockets.

pub mod blobs;
pub mod error;
pub mod ledger;
pub mod names;
pub mod registry;
pub mod session;
pub mod types;
