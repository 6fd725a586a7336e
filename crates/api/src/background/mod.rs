//! Background tasks (eviction sweeper).

pub mod eviction;
