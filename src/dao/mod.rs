//! Durable local persistence for not-yet-confirmed score submissions.

/// Durable queue entity definitions.
pub mod models;
/// Pending-submission queue abstraction and its backends.
pub mod pending_store;
/// Storage error types shared by queue backends.
pub mod storage;
