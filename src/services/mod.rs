//! The synchronization engine proper: dispatch, resync, projection, cadence,
//! and push subscriptions.

/// Phase-to-interval polling cadence mapping.
pub mod cadence;
/// Submission orchestration and the background resync pass.
pub mod dispatcher;
/// Idempotency-key issuance and reuse.
pub mod idempotency;
/// Optimistic merge of pending submissions into cached scorecards.
pub mod projector;
/// Push-driven cache invalidation subscriptions.
pub mod subscriber;
