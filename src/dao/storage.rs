use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by pending-queue backends regardless of the backing medium.
///
/// Queue durability is best-effort: callers log these and carry on, because
/// the remote call itself is idempotent.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing medium could not be read or written.
    #[error("failed to access pending queue: {0}")]
    Io(#[source] std::io::Error),
    /// The queue document could not be serialized.
    #[error("failed to encode pending queue: {0}")]
    Encode(#[source] serde_json::Error),
    /// The queue document on disk could not be deserialized.
    #[error("failed to decode pending queue: {0}")]
    Decode(#[source] serde_json::Error),
}
