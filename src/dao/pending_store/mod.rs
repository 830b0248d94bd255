mod file;
mod memory;

pub use file::FilePendingStore;
pub use memory::MemoryPendingStore;

use futures::future::BoxFuture;

use crate::dao::{
    models::{PendingSubmission, SubmissionId},
    storage::StorageResult,
};

/// Abstraction over the durable, ordered queue of unconfirmed submissions.
///
/// The backing medium has no partial-update primitive; every mutation is a
/// full read, in-memory change, full write. Callers must serialize mutations
/// through a single queue-level lock rather than relying on per-entry locks.
pub trait PendingStore: Send + Sync {
    /// Append an entry to the queue. Re-adding an entry with the same
    /// submission id replaces it in place instead of duplicating it.
    fn add(&self, entry: PendingSubmission) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove the entry with the given submission id, if present.
    fn remove(&self, submission_id: SubmissionId) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace the stored entry carrying the same submission id, preserving
    /// its queue position. Used to persist retry-count bumps.
    fn update(&self, entry: PendingSubmission) -> BoxFuture<'static, StorageResult<()>>;
    /// All queued entries in insertion order.
    fn list_all(&self) -> BoxFuture<'static, StorageResult<Vec<PendingSubmission>>>;
}
