use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use crate::dao::{
    models::{PendingSubmission, SubmissionId},
    pending_store::PendingStore,
    storage::StorageResult,
};

/// In-memory pending queue. No durability; used by tests and as a fallback
/// when no writable storage location exists.
#[derive(Debug, Clone, Default)]
pub struct MemoryPendingStore {
    entries: Arc<Mutex<Vec<PendingSubmission>>>,
}

impl MemoryPendingStore {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PendingStore for MemoryPendingStore {
    fn add(&self, entry: PendingSubmission) -> BoxFuture<'static, StorageResult<()>> {
        let entries = self.entries.clone();
        Box::pin(async move {
            let mut guard = entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            match guard
                .iter_mut()
                .find(|existing| existing.submission_id == entry.submission_id)
            {
                Some(existing) => *existing = entry,
                None => guard.push(entry),
            }
            Ok(())
        })
    }

    fn remove(&self, submission_id: SubmissionId) -> BoxFuture<'static, StorageResult<()>> {
        let entries = self.entries.clone();
        Box::pin(async move {
            let mut guard = entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.retain(|entry| entry.submission_id != submission_id);
            Ok(())
        })
    }

    fn update(&self, entry: PendingSubmission) -> BoxFuture<'static, StorageResult<()>> {
        let entries = self.entries.clone();
        Box::pin(async move {
            let mut guard = entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(existing) = guard
                .iter_mut()
                .find(|existing| existing.submission_id == entry.submission_id)
            {
                *existing = entry;
            }
            Ok(())
        })
    }

    fn list_all(&self) -> BoxFuture<'static, StorageResult<Vec<PendingSubmission>>> {
        let entries = self.entries.clone();
        Box::pin(async move {
            let guard = entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            Ok(guard.clone())
        })
    }
}
