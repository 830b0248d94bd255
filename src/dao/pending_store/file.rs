use std::path::{Path, PathBuf};

use futures::future::BoxFuture;

use crate::dao::{
    models::{PendingSubmission, SubmissionId},
    pending_store::PendingStore,
    storage::{StorageError, StorageResult},
};

/// Pending queue persisted as a single JSON document on disk.
///
/// Survives process restart; the file is the sole source of truth for what
/// still needs to reach the server.
#[derive(Debug, Clone)]
pub struct FilePendingStore {
    path: PathBuf,
}

impl FilePendingStore {
    /// Create a store backed by the given file path. The file and its parent
    /// directory are created lazily on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_queue(path: &Path) -> StorageResult<Vec<PendingSubmission>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(StorageError::Decode),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    async fn write_queue(path: &Path, entries: &[PendingSubmission]) -> StorageResult<()> {
        let bytes = serde_json::to_vec(entries).map_err(StorageError::Encode)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(StorageError::Io)?;
        }
        tokio::fs::write(path, bytes).await.map_err(StorageError::Io)
    }
}

impl PendingStore for FilePendingStore {
    fn add(&self, entry: PendingSubmission) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.path.clone();
        Box::pin(async move {
            let mut entries = Self::read_queue(&path).await?;
            match entries
                .iter_mut()
                .find(|existing| existing.submission_id == entry.submission_id)
            {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
            Self::write_queue(&path, &entries).await
        })
    }

    fn remove(&self, submission_id: SubmissionId) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.path.clone();
        Box::pin(async move {
            let mut entries = Self::read_queue(&path).await?;
            let before = entries.len();
            entries.retain(|entry| entry.submission_id != submission_id);
            if entries.len() == before {
                return Ok(());
            }
            Self::write_queue(&path, &entries).await
        })
    }

    fn update(&self, entry: PendingSubmission) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.path.clone();
        Box::pin(async move {
            let mut entries = Self::read_queue(&path).await?;
            if let Some(existing) = entries
                .iter_mut()
                .find(|existing| existing.submission_id == entry.submission_id)
            {
                *existing = entry;
                return Self::write_queue(&path, &entries).await;
            }
            Ok(())
        })
    }

    fn list_all(&self) -> BoxFuture<'static, StorageResult<Vec<PendingSubmission>>> {
        let path = self.path.clone();
        Box::pin(async move { Self::read_queue(&path).await })
    }
}
