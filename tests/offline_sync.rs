//! End-to-end scenarios: offline queueing surviving a restart, idempotent
//! resubmission, and the resync pass against a scripted backend.

use std::{
    collections::{HashMap, VecDeque},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use futures::future::BoxFuture;
use time::OffsetDateTime;
use uuid::Uuid;

use ringside_sync::{
    config::SyncConfig,
    dao::{
        models::{PendingSubmission, SubmissionId},
        pending_store::{FilePendingStore, PendingStore},
    },
    dto::{
        admin::{LiveFightSummary, RoundAction, RoundStateUpdate},
        score::{ScoreSubmissionResult, UserScore},
        scorecard::CachedScorecard,
    },
    error::BackendError,
    remote::ScoreBackend,
    services::dispatcher::{SubmissionDispatcher, SubmitRequest, SyncReport},
    state::{ConnectivityMonitor, ScorecardCache},
};

/// Backend with the server-side idempotency contract: the first delivery of a
/// (bout, round, submission id) records it, any repeat answers
/// `idempotent: true`, and exactly one score is kept.
#[derive(Default)]
struct RecordingBackend {
    recorded: Mutex<HashMap<(String, u32), SubmissionId>>,
    outages: Mutex<VecDeque<BackendError>>,
}

impl RecordingBackend {
    fn with_outages(outages: impl IntoIterator<Item = BackendError>) -> Arc<Self> {
        Arc::new(Self {
            recorded: Mutex::new(HashMap::new()),
            outages: Mutex::new(outages.into_iter().collect()),
        })
    }

    fn recorded_count(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }
}

impl ScoreBackend for RecordingBackend {
    fn submit_score(
        &self,
        entry: &PendingSubmission,
    ) -> BoxFuture<'static, Result<ScoreSubmissionResult, BackendError>> {
        if let Some(outage) = self.outages.lock().unwrap().pop_front() {
            return Box::pin(async move { Err(outage) });
        }

        let key = (entry.bout_id.clone(), entry.round_number);
        let mut recorded = self.recorded.lock().unwrap();
        let idempotent = recorded.get(&key) == Some(&entry.submission_id);
        if !idempotent {
            recorded.insert(key, entry.submission_id);
        }

        let score = UserScore {
            round_number: entry.round_number,
            score_red: entry.score_red,
            score_blue: entry.score_blue,
            submitted_at: Some(OffsetDateTime::now_utc()),
        };
        Box::pin(async move {
            Ok(ScoreSubmissionResult {
                success: true,
                idempotent,
                message: None,
                error: None,
                score: Some(score),
            })
        })
    }

    fn fetch_scorecard(
        &self,
        _bout_id: &str,
    ) -> BoxFuture<'static, Result<CachedScorecard, BackendError>> {
        Box::pin(async move { Err(BackendError::Timeout) })
    }

    fn update_round_state(
        &self,
        _bout_id: &str,
        _action: RoundAction,
        _round_number: Option<u32>,
    ) -> BoxFuture<'static, Result<RoundStateUpdate, BackendError>> {
        Box::pin(async move { Err(BackendError::Timeout) })
    }

    fn list_live_fights(&self) -> BoxFuture<'static, Result<Vec<LiveFightSummary>, BackendError>> {
        Box::pin(async move { Ok(Vec::new()) })
    }
}

fn scratch_path() -> PathBuf {
    std::env::temp_dir()
        .join("ringside-sync-tests")
        .join(format!("{}.json", Uuid::new_v4()))
}

fn request(bout_id: &str, round_number: u32, score_red: u8, score_blue: u8) -> SubmitRequest {
    SubmitRequest {
        bout_id: bout_id.to_string(),
        round_number,
        score_red,
        score_blue,
        submission_id: None,
    }
}

fn dispatcher(
    backend: Arc<RecordingBackend>,
    store: Arc<FilePendingStore>,
    connectivity: &Arc<ConnectivityMonitor>,
) -> SubmissionDispatcher {
    let watcher = connectivity.clone();
    SubmissionDispatcher::new(
        backend,
        store,
        Arc::new(ScorecardCache::new(16)),
        move || watcher.is_online(),
        &SyncConfig::default(),
    )
}

#[tokio::test]
async fn repeated_delivery_under_one_submission_id_records_one_score() {
    let backend = RecordingBackend::with_outages([]);
    let store = Arc::new(FilePendingStore::new(scratch_path()));
    let connectivity = Arc::new(ConnectivityMonitor::new(true));
    let dispatcher = dispatcher(backend.clone(), store, &connectivity);

    let first = dispatcher
        .submit(request("b1", 2, 10, 9))
        .await
        .unwrap();
    assert!(first.success);
    assert!(!first.idempotent);
    let recorded = first.score.unwrap();
    assert_eq!(
        (recorded.round_number, recorded.score_red, recorded.score_blue),
        (2, 10, 9)
    );

    // Same logical submission delivered again under the same token.
    let mut replay = request("b1", 2, 10, 9);
    replay.submission_id = backend
        .recorded
        .lock()
        .unwrap()
        .get(&("b1".to_string(), 2))
        .copied();
    let second = dispatcher.submit(replay).await.unwrap();
    assert!(second.success);
    assert!(second.idempotent);
    assert_eq!(backend.recorded_count(), 1);
}

#[tokio::test]
async fn offline_queue_survives_restart_and_drains_on_reconnect() {
    let backend = RecordingBackend::with_outages([]);
    let path = scratch_path();
    let connectivity = Arc::new(ConnectivityMonitor::new(false));

    // Offline: instant optimistic result, entry durably queued.
    {
        let store = Arc::new(FilePendingStore::new(&path));
        let offline = dispatcher(backend.clone(), store.clone(), &connectivity);
        let result = offline.submit(request("b1", 3, 8, 10)).await.unwrap();
        assert!(result.success);
        assert!(result.message.unwrap().contains("offline"));
        assert_eq!(store.list_all().await.unwrap().len(), 1);
        assert_eq!(backend.recorded_count(), 0);
    }

    // "Restart": a fresh store over the same file still sees the entry.
    let store = Arc::new(FilePendingStore::new(&path));
    assert_eq!(store.list_all().await.unwrap().len(), 1);

    connectivity.set_online(true);
    let online = dispatcher(backend.clone(), store.clone(), &connectivity);
    let report = online.sync_pending().await;

    assert_eq!(report, SyncReport { synced: 1, failed: 0 });
    assert!(store.list_all().await.unwrap().is_empty());
    assert_eq!(backend.recorded_count(), 1);
    tokio::fs::remove_file(&path).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn resync_retries_transient_outages_with_the_same_token() {
    // Two transient failures, then the backend recovers.
    let backend =
        RecordingBackend::with_outages([BackendError::Timeout, BackendError::Timeout]);
    let path = scratch_path();
    let connectivity = Arc::new(ConnectivityMonitor::new(false));

    let store = Arc::new(FilePendingStore::new(&path));
    let offline = dispatcher(backend.clone(), store.clone(), &connectivity);
    offline.submit(request("b1", 1, 10, 9)).await.unwrap();
    let queued = store.list_all().await.unwrap();
    let token = queued[0].submission_id;

    connectivity.set_online(true);
    let report = offline.sync_pending().await;

    assert_eq!(report, SyncReport { synced: 1, failed: 0 });
    assert_eq!(
        backend
            .recorded
            .lock()
            .unwrap()
            .get(&("b1".to_string(), 1)),
        Some(&token)
    );
    assert!(store.list_all().await.unwrap().is_empty());
    tokio::fs::remove_file(&path).await.unwrap();
}
