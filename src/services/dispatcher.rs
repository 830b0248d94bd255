use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use time::OffsetDateTime;
use tokio::{
    sync::Mutex,
    time::{sleep, timeout},
};
use tracing::{info, warn};

use crate::{
    config::{RetryConfig, SyncConfig},
    dao::{
        models::{PendingSubmission, SubmissionId},
        pending_store::PendingStore,
    },
    dto::score::{ScoreSubmissionResult, UserScore},
    error::{BackendError, RejectReason},
    remote::ScoreBackend,
    services::idempotency,
    state::ScorecardCache,
};

/// Input for a single submit call.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Bout being scored.
    pub bout_id: String,
    /// Round the score applies to.
    pub round_number: u32,
    /// Points for the red corner.
    pub score_red: u8,
    /// Points for the blue corner.
    pub score_blue: u8,
    /// Previously issued idempotency token when this call crosses a retry
    /// boundary; `None` mints a fresh one.
    pub submission_id: Option<SubmissionId>,
}

/// Outcome of one resync pass over the durable queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// Entries confirmed by the backend and removed from the queue.
    pub synced: u32,
    /// Entries that could not be confirmed this pass.
    pub failed: u32,
}

/// What to do with the queued entry after a failed backend call.
enum FailureAction {
    /// Transient; a later attempt can succeed on its own.
    Retry,
    /// Needs user action (re-authentication); keep queued, stop retrying.
    Halt,
    /// A business rejection retrying cannot fix; drop the entry.
    Drop,
    /// The backend already holds this score; treat as success.
    IdempotentSuccess,
}

/// Orchestrates durable-then-network delivery of round scores.
///
/// The durable queue is the one shared mutable resource here; every
/// read-modify-write goes through a single queue-level gate because the
/// backing medium has no partial-update primitive.
pub struct SubmissionDispatcher {
    backend: Arc<dyn ScoreBackend>,
    store: Arc<dyn PendingStore>,
    cache: Arc<ScorecardCache>,
    retry: RetryConfig,
    request_timeout: Duration,
    online: Box<dyn Fn() -> bool + Send + Sync>,
    queue_gate: Mutex<()>,
    sync_gate: Mutex<()>,
    stopped: AtomicBool,
}

impl SubmissionDispatcher {
    /// Wire a dispatcher against its collaborators. `online` is consulted
    /// before every submission attempt; pass a closure over the shared
    /// [`ConnectivityMonitor`](crate::state::ConnectivityMonitor).
    pub fn new(
        backend: Arc<dyn ScoreBackend>,
        store: Arc<dyn PendingStore>,
        cache: Arc<ScorecardCache>,
        online: impl Fn() -> bool + Send + Sync + 'static,
        config: &SyncConfig,
    ) -> Self {
        Self {
            backend,
            store,
            cache,
            retry: config.retry.clone(),
            request_timeout: config.request_timeout,
            online: Box::new(online),
            queue_gate: Mutex::new(()),
            sync_gate: Mutex::new(()),
            stopped: AtomicBool::new(false),
        }
    }

    /// Ask in-flight resync loops to stop at the next iteration boundary.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Submit one round score.
    ///
    /// Offline, the score is queued durably and an optimistic, unconfirmed
    /// result is returned immediately. Online, the entry is persisted before
    /// the network call so a crash between "sent" and "recorded locally"
    /// cannot lose it; a confirmed response removes it again and invalidates
    /// the bout's cached scorecard. On failure the entry stays queued for the
    /// next [`sync_pending`](Self::sync_pending) pass and the error is
    /// propagated so the UI can react instantly.
    pub async fn submit(
        &self,
        request: SubmitRequest,
    ) -> Result<ScoreSubmissionResult, BackendError> {
        let submission_id = idempotency::reuse(request.submission_id);
        let entry = PendingSubmission::new(
            submission_id,
            request.bout_id,
            request.round_number,
            request.score_red,
            request.score_blue,
        );

        if !(self.online)() {
            self.persist(&entry).await;
            info!(
                bout_id = %entry.bout_id,
                round = entry.round_number,
                "offline; queued score for later sync"
            );
            return Ok(offline_result(&entry));
        }

        // Durability before network.
        self.persist(&entry).await;

        match self.attempt(&entry).await {
            Ok(result) => {
                self.forget(entry.submission_id).await;
                self.invalidate(&entry.bout_id);
                Ok(result)
            }
            Err(err) => match failure_action(&err) {
                FailureAction::IdempotentSuccess => {
                    self.forget(entry.submission_id).await;
                    self.invalidate(&entry.bout_id);
                    Ok(idempotent_result(&entry))
                }
                FailureAction::Drop => {
                    warn!(
                        submission_id = %entry.submission_id,
                        error = %err,
                        "submission rejected; dropping queued entry"
                    );
                    self.forget(entry.submission_id).await;
                    Err(err)
                }
                FailureAction::Retry | FailureAction::Halt => {
                    warn!(
                        submission_id = %entry.submission_id,
                        error = %err,
                        "submission attempt failed; entry stays queued"
                    );
                    Err(err)
                }
            },
        }
    }

    /// Retry every queued submission, strictly in insertion order.
    ///
    /// Each entry is attempted up to the configured retry bound with
    /// exponential backoff between attempts, always under its stored
    /// submission id. Entries the backend confirms (or already holds) are
    /// removed and counted as synced; entries that exhaust their retries stay
    /// queued and count as failed. Afterwards the cache is invalidated for
    /// every affected bout.
    pub async fn sync_pending(&self) -> SyncReport {
        let _pass = self.sync_gate.lock().await;

        let entries = {
            let _gate = self.queue_gate.lock().await;
            match self.store.list_all().await {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(error = %err, "cannot read pending queue; skipping resync");
                    return SyncReport::default();
                }
            }
        };
        if entries.is_empty() {
            return SyncReport::default();
        }
        info!(queued = entries.len(), "starting resync pass");

        let mut report = SyncReport::default();
        let mut touched: Vec<String> = Vec::new();

        'entries: for mut entry in entries {
            let mut attempts = 0u32;
            loop {
                if self.stopped.load(Ordering::SeqCst) {
                    warn!("resync stopped; remaining entries stay queued");
                    break 'entries;
                }

                let outcome = self.attempt(&entry).await;
                attempts += 1;

                match outcome {
                    Ok(_) => {
                        self.forget(entry.submission_id).await;
                        report.synced += 1;
                        remember_bout(&mut touched, &entry.bout_id);
                        break;
                    }
                    Err(err) => match failure_action(&err) {
                        FailureAction::IdempotentSuccess => {
                            self.forget(entry.submission_id).await;
                            report.synced += 1;
                            remember_bout(&mut touched, &entry.bout_id);
                            break;
                        }
                        FailureAction::Drop => {
                            warn!(
                                submission_id = %entry.submission_id,
                                error = %err,
                                "queued submission can never succeed; dropping it"
                            );
                            self.forget(entry.submission_id).await;
                            report.failed += 1;
                            break;
                        }
                        FailureAction::Halt => {
                            warn!(
                                submission_id = %entry.submission_id,
                                error = %err,
                                "queued submission needs user action; leaving it queued"
                            );
                            report.failed += 1;
                            break;
                        }
                        FailureAction::Retry => {
                            entry.retry_count += 1;
                            self.record_retry(&entry).await;
                            if attempts >= self.retry.max_retries {
                                warn!(
                                    submission_id = %entry.submission_id,
                                    attempts,
                                    error = %err,
                                    "retries exhausted; entry stays queued"
                                );
                                report.failed += 1;
                                break;
                            }
                            sleep(self.retry.backoff_for(attempts - 1)).await;
                        }
                    },
                }
            }
        }

        for bout_id in &touched {
            self.cache.invalidate_bout(bout_id);
        }
        if report.synced > 0 {
            self.cache.invalidate_all_scorecards();
        }
        info!(synced = report.synced, failed = report.failed, "resync pass finished");
        report
    }

    /// One bounded backend call.
    async fn attempt(
        &self,
        entry: &PendingSubmission,
    ) -> Result<ScoreSubmissionResult, BackendError> {
        match timeout(self.request_timeout, self.backend.submit_score(entry)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(BackendError::Timeout),
        }
    }

    /// Best-effort durable write; a failed write is logged and the in-flight
    /// attempt proceeds regardless.
    async fn persist(&self, entry: &PendingSubmission) {
        let _gate = self.queue_gate.lock().await;
        if let Err(err) = self.store.add(entry.clone()).await {
            warn!(
                submission_id = %entry.submission_id,
                error = %err,
                "failed to persist pending submission"
            );
        }
    }

    async fn record_retry(&self, entry: &PendingSubmission) {
        let _gate = self.queue_gate.lock().await;
        if let Err(err) = self.store.update(entry.clone()).await {
            warn!(
                submission_id = %entry.submission_id,
                error = %err,
                "failed to persist retry count"
            );
        }
    }

    async fn forget(&self, submission_id: SubmissionId) {
        let _gate = self.queue_gate.lock().await;
        if let Err(err) = self.store.remove(submission_id).await {
            warn!(
                %submission_id,
                error = %err,
                "failed to remove confirmed submission from queue"
            );
        }
    }

    fn invalidate(&self, bout_id: &str) {
        self.cache.invalidate_bout(bout_id);
        self.cache.invalidate_all_scorecards();
    }
}

fn failure_action(err: &BackendError) -> FailureAction {
    match err {
        BackendError::Rejected(RejectReason::AlreadySubmitted) => FailureAction::IdempotentSuccess,
        BackendError::Auth | BackendError::Rejected(RejectReason::AuthenticationRequired) => {
            FailureAction::Halt
        }
        BackendError::Rejected(reason) if !reason.is_retryable() => FailureAction::Drop,
        _ => FailureAction::Retry,
    }
}

fn remember_bout(touched: &mut Vec<String>, bout_id: &str) {
    if !touched.iter().any(|known| known == bout_id) {
        touched.push(bout_id.to_string());
    }
}

/// Optimistic result for a score queued while offline. Unconfirmed: callers
/// must not treat it as a backend guarantee.
fn offline_result(entry: &PendingSubmission) -> ScoreSubmissionResult {
    ScoreSubmissionResult {
        success: true,
        idempotent: false,
        message: Some("saved offline, will sync when connected".to_string()),
        error: None,
        score: Some(echo_score(entry)),
    }
}

fn idempotent_result(entry: &PendingSubmission) -> ScoreSubmissionResult {
    ScoreSubmissionResult {
        success: true,
        idempotent: true,
        message: Some("score already recorded".to_string()),
        error: None,
        score: Some(echo_score(entry)),
    }
}

fn echo_score(entry: &PendingSubmission) -> UserScore {
    UserScore {
        round_number: entry.round_number,
        score_red: entry.score_red,
        score_blue: entry.score_blue,
        submitted_at: Some(OffsetDateTime::now_utc()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        collections::VecDeque,
        sync::{Mutex as StdMutex, atomic::AtomicU32},
    };

    use futures::future::BoxFuture;

    use crate::{
        dao::pending_store::MemoryPendingStore,
        dto::{
            admin::{LiveFightSummary, RoundAction, RoundStateUpdate},
            scorecard::CachedScorecard,
        },
        state::Invalidation,
    };

    /// Backend that replays a scripted list of responses and records the
    /// submission id of every call it receives.
    struct ScriptedBackend {
        responses: StdMutex<VecDeque<Result<ScoreSubmissionResult, BackendError>>>,
        calls: StdMutex<Vec<SubmissionId>>,
    }

    impl ScriptedBackend {
        fn new(
            responses: impl IntoIterator<Item = Result<ScoreSubmissionResult, BackendError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                responses: StdMutex::new(responses.into_iter().collect()),
                calls: StdMutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<SubmissionId> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ScoreBackend for ScriptedBackend {
        fn submit_score(
            &self,
            entry: &PendingSubmission,
        ) -> BoxFuture<'static, Result<ScoreSubmissionResult, BackendError>> {
            self.calls.lock().unwrap().push(entry.submission_id);
            let response = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(BackendError::Timeout));
            Box::pin(async move { response })
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

        fn list_live_fights(
            &self,
        ) -> BoxFuture<'static, Result<Vec<LiveFightSummary>, BackendError>> {
            Box::pin(async move { Ok(Vec::new()) })
        }
    }

    /// Backend that fails every call with a transient error.
    struct FlakyBackend {
        calls: AtomicU32,
    }

    impl ScoreBackend for FlakyBackend {
        fn submit_score(
            &self,
            _entry: &PendingSubmission,
        ) -> BoxFuture<'static, Result<ScoreSubmissionResult, BackendError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Err(BackendError::Timeout) })
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

        fn list_live_fights(
            &self,
        ) -> BoxFuture<'static, Result<Vec<LiveFightSummary>, BackendError>> {
            Box::pin(async move { Ok(Vec::new()) })
        }
    }

    fn accepted(round_number: u32) -> ScoreSubmissionResult {
        ScoreSubmissionResult {
            success: true,
            idempotent: false,
            message: None,
            error: None,
            score: Some(UserScore {
                round_number,
                score_red: 10,
                score_blue: 9,
                submitted_at: Some(OffsetDateTime::now_utc()),
            }),
        }
    }

    fn request(round_number: u32) -> SubmitRequest {
        SubmitRequest {
            bout_id: "b1".to_string(),
            round_number,
            score_red: 10,
            score_blue: 9,
            submission_id: None,
        }
    }

    fn dispatcher(
        backend: Arc<dyn ScoreBackend>,
        store: Arc<dyn PendingStore>,
        online: bool,
    ) -> (SubmissionDispatcher, Arc<ScorecardCache>) {
        let cache = Arc::new(ScorecardCache::new(16));
        let dispatcher = SubmissionDispatcher::new(
            backend,
            store,
            cache.clone(),
            move || online,
            &SyncConfig::default(),
        );
        (dispatcher, cache)
    }

    #[tokio::test]
    async fn offline_submit_queues_and_returns_optimistic_result() {
        let backend = ScriptedBackend::new([]);
        let store = Arc::new(MemoryPendingStore::new());
        let (dispatcher, _cache) = dispatcher(backend.clone(), store.clone(), false);

        let result = dispatcher.submit(request(3)).await.unwrap();

        assert!(result.success);
        assert!(result.message.unwrap().contains("offline"));
        assert_eq!(store.list_all().await.unwrap().len(), 1);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn online_success_empties_queue_and_invalidates_bout() {
        let backend = ScriptedBackend::new([Ok(accepted(2))]);
        let store = Arc::new(MemoryPendingStore::new());
        let (dispatcher, cache) = dispatcher(backend.clone(), store.clone(), true);
        let mut invalidations = cache.watch_invalidations();

        let result = dispatcher.submit(request(2)).await.unwrap();

        assert!(result.success);
        assert!(!result.idempotent);
        assert!(store.list_all().await.unwrap().is_empty());
        assert_eq!(
            invalidations.recv().await.unwrap(),
            Invalidation::Bout("b1".to_string())
        );
        assert_eq!(
            invalidations.recv().await.unwrap(),
            Invalidation::AllScorecards
        );
    }

    #[tokio::test]
    async fn stored_submission_id_is_reused_not_reissued() {
        let backend = ScriptedBackend::new([Ok(accepted(2))]);
        let store = Arc::new(MemoryPendingStore::new());
        let (dispatcher, _cache) = dispatcher(backend.clone(), store, true);

        let token = idempotency::issue();
        let mut retried = request(2);
        retried.submission_id = Some(token);
        dispatcher.submit(retried).await.unwrap();

        assert_eq!(backend.calls(), vec![token]);
    }

    #[tokio::test]
    async fn already_submitted_becomes_idempotent_success() {
        let backend = ScriptedBackend::new([Err(BackendError::Rejected(
            RejectReason::AlreadySubmitted,
        ))]);
        let store = Arc::new(MemoryPendingStore::new());
        let (dispatcher, _cache) = dispatcher(backend, store.clone(), true);

        let result = dispatcher.submit(request(2)).await.unwrap();

        assert!(result.success);
        assert!(result.idempotent);
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn business_rejection_drops_entry_and_propagates() {
        let backend =
            ScriptedBackend::new([Err(BackendError::Rejected(RejectReason::ScoringClosed))]);
        let store = Arc::new(MemoryPendingStore::new());
        let (dispatcher, _cache) = dispatcher(backend, store.clone(), true);

        let err = dispatcher.submit(request(2)).await.unwrap_err();

        assert!(matches!(
            err,
            BackendError::Rejected(RejectReason::ScoringClosed)
        ));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transient_failure_keeps_entry_queued() {
        let backend = ScriptedBackend::new([Err(BackendError::Timeout)]);
        let store = Arc::new(MemoryPendingStore::new());
        let (dispatcher, _cache) = dispatcher(backend, store.clone(), true);

        dispatcher.submit(request(2)).await.unwrap_err();

        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sync_pending_drains_queue_after_reconnect() {
        let store = Arc::new(MemoryPendingStore::new());

        // Queue while offline.
        let offline_backend = ScriptedBackend::new([]);
        let (offline, _cache) = dispatcher(offline_backend, store.clone(), false);
        offline.submit(request(3)).await.unwrap();
        drop(offline);

        // Reconnect and resync.
        let backend = ScriptedBackend::new([Ok(accepted(3))]);
        let (online, _cache) = dispatcher(backend.clone(), store.clone(), true);
        let report = online.sync_pending().await;

        assert_eq!(report, SyncReport { synced: 1, failed: 0 });
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_bounded_and_entry_stays_queued() {
        let backend = Arc::new(FlakyBackend {
            calls: AtomicU32::new(0),
        });
        let store = Arc::new(MemoryPendingStore::new());
        let entry = PendingSubmission::new(idempotency::issue(), "b1".to_string(), 2, 10, 9);
        store.add(entry.clone()).await.unwrap();
        let (dispatcher, _cache) = dispatcher(backend.clone(), store.clone(), true);

        let report = dispatcher.sync_pending().await;

        assert_eq!(report, SyncReport { synced: 0, failed: 1 });
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
        let queued = store.list_all().await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].retry_count, 3);
        assert_eq!(queued[0].submission_id, entry.submission_id);
    }

    #[tokio::test]
    async fn sync_pending_processes_entries_in_insertion_order() {
        let store = Arc::new(MemoryPendingStore::new());
        let first = PendingSubmission::new(idempotency::issue(), "b1".to_string(), 1, 10, 9);
        let second = PendingSubmission::new(idempotency::issue(), "b2".to_string(), 1, 9, 10);
        store.add(first.clone()).await.unwrap();
        store.add(second.clone()).await.unwrap();

        let backend = ScriptedBackend::new([Ok(accepted(1)), Ok(accepted(1))]);
        let (dispatcher, _cache) = dispatcher(backend.clone(), store.clone(), true);
        let report = dispatcher.sync_pending().await;

        assert_eq!(report, SyncReport { synced: 2, failed: 0 });
        assert_eq!(
            backend.calls(),
            vec![first.submission_id, second.submission_id]
        );
    }

    #[tokio::test]
    async fn auth_failure_leaves_entry_queued_without_retrying() {
        let store = Arc::new(MemoryPendingStore::new());
        let entry = PendingSubmission::new(idempotency::issue(), "b1".to_string(), 2, 10, 9);
        store.add(entry).await.unwrap();

        let backend = ScriptedBackend::new([Err(BackendError::Auth)]);
        let (dispatcher, _cache) = dispatcher(backend.clone(), store.clone(), true);
        let report = dispatcher.sync_pending().await;

        assert_eq!(report, SyncReport { synced: 0, failed: 1 });
        assert_eq!(backend.calls().len(), 1);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }
}
