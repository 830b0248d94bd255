//! Boundary contracts for the scoring backend. Implementation details —
//! aggregation, persistence, round-phase authority — live server-side; this
//! crate only invokes the calls and decodes their results.

/// Push change-feed transport.
pub mod feed;
/// HTTP implementation of the score backend.
pub mod http;

use futures::{future::BoxFuture, stream::BoxStream};

use crate::{
    dao::models::PendingSubmission,
    dto::{
        admin::{LiveFightSummary, RoundAction, RoundStateUpdate},
        push::ChangeEvent,
        score::ScoreSubmissionResult,
        scorecard::CachedScorecard,
    },
    error::{BackendError, FeedError},
};

/// Remote operations of the scoring backend.
pub trait ScoreBackend: Send + Sync {
    /// Submit one round score. Repeated deliveries under the same submission
    /// id are deduplicated server-side.
    fn submit_score(
        &self,
        entry: &PendingSubmission,
    ) -> BoxFuture<'static, Result<ScoreSubmissionResult, BackendError>>;

    /// Fetch the authoritative scorecard read model for a bout.
    fn fetch_scorecard(
        &self,
        bout_id: &str,
    ) -> BoxFuture<'static, Result<CachedScorecard, BackendError>>;

    /// Request a round-state action. Which action is legal in which phase is
    /// decided entirely by the backend.
    fn update_round_state(
        &self,
        bout_id: &str,
        action: RoundAction,
        round_number: Option<u32>,
    ) -> BoxFuture<'static, Result<RoundStateUpdate, BackendError>>;

    /// List bouts currently live, with phase and submission counts.
    fn list_live_fights(&self) -> BoxFuture<'static, Result<Vec<LiveFightSummary>, BackendError>>;
}

/// Scope of a push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedTopic {
    /// Changes affecting a single bout.
    Bout(String),
    /// Changes affecting every bout of an event. Not filterable per bout at
    /// the transport level; subscribers filter by membership themselves.
    Event(String),
}

/// Server-pushed change notification source.
pub trait ChangeFeed: Send + Sync {
    /// Open one logical channel for the topic. The stream ends when the
    /// server closes the connection; reopening is the caller's concern.
    fn open(
        &self,
        topic: FeedTopic,
    ) -> BoxFuture<'static, Result<BoxStream<'static, ChangeEvent>, FeedError>>;
}
