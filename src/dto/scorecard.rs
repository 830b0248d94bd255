use serde::{Deserialize, Serialize};

use crate::dto::{phase::RoundState, score::UserScore};

/// Identifying details of a single bout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoutSummary {
    /// Stable identifier for the bout.
    pub id: String,
    /// Identifier of the event (fight card) this bout belongs to.
    pub event_id: String,
    pub red_name: String,
    pub blue_name: String,
    pub scheduled_rounds: u32,
}

/// One named outcome category in a round's score distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBucket {
    /// Bucket label, e.g. `"10-9 red"`.
    pub label: String,
    /// Number of community submissions that fell into this bucket.
    pub count: u32,
}

/// Server-computed summary of all users' submitted scores for one round.
/// Opaque to the client; never recomputed locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundAggregate {
    pub round_number: u32,
    pub submission_count: u32,
    /// Distribution of submissions over score buckets.
    #[serde(default)]
    pub buckets: Vec<ScoreBucket>,
    /// 0–1 measure of agreement among submitted scores.
    pub consensus: f32,
}

/// Read-model snapshot of one bout's scorecard as cached on the client.
///
/// `user_scores` is kept sorted ascending by round number; the optimistic
/// projector preserves that ordering when it inserts unconfirmed entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedScorecard {
    pub bout: BoutSummary,
    pub round_state: RoundState,
    #[serde(default)]
    pub aggregates: Vec<RoundAggregate>,
    #[serde(default)]
    pub user_scores: Vec<UserScore>,
}
