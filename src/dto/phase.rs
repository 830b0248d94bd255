use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Lifecycle phase of a bout. Authored exclusively by the backend; the client
/// only reflects and reacts to the values it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Bout has not started yet.
    PreFight,
    /// A round is currently being fought.
    RoundLive,
    /// Between rounds; the contested scoring window is open.
    RoundBreak,
    /// The previous round's scoring window has closed.
    RoundClosed,
    /// The bout is over.
    FightEnded,
    /// Phase value this client version does not know about.
    #[serde(other)]
    Unknown,
}

/// Authoritative per-bout round state, mutated only by backend refresh/push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    /// Round currently being fought or scored (1-based).
    pub current_round: u32,
    /// Current lifecycle phase of the bout.
    pub phase: RoundPhase,
    /// Number of rounds scheduled for this bout.
    pub scheduled_rounds: u32,
    /// When the current round started, if it has.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub round_started_at: Option<OffsetDateTime>,
    /// When the current round is scheduled to end, if known.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub round_ends_at: Option<OffsetDateTime>,
    /// Seconds after round end during which submissions are still accepted.
    pub scoring_grace_seconds: u32,
    /// Whether the backend currently accepts scores for `current_round`.
    pub is_scoring_open: bool,
}
