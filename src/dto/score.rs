use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A score for one round as entered locally by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalScore {
    /// Round the score applies to.
    pub round_number: u32,
    /// Points awarded to the red corner.
    pub score_red: u8,
    /// Points awarded to the blue corner.
    pub score_blue: u8,
}

/// A user's recorded score for one round as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserScore {
    pub round_number: u32,
    pub score_red: u8,
    pub score_blue: u8,
    /// Server-side acceptance time; `None` for optimistic local entries.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub submitted_at: Option<OffsetDateTime>,
}

/// Decoded response of the submit-score call.
///
/// `idempotent` signals the backend already held a score for this
/// (bout, round) pair under the same submission id; that is a success, not an
/// error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmissionResult {
    pub success: bool,
    #[serde(default)]
    pub idempotent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Machine-readable rejection code when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<UserScore>,
}
