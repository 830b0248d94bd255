use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Idempotency token identifying one logical submission across every retry.
/// Never regenerated while the submission is in flight.
pub type SubmissionId = Uuid;

/// A score submission not yet confirmed by the backend.
///
/// Created before any network attempt and destroyed only after a confirmed
/// (success or idempotent) server response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSubmission {
    /// Idempotency token reused across all delivery attempts.
    pub submission_id: SubmissionId,
    /// Bout the score belongs to.
    pub bout_id: String,
    /// Round the score applies to.
    pub round_number: u32,
    /// Points awarded to the red corner.
    pub score_red: u8,
    /// Points awarded to the blue corner.
    pub score_blue: u8,
    /// When the submission was first queued locally.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Delivery attempts performed so far.
    pub retry_count: u32,
}

impl PendingSubmission {
    /// Build a fresh queue entry for a score entered just now.
    pub fn new(
        submission_id: SubmissionId,
        bout_id: String,
        round_number: u32,
        score_red: u8,
        score_blue: u8,
    ) -> Self {
        Self {
            submission_id,
            bout_id,
            round_number,
            score_red,
            score_blue,
            created_at: OffsetDateTime::now_utc(),
            retry_count: 0,
        }
    }
}
