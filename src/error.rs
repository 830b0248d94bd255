//! Error taxonomies for the sync engine's remote and feed boundaries.

use thiserror::Error;

/// Why the backend refused a score submission.
///
/// Parsed from the machine-readable `error` code of a submit response. The
/// variants mirror the backend's rejection codes one for one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// The scoring window for this round has closed.
    #[error("scoring_closed")]
    ScoringClosed,
    /// Scoring is not available for this bout at all.
    #[error("scoring_not_available")]
    ScoringNotAvailable,
    /// The submitted round is not the round currently open for scoring.
    #[error("wrong_round")]
    WrongRound,
    /// Score values failed server-side validation.
    #[error("invalid_score")]
    InvalidScore,
    /// The post-round grace period elapsed while the submission was in flight.
    #[error("grace_period_expired")]
    GracePeriodExpired,
    /// A score already exists for this (bout, round) under this submission id.
    /// Not an error; callers convert it into an idempotent success.
    #[error("already_submitted")]
    AlreadySubmitted,
    /// The user must re-authenticate before this submission can succeed.
    #[error("authentication_required")]
    AuthenticationRequired,
    /// Rejection code this client version does not know about.
    #[error("unknown rejection: {0}")]
    Unknown(String),
}

impl RejectReason {
    /// Decode a wire rejection code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "scoring_closed" => RejectReason::ScoringClosed,
            "scoring_not_available" => RejectReason::ScoringNotAvailable,
            "wrong_round" => RejectReason::WrongRound,
            "invalid_score" => RejectReason::InvalidScore,
            "grace_period_expired" => RejectReason::GracePeriodExpired,
            "already_submitted" => RejectReason::AlreadySubmitted,
            "authentication_required" => RejectReason::AuthenticationRequired,
            other => RejectReason::Unknown(other.to_string()),
        }
    }

    /// Whether retrying the same submission without user action can succeed.
    ///
    /// Unknown codes are treated conservatively as transient; every known
    /// business rejection is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RejectReason::Unknown(_))
    }
}

/// Error raised by remote score-backend calls.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never produced a usable response.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    /// The request exceeded the configured per-call timeout.
    #[error("request timed out")]
    Timeout,
    /// The backend demands authentication before serving this call.
    #[error("authentication required")]
    Auth,
    /// The backend understood the submission and refused it.
    #[error("submission rejected: {0}")]
    Rejected(RejectReason),
    /// The backend answered with an unexpected HTTP status.
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),
    /// The response body could not be decoded.
    #[error("failed to decode backend response: {0}")]
    Decode(#[source] serde_json::Error),
}

impl BackendError {
    /// Whether a later retry of the same call can succeed without user action.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Network(_) | BackendError::Timeout => true,
            BackendError::Status(status) => status.is_server_error(),
            BackendError::Rejected(reason) => reason.is_retryable(),
            BackendError::Auth | BackendError::Decode(_) => false,
        }
    }
}

/// Error raised when opening a push change feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The feed channel could not be established.
    #[error("failed to open change feed: {0}")]
    Connect(#[source] reqwest::Error),
    /// The feed produced data that violates the expected framing.
    #[error("change feed protocol error: {0}")]
    Protocol(String),
}
