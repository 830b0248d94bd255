use uuid::Uuid;

use crate::dao::models::SubmissionId;

/// Mint a fresh, globally unique submission identifier.
pub fn issue() -> SubmissionId {
    Uuid::new_v4()
}

/// Resolve the identifier for a submission attempt.
///
/// Callers crossing a retry boundary must pass the previously stored token so
/// the backend can deduplicate; a fresh token is minted only for a brand-new
/// logical submission.
pub fn reuse(existing: Option<SubmissionId>) -> SubmissionId {
    existing.unwrap_or_else(issue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_mints_unique_tokens() {
        assert_ne!(issue(), issue());
    }

    #[test]
    fn reuse_returns_the_stored_token() {
        let token = issue();
        assert_eq!(reuse(Some(token)), token);
    }

    #[test]
    fn reuse_without_a_token_mints_one() {
        assert_ne!(reuse(None), reuse(None));
    }
}
