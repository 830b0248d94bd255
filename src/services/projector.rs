use crate::dto::{
    score::{LocalScore, UserScore},
    scorecard::CachedScorecard,
};

/// Merge a locally pending submission into a cached scorecard snapshot so the
/// user sees their score before the authoritative refetch lands.
///
/// Pure: the input snapshot is never mutated, so the surrounding cache layer
/// can diff old against new. An existing entry for the same round is replaced
/// in place; otherwise the score is appended and `user_scores` re-sorted
/// ascending by round number.
pub fn merge_optimistic(cached: &CachedScorecard, submission: &LocalScore) -> CachedScorecard {
    let mut next = cached.clone();
    let optimistic = UserScore {
        round_number: submission.round_number,
        score_red: submission.score_red,
        score_blue: submission.score_blue,
        submitted_at: None,
    };

    match next
        .user_scores
        .iter_mut()
        .find(|score| score.round_number == submission.round_number)
    {
        Some(slot) => *slot = optimistic,
        None => {
            next.user_scores.push(optimistic);
            next.user_scores.sort_by_key(|score| score.round_number);
        }
    }

    next
}
