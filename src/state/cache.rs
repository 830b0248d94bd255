use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::dto::scorecard::CachedScorecard;

/// Reason a cache invalidation was broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// The cached scorecard for one bout is stale and was evicted.
    Bout(String),
    /// Any list view aggregating every scorecard is stale.
    AllScorecards,
}

/// Explicit cache store for scorecard read models, passed by reference into
/// the services that need it. Invalidation is a one-way signal: the entry is
/// evicted and an [`Invalidation`] event is broadcast so presentation code
/// can refetch. Installing fresh snapshots is the owner's choice.
pub struct ScorecardCache {
    entries: DashMap<String, CachedScorecard>,
    invalidations: broadcast::Sender<Invalidation>,
}

impl ScorecardCache {
    /// Construct a cache whose invalidation hub buffers up to `capacity`
    /// events per lagging subscriber.
    pub fn new(capacity: usize) -> Self {
        let (invalidations, _receiver) = broadcast::channel(capacity);
        Self {
            entries: DashMap::new(),
            invalidations,
        }
    }

    /// Snapshot of the cached scorecard for a bout, if present.
    pub fn get(&self, bout_id: &str) -> Option<CachedScorecard> {
        self.entries.get(bout_id).map(|entry| entry.value().clone())
    }

    /// Install (or replace) the scorecard snapshot for its bout.
    pub fn install(&self, scorecard: CachedScorecard) {
        self.entries.insert(scorecard.bout.id.clone(), scorecard);
    }

    /// Evict the cached entry for one bout and notify subscribers. Entries
    /// for other bouts are untouched.
    pub fn invalidate_bout(&self, bout_id: &str) {
        self.entries.remove(bout_id);
        let _ = self
            .invalidations
            .send(Invalidation::Bout(bout_id.to_string()));
    }

    /// Mark every all-scorecards list view stale.
    pub fn invalidate_all_scorecards(&self) {
        let _ = self.invalidations.send(Invalidation::AllScorecards);
    }

    /// Register a subscriber that will receive subsequent invalidations.
    pub fn watch_invalidations(&self) -> broadcast::Receiver<Invalidation> {
        self.invalidations.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::{
        phase::{RoundPhase, RoundState},
        scorecard::BoutSummary,
    };

    fn scorecard(bout_id: &str) -> CachedScorecard {
        CachedScorecard {
            bout: BoutSummary {
                id: bout_id.to_string(),
                event_id: "e1".to_string(),
                red_name: "Red".to_string(),
                blue_name: "Blue".to_string(),
                scheduled_rounds: 3,
            },
            round_state: RoundState {
                current_round: 1,
                phase: RoundPhase::RoundLive,
                scheduled_rounds: 3,
                round_started_at: None,
                round_ends_at: None,
                scoring_grace_seconds: 30,
                is_scoring_open: false,
            },
            aggregates: Vec::new(),
            user_scores: Vec::new(),
        }
    }

    #[tokio::test]
    async fn invalidation_evicts_only_the_named_bout() {
        let cache = ScorecardCache::new(8);
        cache.install(scorecard("b1"));
        cache.install(scorecard("b2"));
        let mut events = cache.watch_invalidations();

        cache.invalidate_bout("b1");

        assert!(cache.get("b1").is_none());
        assert!(cache.get("b2").is_some());
        assert_eq!(
            events.recv().await.unwrap(),
            Invalidation::Bout("b1".to_string())
        );
    }

    #[tokio::test]
    async fn all_scorecards_invalidation_keeps_entries() {
        let cache = ScorecardCache::new(8);
        cache.install(scorecard("b1"));
        let mut events = cache.watch_invalidations();

        cache.invalidate_all_scorecards();

        assert!(cache.get("b1").is_some());
        assert_eq!(events.recv().await.unwrap(), Invalidation::AllScorecards);
    }
}
