use std::{collections::HashSet, sync::Arc};

use futures::{StreamExt, stream::BoxStream};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{
    dto::push::{AggregateRow, ChangeEvent, ChangeRow, PhaseChange},
    error::FeedError,
    remote::{ChangeFeed, FeedTopic},
    state::ScorecardCache,
};

/// Callback invoked with the decoded phase snapshot of a round-state row.
pub type PhaseCallback = Box<dyn Fn(PhaseChange) + Send + Sync>;
/// Callback invoked with a changed aggregate row.
pub type AggregateCallback = Box<dyn Fn(AggregateRow) + Send + Sync>;

/// Options controlling what a subscription does with incoming events.
pub struct SubscribeOptions {
    /// Invoked on every round-state change. `None` to ignore.
    pub on_phase_change: Option<PhaseCallback>,
    /// Invoked on every aggregate change. `None` to ignore.
    pub on_aggregate_change: Option<AggregateCallback>,
    /// Evict the affected bout's cached scorecard on every delivery.
    /// Defaults to `true`.
    pub auto_invalidate: bool,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            on_phase_change: None,
            on_aggregate_change: None,
            auto_invalidate: true,
        }
    }
}

/// Live push channel bound to the scope that created it.
///
/// Call [`unsubscribe`](Subscription::unsubscribe) when the owning screen is
/// torn down; dropping the subscription tears the channel down too, so the
/// task is never left to leak.
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Stop receiving events. Safe to call more than once.
    pub fn unsubscribe(&self) {
        self.handle.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Listens to server-pushed change events and keeps the scorecard cache
/// honest while screens are visible.
pub struct RealtimeSyncSubscriber {
    feed: Arc<dyn ChangeFeed>,
    cache: Arc<ScorecardCache>,
}

impl RealtimeSyncSubscriber {
    /// Wire the subscriber against its push transport and the injected cache.
    pub fn new(feed: Arc<dyn ChangeFeed>, cache: Arc<ScorecardCache>) -> Self {
        Self { feed, cache }
    }

    /// Open one logical channel for a single bout.
    pub async fn subscribe(
        &self,
        bout_id: &str,
        options: SubscribeOptions,
    ) -> Result<Subscription, FeedError> {
        let stream = self.feed.open(FeedTopic::Bout(bout_id.to_string())).await?;
        Ok(self.spawn(stream, None, options))
    }

    /// Open one channel scoped to a whole event, filtering deliveries by
    /// membership in `bout_ids`. Used when the push stream is not natively
    /// filterable per bout at that granularity.
    pub async fn subscribe_many(
        &self,
        event_id: &str,
        bout_ids: &[String],
        options: SubscribeOptions,
    ) -> Result<Subscription, FeedError> {
        let stream = self
            .feed
            .open(FeedTopic::Event(event_id.to_string()))
            .await?;
        let members: HashSet<String> = bout_ids.iter().cloned().collect();
        Ok(self.spawn(stream, Some(members), options))
    }

    fn spawn(
        &self,
        stream: BoxStream<'static, ChangeEvent>,
        members: Option<HashSet<String>>,
        options: SubscribeOptions,
    ) -> Subscription {
        let cache = self.cache.clone();
        let handle = tokio::spawn(run_channel(stream, cache, members, options));
        Subscription { handle }
    }
}

/// Drain one push channel, dispatching each delivery on its table tag.
/// Deletes carry the affected row too, so they fire the same callbacks and
/// invalidation as inserts and updates.
async fn run_channel(
    mut stream: BoxStream<'static, ChangeEvent>,
    cache: Arc<ScorecardCache>,
    members: Option<HashSet<String>>,
    options: SubscribeOptions,
) {
    while let Some(event) = stream.next().await {
        let bout_id = event.row.bout_id();
        if let Some(members) = &members {
            if !members.contains(bout_id) {
                continue;
            }
        }

        match &event.row {
            ChangeRow::RoundStates(row) => {
                if let Some(callback) = &options.on_phase_change {
                    callback(PhaseChange {
                        phase: row.state.phase,
                        current_round: row.state.current_round,
                    });
                }
            }
            ChangeRow::Aggregates(row) => {
                if let Some(callback) = &options.on_aggregate_change {
                    callback(row.clone());
                }
            }
        }
        if options.auto_invalidate {
            cache.invalidate_bout(bout_id);
        }
    }
    debug!("change feed channel closed");
}
