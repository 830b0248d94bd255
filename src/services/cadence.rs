use std::time::Duration;

use crate::{config::CadenceConfig, dto::phase::RoundPhase};

/// Refresh cadence for a screen that is visible but has not received a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Poll at the given interval.
    Every(Duration),
    /// Do not poll; rely solely on push notifications.
    Disabled,
}

impl Cadence {
    /// The polling interval, or `None` when polling is disabled.
    pub fn interval(self) -> Option<Duration> {
        match self {
            Cadence::Every(interval) => Some(interval),
            Cadence::Disabled => None,
        }
    }

    /// The more urgent (shorter) of two cadences. `Disabled` never wins over
    /// an active interval.
    fn min(self, other: Cadence) -> Cadence {
        match (self, other) {
            (Cadence::Every(a), Cadence::Every(b)) => Cadence::Every(a.min(b)),
            (Cadence::Every(a), Cadence::Disabled) => Cadence::Every(a),
            (Cadence::Disabled, other) => other,
        }
    }
}

/// Pure mapping from round phase to a fallback polling interval, ordered by
/// urgency: the scoring window polls fastest, a live round moderately, the
/// pre-fight lull slowly, and closed/ended phases not at all.
#[derive(Debug, Clone)]
pub struct PollingCadence {
    config: CadenceConfig,
}

impl PollingCadence {
    /// Build the mapping from the (tunable) interval configuration.
    pub fn new(config: CadenceConfig) -> Self {
        Self { config }
    }

    /// Fallback refresh cadence for a single bout in the given phase.
    pub fn interval_for(&self, phase: RoundPhase) -> Cadence {
        match phase {
            RoundPhase::RoundBreak => Cadence::Every(self.config.round_break),
            RoundPhase::RoundLive => Cadence::Every(self.config.round_live),
            RoundPhase::PreFight => Cadence::Every(self.config.pre_fight),
            RoundPhase::RoundClosed | RoundPhase::FightEnded => Cadence::Disabled,
            RoundPhase::Unknown => Cadence::Every(self.config.fallback),
        }
    }

    /// Cadence for a combined view over several simultaneous bouts: the most
    /// frequent interval among active phases, or disabled when every phase
    /// individually disables polling.
    pub fn interval_for_many(&self, phases: impl IntoIterator<Item = RoundPhase>) -> Cadence {
        phases
            .into_iter()
            .map(|phase| self.interval_for(phase))
            .fold(Cadence::Disabled, Cadence::min)
    }
}

impl Default for PollingCadence {
    fn default() -> Self {
        Self::new(CadenceConfig::default())
    }
}
