use serde::{Deserialize, Serialize};

use crate::dto::{
    phase::{RoundPhase, RoundState},
    scorecard::RoundAggregate,
};

/// Kind of row change carried by a push delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Changed row of a push delivery, tagged by the backend table it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", content = "row", rename_all = "snake_case")]
pub enum ChangeRow {
    /// A bout's round state changed.
    RoundStates(RoundStateRow),
    /// A round aggregate was recomputed.
    Aggregates(AggregateRow),
}

impl ChangeRow {
    /// Bout the changed row belongs to.
    pub fn bout_id(&self) -> &str {
        match self {
            ChangeRow::RoundStates(row) => &row.bout_id,
            ChangeRow::Aggregates(row) => &row.bout_id,
        }
    }
}

/// One server-pushed change delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Whether the row was inserted, updated, or deleted.
    pub kind: ChangeKind,
    /// The changed row itself.
    #[serde(flatten)]
    pub row: ChangeRow,
}

/// Round-state row as delivered on the push feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundStateRow {
    pub bout_id: String,
    /// Full round state after the change.
    #[serde(flatten)]
    pub state: RoundState,
}

/// Aggregate row as delivered on the push feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub bout_id: String,
    /// Recomputed aggregate after the change.
    #[serde(flatten)]
    pub aggregate: RoundAggregate,
}

/// Snapshot handed to phase-change callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    /// New lifecycle phase of the bout.
    pub phase: RoundPhase,
    /// Round the bout is currently in.
    pub current_round: u32,
}
