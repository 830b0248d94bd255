use serde::{Deserialize, Serialize};

use crate::dto::phase::{RoundPhase, RoundState};

/// Round-state actions an admin client can request. The backend alone decides
/// whether an action is legal in the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundAction {
    /// Open the bout and enter the first round.
    StartFight,
    /// Begin the next round.
    StartRound,
    /// End the round in progress and open the scoring window.
    EndRound,
    /// Close the scoring window for the round that just ended.
    CloseScoring,
    /// Finish the bout.
    EndFight,
}

/// Response of the admin round-state update call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundStateUpdate {
    pub success: bool,
    /// Round state after the action was applied, when it succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RoundState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One entry of the admin live-fights listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveFightSummary {
    pub bout_id: String,
    pub red_name: String,
    pub blue_name: String,
    pub phase: RoundPhase,
    pub current_round: u32,
    /// Total community submissions recorded for this bout so far.
    pub submission_count: u32,
}
