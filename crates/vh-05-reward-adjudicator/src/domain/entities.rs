//! Reward entities

use heist_types::{Difficulty, PlayerId, Role, SessionId, SessionState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recognized accomplishments that change a player's reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    /// Solved an entanglement puzzle.
    QuantumMastery,
}

/// One participant as seen at session end.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerOutcome {
    pub player_id: PlayerId,
    pub role: Role,
    pub achievements: Vec<Achievement>,
}

impl PlayerOutcome {
    pub fn has(&self, achievement: Achievement) -> bool {
        self.achievements.contains(&achievement)
    }
}

/// Everything adjudication needs to know about a finished session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub session_id: SessionId,
    pub state: SessionState,
    pub difficulty: Difficulty,
    pub players: Vec<PlayerOutcome>,
    pub collected_value: u64,
}

/// Amount owed to one player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardLine {
    pub player_id: PlayerId,
    pub amount: u64,
    pub multiplier: f64,
    pub achievements: Vec<Achievement>,
}

/// A settlement request. `request_id` stays fixed across retries so the
/// ledger can deduplicate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardPlan {
    pub request_id: Uuid,
    pub session_id: SessionId,
    pub lines: Vec<RewardLine>,
    pub total: u64,
}

impl RewardPlan {
    pub fn amount_for(&self, player_id: &PlayerId) -> Option<u64> {
        self.lines
            .iter()
            .find(|line| &line.player_id == player_id)
            .map(|line| line.amount)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Accepted,
    /// The ledger had already processed this `request_id`.
    Duplicate,
}

/// Ledger acknowledgement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub transaction_ref: String,
    pub status: SettlementStatus,
}
