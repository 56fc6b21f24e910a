//! Read views and persisted snapshots

use heist_types::{
    ActionRecord, Difficulty, GuardId, PlayerId, Position, PuzzleId, Role, SessionId,
    SessionState,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;
use vh_01_vault_generator::{CollectedTreasure, Treasure, Vault};
use vh_02_puzzle_engine::{Puzzle, PuzzleKind};
use vh_03_guard_behavior::Guard;

// =============================================================================
// REWARDS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RewardStatus {
    Pending,
    Settled { transaction_ref: String },
    /// Ledger unavailable; the plan is submitted again on a later tick
    Retrying { attempts: u32, reason: String },
    Failed { reason: String },
}

impl RewardStatus {
    /// Settlement not yet finished one way or the other
    pub fn is_outstanding(&self) -> bool {
        matches!(self, RewardStatus::Pending | RewardStatus::Retrying { .. })
    }
}

/// Reward plan attached to a completed session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardReference {
    pub request_id: Uuid,
    pub total: u64,
    pub status: RewardStatus,
}

// =============================================================================
// READ VIEW
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub role: Role,
    pub position: Position,
    pub connected: bool,
    pub actions: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuardView {
    pub guard_id: GuardId,
    pub position: Position,
    pub detection_radius: f64,
    pub samples_seen: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PuzzleView {
    pub puzzle_id: PuzzleId,
    pub kind: PuzzleKind,
    pub qubit_count: u8,
    pub threshold: f64,
    pub solved: bool,
    pub solved_by: Option<PlayerId>,
}

/// Complete, immutable picture of one session revision
///
/// Published after every applied change. Readers never see a partial update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub state: SessionState,
    pub difficulty: Difficulty,
    pub seed: u64,
    pub revision: u64,
    pub vault_size: u32,
    pub players: Vec<PlayerView>,
    pub guards: Vec<GuardView>,
    pub puzzles: Vec<PuzzleView>,
    /// Treasures still in the vault
    pub treasures: Vec<Treasure>,
    pub collected: Vec<CollectedTreasure>,
    pub total_value: u64,
    pub collected_value: u64,
    pub reward: Option<RewardReference>,
}

impl SessionView {
    pub fn player(&self, id: &PlayerId) -> Option<&PlayerView> {
        self.players.iter().find(|p| &p.player_id == id)
    }

    pub fn puzzle(&self, id: &PuzzleId) -> Option<&PuzzleView> {
        self.puzzles.iter().find(|p| &p.puzzle_id == id)
    }

    pub fn connected_players(&self) -> usize {
        self.players.iter().filter(|p| p.connected).count()
    }

    /// Rewards computed but not yet settled or given up on
    pub fn settlement_outstanding(&self) -> bool {
        self.reward
            .as_ref()
            .is_some_and(|reward| reward.status.is_outstanding())
    }
}

// =============================================================================
// PERSISTED SNAPSHOT
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub player_id: PlayerId,
    pub role: Role,
    pub position: Position,
    pub history: Vec<ActionRecord>,
}

/// Schema v1 of the persisted session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotV1 {
    pub session_id: SessionId,
    pub state: SessionState,
    pub difficulty: Difficulty,
    pub seed: u64,
    pub revision: u64,
    /// Milliseconds the session had been active when the snapshot was taken
    pub elapsed_ms: u64,
    pub vault: Vault,
    pub players: Vec<PlayerSnapshot>,
    pub guards: Vec<Guard>,
    /// Per-guard telemetry not yet consumed, parallel to `guards`
    pub telemetry: Vec<VecDeque<ActionRecord>>,
    pub puzzles: Vec<Puzzle>,
    pub reward: Option<RewardReference>,
}

/// Current snapshot schema
pub type LatestSnapshot = SnapshotV1;

/// Persisted session, tagged with its schema version
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema")]
pub enum VersionedSnapshot {
    #[serde(rename = "v1")]
    V1(SnapshotV1),
}

impl VersionedSnapshot {
    /// Migrate to the current schema
    pub fn into_latest(self) -> LatestSnapshot {
        match self {
            VersionedSnapshot::V1(snapshot) => snapshot,
        }
    }

    pub fn session_id(&self) -> SessionId {
        match self {
            VersionedSnapshot::V1(snapshot) => snapshot.session_id,
        }
    }

    pub fn revision(&self) -> u64 {
        match self {
            VersionedSnapshot::V1(snapshot) => snapshot.revision,
        }
    }
}

impl From<LatestSnapshot> for VersionedSnapshot {
    fn from(snapshot: LatestSnapshot) -> Self {
        VersionedSnapshot::V1(snapshot)
    }
}
