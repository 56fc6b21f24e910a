//! Player actions and their results

use heist_types::{ActionKind, ActionRecord, GuardId, Position, PuzzleId, TreasureId};
use serde::{Deserialize, Serialize};
use vh_02_puzzle_engine::{GateOp, PuzzleKind};

/// What a player asks the session to do
///
/// Closed set. Role gating is an exhaustive match over this enum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlayerAction {
    Move { to: Position },
    Scan,
    Hack {
        puzzle_id: PuzzleId,
        operations: Vec<GateOp>,
    },
    Interact { target: InteractTarget },
}

/// Object of an `Interact` action
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum InteractTarget {
    Treasure { treasure_id: TreasureId },
    Puzzle {
        puzzle_id: PuzzleId,
        operations: Vec<GateOp>,
    },
}

impl PlayerAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            PlayerAction::Move { .. } => ActionKind::Move,
            PlayerAction::Scan => ActionKind::Scan,
            PlayerAction::Hack { .. } => ActionKind::Hack,
            PlayerAction::Interact { .. } => ActionKind::Interact,
        }
    }

    /// Short text form stored in the action record
    pub fn summary(&self) -> String {
        let ops = |operations: &[GateOp]| {
            operations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        };
        match self {
            PlayerAction::Move { to } => format!("move {to}"),
            PlayerAction::Scan => "scan".to_string(),
            PlayerAction::Hack {
                puzzle_id,
                operations,
            } => format!("hack {puzzle_id} [{}]", ops(operations)),
            PlayerAction::Interact {
                target: InteractTarget::Treasure { treasure_id },
            } => format!("take {treasure_id}"),
            PlayerAction::Interact {
                target:
                    InteractTarget::Puzzle {
                        puzzle_id,
                        operations,
                    },
            } => format!("solve {puzzle_id} [{}]", ops(operations)),
        }
    }
}

/// A guard as seen by a scan
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScannedGuard {
    pub guard_id: GuardId,
    pub position: Position,
    /// Only filled in for strategists
    pub predicted_target: Option<Position>,
}

/// A treasure as seen by a scan
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScannedTreasure {
    pub treasure_id: TreasureId,
    pub position: Position,
    pub value: u64,
    pub security_level: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub guards: Vec<ScannedGuard>,
    pub treasures: Vec<ScannedTreasure>,
}

/// Answer to `submit_action`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    /// Session revision after the action
    pub revision: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fidelity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<ScanReport>,
}

impl ActionResult {
    pub fn succeeded(message: impl Into<String>, revision: u64) -> Self {
        Self {
            success: true,
            message: message.into(),
            revision,
            fidelity: None,
            scan: None,
        }
    }

    pub fn failed(message: impl Into<String>, revision: u64) -> Self {
        Self {
            success: false,
            ..Self::succeeded(message, revision)
        }
    }

    pub fn with_fidelity(mut self, fidelity: f64) -> Self {
        self.fidelity = Some(fidelity);
        self
    }

    pub fn with_scan(mut self, scan: ScanReport) -> Self {
        self.scan = Some(scan);
        self
    }
}

/// Result of running an action through the session rules
#[derive(Clone, Debug, PartialEq)]
pub struct AppliedAction {
    pub result: ActionResult,
    /// Present when the action changed state and was recorded
    pub record: Option<ActionRecord>,
    /// Kind of the puzzle this action solved
    pub solved: Option<PuzzleKind>,
}

impl AppliedAction {
    /// Rejected or idempotent: nothing recorded, revision unchanged
    pub fn unchanged(result: ActionResult) -> Self {
        Self {
            result,
            record: None,
            solved: None,
        }
    }

    pub fn is_recorded(&self) -> bool {
        self.record.is_some()
    }
}
