//! Free-text command routing types
//!
//! The command router turns a line of player text into a verb plus string
//! arguments. This module converts that into a `PlayerAction`.
//!
//! | Verb | Arguments |
//! |------|-----------|
//! | move | `x`, `y` |
//! | scan | none |
//! | hack | `puzzle`, `ops` |
//! | interact | `treasure`, or `puzzle` and `ops` |

use super::action::{InteractTarget, PlayerAction};
use heist_types::{ActionKind, PlayerId, Position, PuzzleId, Role, SessionId, TreasureId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use vh_02_puzzle_engine::{parse_operations, PuzzleKind};

/// What the router made of a line of text
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutedCommand {
    pub success: bool,
    pub verb: Option<ActionKind>,
    pub args: HashMap<String, String>,
}

impl RoutedCommand {
    pub fn unrecognized() -> Self {
        Self::default()
    }

    pub fn verb(verb: ActionKind) -> Self {
        Self {
            success: true,
            verb: Some(verb),
            args: HashMap::new(),
        }
    }

    pub fn arg(mut self, key: &str, value: impl Into<String>) -> Self {
        self.args.insert(key.to_string(), value.into());
        self
    }

    fn required(&self, key: &str) -> Result<&str, CommandError> {
        self.args
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| CommandError::MissingArgument(key.to_string()))
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str) -> Result<T, CommandError> {
        let raw = self.required(key)?;
        raw.parse().map_err(|_| CommandError::InvalidArgument {
            key: key.to_string(),
            value: raw.to_string(),
        })
    }

    fn operations(&self) -> Result<Vec<vh_02_puzzle_engine::GateOp>, CommandError> {
        let raw = self.required("ops")?;
        parse_operations(raw.split_whitespace()).map_err(|e| CommandError::InvalidArgument {
            key: "ops".to_string(),
            value: e.to_string(),
        })
    }
}

/// Why a routed command could not become an action
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("command not understood")]
    Unrecognized,

    #[error("missing argument: {0}")]
    MissingArgument(String),

    #[error("invalid argument {key}: {value}")]
    InvalidArgument { key: String, value: String },
}

impl TryFrom<RoutedCommand> for PlayerAction {
    type Error = CommandError;

    fn try_from(command: RoutedCommand) -> Result<Self, Self::Error> {
        let verb = match (command.success, command.verb) {
            (true, Some(verb)) => verb,
            _ => return Err(CommandError::Unrecognized),
        };
        match verb {
            ActionKind::Move => Ok(PlayerAction::Move {
                to: Position::new(command.parsed("x")?, command.parsed("y")?),
            }),
            ActionKind::Scan => Ok(PlayerAction::Scan),
            ActionKind::Hack => Ok(PlayerAction::Hack {
                puzzle_id: command.parsed("puzzle")?,
                operations: command.operations()?,
            }),
            ActionKind::Interact => {
                if command.args.contains_key("treasure") {
                    Ok(PlayerAction::Interact {
                        target: InteractTarget::Treasure {
                            treasure_id: command.parsed::<TreasureId>("treasure")?,
                        },
                    })
                } else {
                    Ok(PlayerAction::Interact {
                        target: InteractTarget::Puzzle {
                            puzzle_id: command.parsed("puzzle")?,
                            operations: command.operations()?,
                        },
                    })
                }
            }
        }
    }
}

/// A puzzle as the router sees it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PuzzleHint {
    pub puzzle_id: PuzzleId,
    pub kind: PuzzleKind,
    pub solved: bool,
}

/// A treasure as the router sees it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreasureHint {
    pub treasure_id: TreasureId,
    pub position: Position,
}

/// Session context handed to the router so it can resolve references
/// like "the nearest treasure"
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandContext {
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub role: Role,
    pub position: Position,
    pub puzzles: Vec<PuzzleHint>,
    pub treasures: Vec<TreasureHint>,
}

impl CommandContext {
    /// Closest uncollected treasure to the player
    pub fn nearest_treasure(&self) -> Option<&TreasureHint> {
        self.treasures.iter().min_by(|a, b| {
            let da = a.position.distance_to(&self.position);
            let db = b.position.distance_to(&self.position);
            da.total_cmp(&db)
        })
    }

    /// First unsolved puzzle of one of `kinds`
    pub fn open_puzzle(&self, kinds: &[PuzzleKind]) -> Option<&PuzzleHint> {
        self.puzzles
            .iter()
            .find(|p| !p.solved && kinds.contains(&p.kind))
    }
}
