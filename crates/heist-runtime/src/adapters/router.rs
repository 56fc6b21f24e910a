//! # Keyword Command Router
//!
//! Offline stand-in for a language-model router. Matches the first keyword
//! in a line and resolves references ("the treasure", "the puzzle") against
//! the player's `CommandContext`.
//!
//! | Keywords | Verb | Resolution |
//! |----------|------|------------|
//! | move, go, walk | move | two numbers, or a compass direction and optional step |
//! | scan, look, survey | scan | none |
//! | hack, decrypt | hack | first open encryption puzzle, gate tokens like `x:0` |
//! | grab, take, collect, loot, steal | interact | nearest uncollected treasure |
//! | entangle, teleport, solve | interact | first open teleportation/entanglement puzzle |

use async_trait::async_trait;
use heist_types::ActionKind;
use tracing::debug;
use vh_02_puzzle_engine::PuzzleKind;
use vh_04_session_coordinator::{CommandContext, CommandRouter, RoutedCommand, RouterError};

/// Default step for compass moves
const DEFAULT_STEP: f64 = 1.0;

#[derive(Clone, Debug, Default)]
pub struct KeywordCommandRouter;

impl KeywordCommandRouter {
    pub fn new() -> Self {
        Self
    }

    /// Interpret one line. Never fails; unknown text routes as unrecognized.
    pub fn interpret(&self, text: &str, context: &CommandContext) -> RoutedCommand {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|w| !w.is_empty())
            .collect();

        for word in &words {
            let routed = match *word {
                "move" | "go" | "walk" => route_move(&words, context),
                "scan" | "look" | "survey" => Some(RoutedCommand::verb(ActionKind::Scan)),
                "hack" | "decrypt" => route_puzzle(
                    ActionKind::Hack,
                    &[PuzzleKind::Encryption],
                    &words,
                    context,
                ),
                "grab" | "take" | "collect" | "loot" | "steal" => {
                    context.nearest_treasure().map(|t| {
                        RoutedCommand::verb(ActionKind::Interact)
                            .arg("treasure", t.treasure_id.to_string())
                    })
                }
                "entangle" => route_puzzle(
                    ActionKind::Interact,
                    &[PuzzleKind::Entanglement, PuzzleKind::Teleportation],
                    &words,
                    context,
                ),
                "teleport" | "solve" => route_puzzle(
                    ActionKind::Interact,
                    &[PuzzleKind::Teleportation, PuzzleKind::Entanglement],
                    &words,
                    context,
                ),
                _ => continue,
            };
            return routed.unwrap_or_else(RoutedCommand::unrecognized);
        }
        RoutedCommand::unrecognized()
    }
}

fn route_move(words: &[&str], context: &CommandContext) -> Option<RoutedCommand> {
    let numbers: Vec<f64> = words.iter().filter_map(|w| w.parse().ok()).collect();
    let (x, y) = match numbers.as_slice() {
        [x, y, ..] => (*x, *y),
        rest => {
            let step = rest.first().copied().unwrap_or(DEFAULT_STEP);
            let (dx, dy) = words.iter().find_map(|w| compass(w))?;
            (
                context.position.x + dx * step,
                context.position.y + dy * step,
            )
        }
    };
    Some(
        RoutedCommand::verb(ActionKind::Move)
            .arg("x", x.to_string())
            .arg("y", y.to_string()),
    )
}

fn compass(word: &str) -> Option<(f64, f64)> {
    match word {
        "north" | "up" => Some((0.0, 1.0)),
        "south" | "down" => Some((0.0, -1.0)),
        "east" | "right" => Some((1.0, 0.0)),
        "west" | "left" => Some((-1.0, 0.0)),
        _ => None,
    }
}

fn route_puzzle(
    verb: ActionKind,
    kinds: &[PuzzleKind],
    words: &[&str],
    context: &CommandContext,
) -> Option<RoutedCommand> {
    let puzzle = context.open_puzzle(kinds)?;
    let ops: Vec<&str> = words.iter().copied().filter(|w| w.contains(':')).collect();
    Some(
        RoutedCommand::verb(verb)
            .arg("puzzle", puzzle.puzzle_id.to_string())
            .arg("ops", ops.join(" ")),
    )
}

#[async_trait]
impl CommandRouter for KeywordCommandRouter {
    async fn route(
        &self,
        text: &str,
        context: &CommandContext,
    ) -> Result<RoutedCommand, RouterError> {
        let routed = self.interpret(text, context);
        debug!(
            session_id = %context.session_id,
            player_id = %context.player_id,
            text,
            verb = ?routed.verb,
            "Command routed"
        );
        Ok(routed)
    }
}
