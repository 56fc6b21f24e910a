//! Action rules
//!
//! ## Flow
//!
//! 1. Session must be `Active`, else `FatalSessionFailure`
//! 2. Player must exist and be connected
//! 3. Role gating and validation (no state change on failure)
//! 4. Apply, record, route telemetry, bump revision
//!
//! Actions that are applied but do not achieve their goal (spotted while
//! grabbing a treasure, fidelity under threshold) are still recorded with a
//! `Failure` outcome and bump the revision.

use super::action::{
    ActionResult, AppliedAction, InteractTarget, PlayerAction, ScanReport, ScannedGuard,
    ScannedTreasure,
};
use super::errors::SessionError;
use super::session::Session;
use heist_types::{
    ActionOutcome, ActionRecord, PlayerId, Position, PuzzleId, Role, TreasureId,
};
use std::time::Instant;
use vh_02_puzzle_engine::{GateOp, PuzzleEngine, PuzzleKind};
use vh_03_guard_behavior::GuardBehaviorEngine;

/// Engines the rules call into
#[derive(Clone, Copy)]
pub struct Rules<'a> {
    pub puzzles: &'a PuzzleEngine,
    pub guards: &'a GuardBehaviorEngine,
}

enum Resolution {
    /// Validation failure
    Rejected(String),
    /// Idempotent repeat of something already done
    Unchanged(String),
    Applied(Step),
}

struct Step {
    position: Position,
    success: bool,
    message: String,
    fidelity: Option<f64>,
    scan: Option<ScanReport>,
    solved: Option<PuzzleKind>,
}

impl Step {
    fn at(position: Position, success: bool, message: impl Into<String>) -> Self {
        Self {
            position,
            success,
            message: message.into(),
            fidelity: None,
            scan: None,
            solved: None,
        }
    }
}

impl Session {
    /// Validate and apply one player action
    ///
    /// Only a non-active session is an `Err`. Everything else is reported in
    /// the `ActionResult`.
    pub fn apply_action(
        &mut self,
        player_id: &PlayerId,
        action: PlayerAction,
        rules: Rules<'_>,
        now: Instant,
    ) -> Result<AppliedAction, SessionError> {
        self.ensure_active()?;

        let (role, position) = match self.players.get(player_id) {
            None => return Ok(self.rejected(format!("unknown player {player_id}"))),
            Some(player) if !player.is_connected() => {
                return Ok(self.rejected("player is disconnected"))
            }
            Some(player) => (player.role(), player.position),
        };

        let kind = action.kind();
        let payload = action.summary();
        let resolution = match action {
            PlayerAction::Move { to } => {
                if to.is_within(self.vault.size) {
                    Resolution::Applied(Step::at(to, true, format!("moved to {to}")))
                } else {
                    Resolution::Rejected(format!("{to} is outside the vault"))
                }
            }
            PlayerAction::Scan => {
                let report = self.scan(position, role, rules.guards);
                let message = format!(
                    "{} guards and {} treasures in range",
                    report.guards.len(),
                    report.treasures.len()
                );
                let mut step = Step::at(position, true, message);
                step.scan = Some(report);
                Resolution::Applied(step)
            }
            PlayerAction::Hack {
                puzzle_id,
                operations,
            } => match role {
                Role::Hacker => self.solve(
                    player_id,
                    &puzzle_id,
                    &operations,
                    &[PuzzleKind::Encryption],
                    rules.puzzles,
                    position,
                ),
                Role::Infiltrator | Role::Strategist | Role::QuantumExpert => {
                    Resolution::Rejected(format!("a {role} cannot hack"))
                }
            },
            PlayerAction::Interact {
                target: InteractTarget::Treasure { treasure_id },
            } => self.take_treasure(player_id, role, position, &treasure_id),
            PlayerAction::Interact {
                target:
                    InteractTarget::Puzzle {
                        puzzle_id,
                        operations,
                    },
            } => match role {
                Role::QuantumExpert => self.solve(
                    player_id,
                    &puzzle_id,
                    &operations,
                    &[PuzzleKind::Teleportation, PuzzleKind::Entanglement],
                    rules.puzzles,
                    position,
                ),
                Role::Hacker | Role::Infiltrator | Role::Strategist => {
                    Resolution::Rejected(format!("a {role} cannot work quantum puzzles"))
                }
            },
        };

        let step = match resolution {
            Resolution::Rejected(message) => return Ok(self.rejected(message)),
            Resolution::Unchanged(message) => {
                return Ok(AppliedAction::unchanged(ActionResult::succeeded(
                    message,
                    self.revision,
                )))
            }
            Resolution::Applied(step) => step,
        };

        let record = ActionRecord {
            player_id: *player_id,
            kind,
            payload,
            timestamp_ms: heist_types::unix_millis(),
            elapsed_ms: self.elapsed_ms(now),
            position: step.position,
            outcome: ActionOutcome::from_success(step.success),
        };
        if let Some(player) = self.players.get_mut(player_id) {
            player.position = step.position;
            player.touch(now);
            player.record(record.clone());
        }
        self.route_telemetry(&record);
        self.last_activity = now;
        self.actions_since_guard_update = self.actions_since_guard_update.saturating_add(1);
        let revision = self.bump();
        self.check_completion();

        let mut result = if step.success {
            ActionResult::succeeded(step.message, revision)
        } else {
            ActionResult::failed(step.message, revision)
        };
        result.fidelity = step.fidelity;
        result.scan = step.scan;

        Ok(AppliedAction {
            result,
            record: Some(record),
            solved: step.solved,
        })
    }

    fn rejected(&self, message: impl Into<String>) -> AppliedAction {
        AppliedAction::unchanged(ActionResult::failed(message, self.revision))
    }

    fn scan(&self, position: Position, role: Role, guards: &GuardBehaviorEngine) -> ScanReport {
        let radius = self.config.scan_radius;
        let players = self.player_positions();
        ScanReport {
            guards: self
                .guards
                .iter()
                .filter(|g| g.position.distance_to(&position) <= radius)
                .map(|g| ScannedGuard {
                    guard_id: g.id,
                    position: g.position,
                    predicted_target: (role == Role::Strategist)
                        .then(|| guards.predict_action(g, &players).target),
                })
                .collect(),
            treasures: self
                .vault
                .treasures()
                .iter()
                .filter(|t| t.position.distance_to(&position) <= radius)
                .map(|t| ScannedTreasure {
                    treasure_id: t.id,
                    position: t.position,
                    value: t.value,
                    security_level: t.security_level,
                })
                .collect(),
        }
    }

    fn take_treasure(
        &mut self,
        player_id: &PlayerId,
        role: Role,
        position: Position,
        treasure_id: &TreasureId,
    ) -> Resolution {
        let treasure = match self.vault.treasure(treasure_id) {
            Some(treasure) => treasure.clone(),
            None => {
                return match self.vault.collected_by(treasure_id) {
                    Some(owner) if &owner == player_id => {
                        Resolution::Unchanged("treasure already collected".into())
                    }
                    Some(_) => Resolution::Rejected("treasure taken by another player".into()),
                    None => Resolution::Rejected(format!("unknown treasure {treasure_id}")),
                };
            }
        };

        if treasure.position.distance_to(&position) > self.config.reach_radius {
            return Resolution::Rejected("treasure out of reach".into());
        }

        let bonus = self.config.security_detection_weight * f64::from(treasure.security_level);
        let factor = match role {
            Role::Infiltrator => self.config.infiltrator_detection_factor,
            Role::Hacker | Role::Strategist | Role::QuantumExpert => 1.0,
        };
        let spotter = self
            .guards
            .iter()
            .find(|g| g.detects(&position, bonus, factor));
        if let Some(guard) = spotter {
            return Resolution::Applied(Step::at(
                position,
                false,
                format!("spotted by guard {}", guard.id),
            ));
        }

        match self.vault.collect(treasure_id, *player_id) {
            Ok(collected) => Resolution::Applied(Step::at(
                position,
                true,
                format!("collected treasure worth {}", collected.treasure.value),
            )),
            Err(e) => Resolution::Rejected(e.to_string()),
        }
    }

    fn solve(
        &mut self,
        player_id: &PlayerId,
        puzzle_id: &PuzzleId,
        operations: &[GateOp],
        kinds: &[PuzzleKind],
        engine: &PuzzleEngine,
        position: Position,
    ) -> Resolution {
        let Some(puzzle) = self.puzzles.iter_mut().find(|p| &p.id == puzzle_id) else {
            return Resolution::Rejected(format!("unknown puzzle {puzzle_id}"));
        };
        if !kinds.contains(&puzzle.kind) {
            return Resolution::Rejected(format!(
                "{} puzzles cannot be solved this way",
                puzzle.kind
            ));
        }
        if puzzle.is_solved() {
            return Resolution::Unchanged("puzzle already solved".into());
        }

        let evaluation = match engine.evaluate(puzzle, operations) {
            Ok(evaluation) => evaluation,
            Err(e) => return Resolution::Rejected(e.to_string()),
        };

        let mut step = if evaluation.passed {
            puzzle.mark_solved(*player_id);
            let mut step = Step::at(position, true, "puzzle solved");
            step.solved = Some(puzzle.kind);
            step
        } else {
            Step::at(
                position,
                false,
                format!(
                    "fidelity {:.3} below threshold {:.3}",
                    evaluation.fidelity, puzzle.threshold
                ),
            )
        };
        step.fidelity = Some(evaluation.fidelity);
        Resolution::Applied(step)
    }
}
