//! # Property Tests
//!
//! Invariants that must hold for every input, checked with proptest:
//!
//! - Revisions only move forward, by one per recorded action
//! - Puzzle scoring is pure and stays in [0, 1]
//! - A solved puzzle stays solved under repeated winning submissions
//! - Collected value never exceeds the vault total
//! - An empty telemetry batch leaves a guard unchanged
//! - An undertrained guard always patrols with confidence 0.5

#[cfg(test)]
mod tests {
    use heist_types::{
        ActionKind, ActionOutcome, ActionRecord, GuardId, PlayerId, PlayerPosition, Position,
        Role, SessionId,
    };
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use vh_02_puzzle_engine::{GateOp, Puzzle, PuzzleEngine, PuzzleKind, StateVector};
    use vh_03_guard_behavior::{
        ActionSource, Guard, GuardBehaviorEngine, GuardConfig, PATROL_CONFIDENCE,
    };
    use vh_04_session_coordinator::domain::Rules;
    use vh_04_session_coordinator::{
        CoordinatorConfig, InteractTarget, PlayerAction, Session, SessionBlueprint,
    };

    // =========================================================================
    // STRATEGIES
    // =========================================================================

    fn gate_op() -> impl Strategy<Value = GateOp> {
        prop_oneof![
            (0u8..5).prop_map(|qubit| GateOp::Hadamard { qubit }),
            (0u8..5).prop_map(|qubit| GateOp::PauliX { qubit }),
            (0u8..5).prop_map(|qubit| GateOp::PauliZ { qubit }),
            (0u8..5, -3.2f64..3.2).prop_map(|(qubit, theta)| GateOp::Phase { qubit, theta }),
            (0u8..5, 0u8..5).prop_map(|(control, target)| GateOp::Cnot { control, target }),
        ]
    }

    /// Player intent, resolved against the session when applied
    #[derive(Clone, Debug)]
    enum Intent {
        GoToTreasure(usize),
        Grab(usize),
        Wander(f64, f64),
        Scan,
        Hack(usize, Vec<GateOp>),
    }

    fn intent() -> impl Strategy<Value = Intent> {
        prop_oneof![
            (0usize..20).prop_map(Intent::GoToTreasure),
            (0usize..20).prop_map(Intent::Grab),
            (-5.0f64..60.0, -5.0f64..60.0).prop_map(|(x, y)| Intent::Wander(x, y)),
            Just(Intent::Scan),
            (0usize..8, prop::collection::vec(gate_op(), 0..4))
                .prop_map(|(puzzle, ops)| Intent::Hack(puzzle, ops)),
        ]
    }

    fn active_session(seed: u64, difficulty: u8) -> (Session, Instant) {
        let config = CoordinatorConfig::default();
        let blueprint = SessionBlueprint::generate(seed, difficulty, &config).unwrap();
        let now = Instant::now();
        let mut session = Session::new(SessionId::new(), blueprint, Arc::new(config), now);
        session.activate(now).unwrap();
        (session, now)
    }

    fn record(x: f64, y: f64, elapsed_ms: u64, success: bool) -> ActionRecord {
        ActionRecord {
            player_id: PlayerId::new(),
            kind: ActionKind::Move,
            payload: String::new(),
            timestamp_ms: elapsed_ms,
            elapsed_ms,
            position: Position::new(x, y),
            outcome: ActionOutcome::from_success(success),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        // =====================================================================
        // SESSION RULES
        // =====================================================================

        #[test]
        fn prop_revision_and_loot_bounds(
            seed in any::<u64>(),
            difficulty in 1u8..=10,
            intents in prop::collection::vec((any::<bool>(), intent()), 1..60),
        ) {
            let (mut session, start) = active_session(seed, difficulty);
            let puzzles = PuzzleEngine::new();
            let guards = GuardBehaviorEngine::new();
            let rules = Rules { puzzles: &puzzles, guards: &guards };

            let hacker = session.join(Role::Hacker, start).unwrap();
            let infiltrator = session.join(Role::Infiltrator, start).unwrap();
            let treasures = session.vault().treasures().to_vec();
            let puzzle_ids: Vec<_> = session.puzzles().iter().map(|p| p.id).collect();
            let total = session.vault().total_value();

            for (step, (as_hacker, intent)) in intents.into_iter().enumerate() {
                let player = if as_hacker { hacker } else { infiltrator };
                let action = match intent {
                    Intent::GoToTreasure(i) => PlayerAction::Move {
                        to: treasures[i % treasures.len()].position,
                    },
                    Intent::Grab(i) => PlayerAction::Interact {
                        target: InteractTarget::Treasure {
                            treasure_id: treasures[i % treasures.len()].id,
                        },
                    },
                    Intent::Wander(x, y) => PlayerAction::Move { to: Position::new(x, y) },
                    Intent::Scan => PlayerAction::Scan,
                    Intent::Hack(i, operations) => PlayerAction::Hack {
                        puzzle_id: puzzle_ids[i % puzzle_ids.len()],
                        operations,
                    },
                };

                let before = session.revision();
                let now = start + Duration::from_millis(step as u64 * 10);
                let Ok(applied) = session.apply_action(&player, action, rules, now) else {
                    // Completed sessions refuse further actions
                    prop_assert!(session.state().is_terminal());
                    break;
                };

                let expected = if applied.is_recorded() { before + 1 } else { before };
                prop_assert_eq!(session.revision(), expected);
                prop_assert_eq!(applied.result.revision, expected);
                prop_assert!(session.vault().collected_value() <= total);
                prop_assert_eq!(
                    session.vault().collected_value() + session.vault().remaining_value(),
                    total
                );
            }
        }

        #[test]
        fn prop_solved_puzzle_stays_solved(repeats in 1usize..12, extra in 0u8..3) {
            let config = CoordinatorConfig::default();
            let mut blueprint = SessionBlueprint::generate(5, 2, &config).unwrap();
            let puzzle = Puzzle::custom(
                PuzzleKind::Encryption,
                2,
                StateVector::basis(1, 0),
                StateVector::basis(1, 1),
                0.85,
            );
            blueprint.puzzles.push(puzzle.clone());
            let now = Instant::now();
            let mut session = Session::new(SessionId::new(), blueprint, Arc::new(config), now);
            session.activate(now).unwrap();
            let hacker = session.join(Role::Hacker, now).unwrap();

            let puzzles = PuzzleEngine::new();
            let guards = GuardBehaviorEngine::new();
            let rules = Rules { puzzles: &puzzles, guards: &guards };
            // X followed by an even number of Z gates keeps |1⟩ up to phase
            let mut winning = vec![GateOp::PauliX { qubit: 0 }];
            for _ in 0..extra * 2 {
                winning.push(GateOp::PauliZ { qubit: 0 });
            }
            let hack = PlayerAction::Hack { puzzle_id: puzzle.id, operations: winning };

            let first = session.apply_action(&hacker, hack.clone(), rules, now).unwrap();
            prop_assert!(first.result.success);
            let solved_at = session.revision();

            for _ in 0..repeats {
                let again = session.apply_action(&hacker, hack.clone(), rules, now).unwrap();
                prop_assert!(again.result.success);
                prop_assert!(!again.is_recorded());
                let current = session.puzzles().iter().find(|p| p.id == puzzle.id).unwrap();
                prop_assert!(current.is_solved());
                prop_assert_eq!(current.solved_by(), Some(hacker));
                prop_assert_eq!(session.revision(), solved_at);
            }
        }

        // =====================================================================
        // PUZZLE ENGINE
        // =====================================================================

        #[test]
        fn prop_score_is_pure_and_bounded(
            seed in any::<u64>(),
            difficulty in 1u8..=10,
            ops in prop::collection::vec(gate_op(), 0..10),
        ) {
            let blueprint =
                SessionBlueprint::generate(seed, difficulty, &CoordinatorConfig::default()).unwrap();
            let engine = PuzzleEngine::new();
            for puzzle in &blueprint.puzzles {
                let first = engine.score(puzzle, &ops);
                let second = engine.score(puzzle, &ops);
                prop_assert_eq!(&first, &second);
                if let Ok(fidelity) = first {
                    prop_assert!((0.0..=1.0).contains(&fidelity), "fidelity {}", fidelity);
                }
            }
        }

        // =====================================================================
        // GUARD BEHAVIOR ENGINE
        // =====================================================================

        #[test]
        fn prop_empty_batch_is_noop(
            difficulty in 1u8..=10,
            arena in 10u32..=50,
            index in 0usize..8,
            warmup in prop::collection::vec((0.0f64..50.0, 0.0f64..50.0, any::<bool>()), 0..20),
        ) {
            let engine = GuardBehaviorEngine::new();
            let mut guard =
                Guard::new(GuardId::new(), difficulty, arena, index, engine.config()).unwrap();
            let batch: Vec<ActionRecord> = warmup
                .iter()
                .enumerate()
                .map(|(i, (x, y, ok))| record(*x, *y, i as u64 * 100, *ok))
                .collect();
            engine.update(&mut guard, &batch);

            let before = guard.clone();
            engine.update(&mut guard, &[]);
            prop_assert_eq!(guard, before);
        }

        #[test]
        fn prop_undertrained_guard_patrols(
            difficulty in 1u8..=10,
            arena in 10u32..=50,
            index in 0usize..8,
            samples in prop::collection::vec((0.0f64..50.0, 0.0f64..50.0, any::<bool>()), 0..8),
            players in prop::collection::vec((0.0f64..50.0, 0.0f64..50.0, any::<bool>()), 0..4),
        ) {
            let config = GuardConfig::default();
            prop_assume!((samples.len() as u64) < config.min_samples);
            let engine = GuardBehaviorEngine::with_config(config);
            let mut guard =
                Guard::new(GuardId::new(), difficulty, arena, index, engine.config()).unwrap();
            let batch: Vec<ActionRecord> = samples
                .iter()
                .enumerate()
                .map(|(i, (x, y, ok))| record(*x, *y, i as u64 * 100, *ok))
                .collect();
            engine.update(&mut guard, &batch);

            let players: Vec<PlayerPosition> = players
                .iter()
                .map(|(x, y, connected)| PlayerPosition {
                    player_id: PlayerId::new(),
                    position: Position::new(*x, *y),
                    connected: *connected,
                })
                .collect();
            let action = engine.predict_action(&guard, &players);
            prop_assert_eq!(action.source, ActionSource::Patrol);
            prop_assert_eq!(action.confidence, PATROL_CONFIDENCE);
            prop_assert_eq!(action.target, guard.patrol.current_target());
            prop_assert!(action.tracking.is_none());
        }
    }
}
