//! # Acceptance Scenarios
//!
//! End-to-end checks through the `SessionApi`, using the coordinator's mock
//! store, router and ledger.
//!
//! | Scenario | Behavior |
//! |----------|----------|
//! | A | Seeded difficulty 3 vault: 6 treasures valued 300 to 3000 |
//! | B | An infiltrator's hack is refused |
//! | C | Fidelity 0.92 against threshold 0.85 solves the puzzle |
//! | D | Everyone gone past the idle timeout abandons the session |

#[cfg(test)]
mod tests {
    use heist_bus::InMemoryEventBus;
    use heist_types::{PlayerId, RetryPolicy, Role, SessionId, SessionState};
    use num_complex::Complex64;
    use std::sync::Arc;
    use std::time::Duration;
    use vh_01_vault_generator::generate;
    use vh_02_puzzle_engine::{GateOp, Puzzle, PuzzleKind, StateVector};
    use vh_04_session_coordinator::ports::outbound::mocks::{
        MockCommandRouter, MockSnapshotStore,
    };
    use vh_04_session_coordinator::{
        CoordinatorConfig, PlayerAction, SessionApi, SessionBlueprint, SessionError,
        SessionManager,
    };
    use vh_05_reward_adjudicator::ports::outbound::mocks::MockLedger;

    // =========================================================================
    // FIXTURES
    // =========================================================================

    fn config() -> CoordinatorConfig {
        CoordinatorConfig {
            retry: RetryPolicy::no_retry(),
            ..CoordinatorConfig::default()
        }
    }

    fn manager(config: CoordinatorConfig) -> SessionManager {
        SessionManager::new(
            config,
            Arc::new(MockSnapshotStore::new()),
            Arc::new(MockLedger::new()),
            Arc::new(MockCommandRouter::default()),
            Arc::new(InMemoryEventBus::new()),
        )
    }

    async fn session_with(
        manager: &SessionManager,
        role: Role,
    ) -> (SessionId, PlayerId) {
        let session = manager.create_session_with_seed(3, 1234).await.unwrap();
        let player = manager.join(session, role).await.unwrap();
        (session, player)
    }

    /// One qubit, |0⟩ toward √0.08|0⟩ + √0.92|1⟩, solved at 0.85
    fn near_flip_puzzle() -> Puzzle {
        let target = StateVector::from_amplitudes(
            1,
            vec![
                Complex64::new(0.08_f64.sqrt(), 0.0),
                Complex64::new(0.92_f64.sqrt(), 0.0),
            ],
        )
        .unwrap();
        Puzzle::custom(
            PuzzleKind::Encryption,
            3,
            StateVector::basis(1, 0),
            target,
            0.85,
        )
    }

    // =========================================================================
    // SCENARIO A: SEEDED VAULT
    // =========================================================================

    #[test]
    fn test_scenario_a_seeded_vault() {
        const SEED: u64 = 0x5eed;
        let vault = generate(SEED, 3).unwrap();
        assert_eq!(vault.treasures().len(), 6);
        for treasure in vault.treasures() {
            assert!(
                (300..=3000).contains(&treasure.value),
                "value {} out of range",
                treasure.value
            );
            assert!((1..=3).contains(&treasure.security_level));
        }
        assert_eq!(generate(SEED, 3).unwrap(), vault);
    }

    #[tokio::test]
    async fn test_scenario_a_seeded_sessions_share_a_vault() {
        let manager = manager(config());
        let a = manager.create_session_with_seed(3, 0x5eed).await.unwrap();
        let b = manager.create_session_with_seed(3, 0x5eed).await.unwrap();
        let (a, b) = (
            manager.get_snapshot(a).unwrap(),
            manager.get_snapshot(b).unwrap(),
        );
        assert_eq!(a.treasures.len(), 6);
        assert_eq!(a.treasures, b.treasures);
        assert_eq!(a.total_value, a.treasures.iter().map(|t| t.value).sum::<u64>());
    }

    // =========================================================================
    // SCENARIO B: ROLE GATING
    // =========================================================================

    #[tokio::test]
    async fn test_scenario_b_infiltrator_cannot_hack() {
        let manager = manager(config());
        let (session, infiltrator) = session_with(&manager, Role::Infiltrator).await;
        let view = manager.get_snapshot(session).unwrap();
        let puzzle = view
            .puzzles
            .iter()
            .find(|p| p.kind == PuzzleKind::Encryption)
            .or_else(|| view.puzzles.first())
            .unwrap();

        let result = manager
            .submit_action(
                session,
                infiltrator,
                PlayerAction::Hack {
                    puzzle_id: puzzle.puzzle_id,
                    operations: vec![GateOp::Hadamard { qubit: 0 }],
                },
            )
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.revision, view.revision);
        let after = manager.get_snapshot(session).unwrap();
        assert_eq!(after.revision, view.revision);
        assert!(!after.puzzle(&puzzle.puzzle_id).unwrap().solved);
    }

    // =========================================================================
    // SCENARIO C: THRESHOLD SOLVE
    // =========================================================================

    #[tokio::test]
    async fn test_scenario_c_fidelity_above_threshold_solves() {
        let manager = manager(config());
        let mut blueprint = SessionBlueprint::generate(77, 3, manager.config()).unwrap();
        let puzzle = near_flip_puzzle();
        blueprint.puzzles.push(puzzle.clone());
        let session = manager.create_from_blueprint(blueprint).await.unwrap();
        let hacker = manager.join(session, Role::Hacker).await.unwrap();

        let result = manager
            .submit_action(
                session,
                hacker,
                PlayerAction::Hack {
                    puzzle_id: puzzle.id,
                    operations: vec![GateOp::PauliX { qubit: 0 }],
                },
            )
            .await
            .unwrap();

        assert!(result.success, "{}", result.message);
        let fidelity = result.fidelity.unwrap();
        assert!((fidelity - 0.92).abs() < 1e-9, "fidelity {fidelity}");

        let view = manager.get_snapshot(session).unwrap();
        let solved = view.puzzle(&puzzle.id).unwrap();
        assert!(solved.solved);
        assert_eq!(solved.solved_by, Some(hacker));
    }

    #[tokio::test]
    async fn test_scenario_c_fidelity_below_threshold_stays_open() {
        let manager = manager(config());
        let mut blueprint = SessionBlueprint::generate(77, 3, manager.config()).unwrap();
        let puzzle = near_flip_puzzle();
        blueprint.puzzles.push(puzzle.clone());
        let session = manager.create_from_blueprint(blueprint).await.unwrap();
        let hacker = manager.join(session, Role::Hacker).await.unwrap();

        // Identity leaves |0⟩ at fidelity 0.08
        let result = manager
            .submit_action(
                session,
                hacker,
                PlayerAction::Hack {
                    puzzle_id: puzzle.id,
                    operations: vec![],
                },
            )
            .await
            .unwrap();

        assert!(!result.success);
        assert!((result.fidelity.unwrap() - 0.08).abs() < 1e-9);
        let view = manager.get_snapshot(session).unwrap();
        assert!(!view.puzzle(&puzzle.id).unwrap().solved);
    }

    // =========================================================================
    // SCENARIO D: IDLE ABANDONMENT
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_scenario_d_idle_session_abandoned() {
        let manager = manager(CoordinatorConfig {
            idle_timeout_ms: 1_000,
            ..config()
        });
        let (session, hacker) = session_with(&manager, Role::Hacker).await;
        let strategist = manager.join(session, Role::Strategist).await.unwrap();
        manager.disconnect(session, hacker).await.unwrap();
        manager.disconnect(session, strategist).await.unwrap();
        assert_eq!(
            manager.get_snapshot(session).unwrap().state,
            SessionState::Active
        );

        tokio::time::advance(Duration::from_millis(1_500)).await;
        manager.tick(session).await.unwrap();
        assert_eq!(
            manager.get_snapshot(session).unwrap().state,
            SessionState::Abandoned
        );

        for player in [hacker, strategist] {
            assert!(matches!(
                manager
                    .submit_action(session, player, PlayerAction::Scan)
                    .await,
                Err(SessionError::FatalSessionFailure(_))
            ));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_d_connected_player_keeps_session() {
        let manager = manager(CoordinatorConfig {
            idle_timeout_ms: 1_000,
            heartbeat_timeout_ms: 60_000,
            ..config()
        });
        let (session, hacker) = session_with(&manager, Role::Hacker).await;

        tokio::time::advance(Duration::from_millis(1_500)).await;
        manager.tick(session).await.unwrap();
        assert_eq!(
            manager.get_snapshot(session).unwrap().state,
            SessionState::Active
        );
        let result = manager
            .submit_action(session, hacker, PlayerAction::Scan)
            .await
            .unwrap();
        assert!(result.success);
    }
}
