//! # Runtime Flows
//!
//! The coordinator wired to the runtime's adapters instead of mocks:
//!
//! ```text
//! text ──→ [KeywordCommandRouter] ──→ [SessionManager] ──→ [InMemorySnapshotStore]
//!                                          │
//!                                          ├──→ [RewardAdjudicator] ──→ [InMemoryLedger]
//!                                          ↓
//!                                    [Event Bus]
//! ```

#[cfg(test)]
mod tests {
    use heist_bus::{EventFilter, EventTopic, InMemoryEventBus, SessionEvent};
    use heist_runtime::adapters::{InMemoryLedger, InMemorySnapshotStore, KeywordCommandRouter};
    use heist_types::{RetryPolicy, Role, SessionId, SessionState};
    use std::sync::Arc;
    use std::time::Duration;
    use vh_02_puzzle_engine::{Puzzle, PuzzleKind, StateVector};
    use vh_04_session_coordinator::{
        CoordinatorConfig, RewardStatus, SessionApi, SessionBlueprint, SessionError,
        SessionManager, SnapshotStore,
    };

    struct Wiring {
        manager: SessionManager,
        store: Arc<InMemorySnapshotStore>,
        ledger: Arc<InMemoryLedger>,
    }

    fn config() -> CoordinatorConfig {
        CoordinatorConfig {
            retry: RetryPolicy::no_retry(),
            ..CoordinatorConfig::default()
        }
    }

    fn wire(store: Arc<InMemorySnapshotStore>) -> Wiring {
        let ledger = Arc::new(InMemoryLedger::new());
        let manager = SessionManager::new(
            config(),
            store.clone(),
            ledger.clone(),
            Arc::new(KeywordCommandRouter::new()),
            Arc::new(InMemoryEventBus::new()),
        );
        Wiring {
            manager,
            store,
            ledger,
        }
    }

    async fn wait_for_stored(store: &InMemorySnapshotStore, session: SessionId, revision: u64) {
        for _ in 0..200 {
            if let Ok(Some(snapshot)) = store.latest(session).await {
                if snapshot.revision() >= revision {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("revision {revision} never stored");
    }

    #[tokio::test]
    async fn test_text_commands_to_settled_rewards() {
        let w = wire(Arc::new(InMemorySnapshotStore::new()));
        let mut settlements = w
            .manager
            .bus()
            .subscribe(EventFilter::topics(vec![EventTopic::Rewards]));

        let mut blueprint = SessionBlueprint::generate(21, 2, w.manager.config()).unwrap();
        blueprint.guards.clear();
        blueprint.puzzles = vec![Puzzle::custom(
            PuzzleKind::Encryption,
            2,
            StateVector::basis(1, 0),
            StateVector::basis(1, 1),
            0.85,
        )];
        let session = w.manager.create_from_blueprint(blueprint).await.unwrap();
        let hacker = w.manager.join(session, Role::Hacker).await.unwrap();

        let mut treasures = w.manager.get_snapshot(session).unwrap().treasures.clone();
        treasures.sort_by(|a, b| b.value.cmp(&a.value));
        for treasure in treasures {
            let view = w.manager.get_snapshot(session).unwrap();
            if view.collected_value * 2 >= view.total_value {
                break;
            }
            let text = format!("move to {} {}", treasure.position.x, treasure.position.y);
            let moved = w.manager.submit_command(session, hacker, &text).await.unwrap();
            assert!(moved.success, "{}", moved.message);
            let grabbed = w
                .manager
                .submit_command(session, hacker, "grab the loot")
                .await
                .unwrap();
            assert!(grabbed.success, "{}", grabbed.message);
        }

        let hacked = w
            .manager
            .submit_command(session, hacker, "hack the panel with x:0")
            .await
            .unwrap();
        assert!(hacked.success, "{}", hacked.message);

        let event = tokio::time::timeout(Duration::from_secs(5), settlements.recv())
            .await
            .unwrap()
            .unwrap();
        let SessionEvent::RewardSettled {
            session_id, total, ..
        } = event
        else {
            panic!("unexpected event {event:?}");
        };
        assert_eq!(session_id, session);
        assert_eq!(w.ledger.transaction_count(), 1);
        assert_eq!(w.ledger.balance(&hacker), total);

        let handle = w.manager.handle(session).unwrap();
        let mut views = handle.subscribe_view();
        let view = tokio::time::timeout(
            Duration::from_secs(5),
            views.wait_for(|v| {
                matches!(
                    v.reward.as_ref().map(|r| &r.status),
                    Some(RewardStatus::Settled { .. })
                )
            }),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();
        assert_eq!(view.state, SessionState::Completed);

        wait_for_stored(&w.store, session, view.revision).await;
        let stored = w.store.latest(session).await.unwrap().unwrap().into_latest();
        assert_eq!(stored.state, SessionState::Completed);

        // A finished session stays finished
        let other = wire(w.store.clone());
        assert!(matches!(
            other.manager.resume(session).await,
            Err(SessionError::FatalSessionFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_resume_after_restart() {
        let store = Arc::new(InMemorySnapshotStore::new());
        let first = wire(store.clone());
        let session = first.manager.create_session_with_seed(4, 99).await.unwrap();
        let player = first.manager.join(session, Role::Strategist).await.unwrap();
        let moved = first
            .manager
            .submit_command(session, player, "go north 2")
            .await
            .unwrap();
        assert!(moved.success, "{}", moved.message);
        let before = first.manager.get_snapshot(session).unwrap();
        wait_for_stored(&store, session, before.revision).await;
        assert!(store.history_len(&session) >= 1);

        let second = wire(store.clone());
        second.manager.resume(session).await.unwrap();
        let resumed = second.manager.get_snapshot(session).unwrap();
        assert_eq!(resumed.revision, before.revision);
        assert_eq!(resumed.treasures, before.treasures);
        assert_eq!(
            resumed.player(&player).unwrap().position,
            before.player(&player).unwrap().position
        );
        assert!(!resumed.player(&player).unwrap().connected);

        second.manager.heartbeat(session, player).await.unwrap();
        let scanned = second
            .manager
            .submit_command(session, player, "scan the room")
            .await
            .unwrap();
        assert!(scanned.success, "{}", scanned.message);
        assert!(scanned.scan.is_some());
        assert!(scanned.revision > before.revision);
    }

    #[tokio::test]
    async fn test_session_events_on_bus() {
        let w = wire(Arc::new(InMemorySnapshotStore::new()));
        let mut lifecycle = w
            .manager
            .bus()
            .subscribe(EventFilter::topics(vec![EventTopic::Lifecycle]));

        let session = w.manager.create_session_with_seed(2, 5).await.unwrap();
        let created = tokio::time::timeout(Duration::from_secs(1), lifecycle.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            created,
            SessionEvent::SessionCreated { session_id, difficulty: 2, seed: 5 } if session_id == session
        ));

        w.manager.close(session).await.unwrap();
        let ended = tokio::time::timeout(Duration::from_secs(1), lifecycle.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            ended,
            SessionEvent::SessionTerminated { state: SessionState::Abandoned, .. }
        ));
    }
}
