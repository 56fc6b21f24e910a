//! Session registry and the `SessionApi` implementation

use super::actor::{Collaborators, SessionActor};
use super::handle::SessionHandle;
use super::now;
use crate::config::CoordinatorConfig;
use crate::domain::action::{ActionResult, PlayerAction};
use crate::domain::blueprint::SessionBlueprint;
use crate::domain::errors::{SessionError, StoreError};
use crate::domain::session::Session;
use crate::domain::snapshot::SessionView;
use crate::ports::inbound::SessionApi;
use crate::ports::outbound::{CommandRouter, SnapshotStore};
use async_trait::async_trait;
use heist_bus::{EventPublisher, InMemoryEventBus, SessionEvent};
use heist_telemetry::metrics::{SESSIONS_ACTIVE, SESSIONS_CREATED};
use heist_types::{
    retry_with_backoff, retry_with_backoff_when, PlayerId, Role, SessionId,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use vh_02_puzzle_engine::PuzzleEngine;
use vh_03_guard_behavior::GuardBehaviorEngine;
use vh_05_reward_adjudicator::{LedgerSettlement, RewardAdjudicator};

/// Owns every running session task
pub struct SessionManager {
    config: Arc<CoordinatorConfig>,
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,
    deps: Collaborators,
    router: Arc<dyn CommandRouter>,
    bus: Arc<InMemoryEventBus>,
}

impl SessionManager {
    pub fn new(
        config: CoordinatorConfig,
        store: Arc<dyn SnapshotStore>,
        ledger: Arc<dyn LedgerSettlement>,
        router: Arc<dyn CommandRouter>,
        bus: Arc<InMemoryEventBus>,
    ) -> Self {
        let config = Arc::new(config);
        let deps = Collaborators {
            config: config.clone(),
            puzzles: Arc::new(PuzzleEngine::with_config(config.puzzles.clone())),
            guards: Arc::new(GuardBehaviorEngine::with_config(config.guards.clone())),
            store,
            rewards: Arc::new(RewardAdjudicator::with_config(
                config.rewards.clone(),
                ledger,
            )),
            events: bus.clone(),
        };
        Self {
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            deps,
            router,
            bus,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Bus the sessions publish to
    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    /// Create a session from an explicit seed. Same seed, same difficulty,
    /// same vault, guards and puzzles.
    pub async fn create_session_with_seed(
        &self,
        difficulty: u8,
        seed: u64,
    ) -> Result<SessionId, SessionError> {
        let blueprint = SessionBlueprint::generate(seed, difficulty, &self.config)?;
        self.create_from_blueprint(blueprint).await
    }

    /// Start a session from a prepared blueprint
    pub async fn create_from_blueprint(
        &self,
        blueprint: SessionBlueprint,
    ) -> Result<SessionId, SessionError> {
        let session_id = SessionId::new();
        let difficulty = blueprint.difficulty.get();
        let seed = blueprint.seed;

        let started = now();
        let mut session = Session::new(session_id, blueprint, self.config.clone(), started);
        session
            .activate(started)
            .map_err(|e| SessionError::FatalSessionFailure(e.to_string()))?;

        SESSIONS_CREATED.inc();
        SESSIONS_ACTIVE.inc();
        info!(
            session_id = %session_id,
            difficulty,
            seed,
            guards = session.guards().len(),
            puzzles = session.puzzles().len(),
            treasures = session.vault().treasures().len(),
            "Session created"
        );
        self.bus
            .publish(SessionEvent::SessionCreated {
                session_id,
                difficulty,
                seed,
            })
            .await;

        let handle = SessionActor::spawn(session, self.deps.clone());
        self.sessions.write().insert(session_id, handle);
        Ok(session_id)
    }

    /// Bring a persisted session back under a running task
    ///
    /// Players return disconnected. Terminal sessions cannot be resumed.
    pub async fn resume(&self, session_id: SessionId) -> Result<SessionId, SessionError> {
        if self.sessions.read().contains_key(&session_id) {
            return Ok(session_id);
        }
        let store = self.deps.store.clone();
        let snapshot = retry_with_backoff_when(
            &self.config.retry,
            "snapshot_latest",
            StoreError::is_transient,
            |_| store.latest(session_id),
        )
        .await?
        .ok_or(SessionError::SessionNotFound(session_id))?;

        let session = Session::from_snapshot(snapshot, self.config.clone(), now());
        session.ensure_active()?;

        SESSIONS_ACTIVE.inc();
        info!(
            session_id = %session_id,
            revision = session.revision(),
            players = session.players().count(),
            "Session resumed"
        );
        let handle = SessionActor::spawn(session, self.deps.clone());
        self.sessions.write().insert(session_id, handle);
        Ok(session_id)
    }

    pub fn handle(&self, session_id: SessionId) -> Result<SessionHandle, SessionError> {
        self.sessions
            .read()
            .get(&session_id)
            .cloned()
            .ok_or(SessionError::SessionNotFound(session_id))
    }

    /// Run one maintenance pass on a session
    pub async fn tick(&self, session_id: SessionId) -> Result<(), SessionError> {
        self.handle(session_id)?.tick().await
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.read().keys().copied().collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Stop and drop every session that reached a terminal state.
    /// Completed sessions stay until their rewards are settled or refused.
    pub async fn prune_terminated(&self) -> usize {
        let finished: Vec<SessionHandle> = self
            .sessions
            .read()
            .values()
            .filter(|h| {
                if h.is_stopped() {
                    return true;
                }
                let view = h.view();
                view.state.is_terminal() && !view.settlement_outstanding()
            })
            .cloned()
            .collect();
        for handle in &finished {
            let _ = handle.shutdown().await;
            self.sessions.write().remove(&handle.session_id());
        }
        if !finished.is_empty() {
            debug!(pruned = finished.len(), "Pruned finished sessions");
        }
        finished.len()
    }

    /// Close every session. Used on process shutdown.
    pub async fn shutdown_all(&self) {
        let handles: Vec<SessionHandle> = self.sessions.write().drain().map(|(_, h)| h).collect();
        for handle in handles {
            let _ = handle.shutdown().await;
        }
    }
}

#[async_trait]
impl SessionApi for SessionManager {
    async fn create_session(&self, difficulty: u8) -> Result<SessionId, SessionError> {
        self.create_session_with_seed(difficulty, rand::random())
            .await
    }

    async fn join(&self, session: SessionId, role: Role) -> Result<PlayerId, SessionError> {
        self.handle(session)?.join(role).await
    }

    async fn leave(&self, session: SessionId, player: PlayerId) -> Result<(), SessionError> {
        self.handle(session)?.leave(player).await
    }

    async fn heartbeat(&self, session: SessionId, player: PlayerId) -> Result<(), SessionError> {
        self.handle(session)?.heartbeat(player).await
    }

    async fn disconnect(&self, session: SessionId, player: PlayerId) -> Result<(), SessionError> {
        self.handle(session)?.disconnect(player).await
    }

    async fn submit_action(
        &self,
        session: SessionId,
        player: PlayerId,
        action: PlayerAction,
    ) -> Result<ActionResult, SessionError> {
        self.handle(session)?.submit(player, action).await
    }

    async fn submit_command(
        &self,
        session: SessionId,
        player: PlayerId,
        text: &str,
    ) -> Result<ActionResult, SessionError> {
        let handle = self.handle(session)?;
        let context = match handle.context(player).await {
            Ok(context) => context,
            Err(SessionError::ValidationFailure(reason)) => {
                return Ok(ActionResult::failed(reason, handle.view().revision));
            }
            Err(e) => return Err(e),
        };

        let router = self.router.clone();
        let routed = retry_with_backoff(&self.config.retry, "command_route", |_| {
            router.route(text, &context)
        })
        .await?;

        let action = match PlayerAction::try_from(routed) {
            Ok(action) => action,
            Err(e) => {
                debug!(session_id = %session, player_id = %player, text, error = %e, "Command not applied");
                return Ok(ActionResult::failed(e.to_string(), handle.view().revision));
            }
        };
        handle.submit(player, action).await
    }

    fn get_snapshot(&self, session: SessionId) -> Result<Arc<SessionView>, SessionError> {
        Ok(self.handle(session)?.view())
    }

    async fn close(&self, session: SessionId) -> Result<(), SessionError> {
        let handle = self.handle(session)?;
        let result = handle.shutdown().await;
        self.sessions.write().remove(&session);
        info!(session_id = %session, state = %handle.state(), "Session closed");
        match result {
            // Task already gone; nothing left to stop
            Err(SessionError::FatalSessionFailure(_)) if handle.is_stopped() => Ok(()),
            other => other,
        }
    }
}
