//! Per-session actor
//!
//! One task owns one `Session`. Every mutation arrives as a
//! `SessionCommand` and is applied in arrival order. Slow work (guard
//! retraining, snapshot writes, reward settlement) runs in spawned tasks
//! whose results come back through the same queue.

use super::handle::SessionHandle;
use super::now;
use crate::config::CoordinatorConfig;
use crate::domain::action::{ActionResult, PlayerAction};
use crate::domain::actions::Rules;
use crate::domain::command::CommandContext;
use crate::domain::errors::{SessionError, StoreError};
use crate::domain::invariants::Fingerprint;
use crate::domain::session::Session;
use crate::domain::snapshot::{RewardStatus, SessionView};
use crate::ports::outbound::SnapshotStore;
use heist_bus::{DeltaKind, EventPublisher, SessionEvent};
use heist_telemetry::metrics::{
    ACTIONS_APPLIED, ACTIONS_REJECTED, ACTION_DURATION, GUARD_UPDATES, GUARD_UPDATES_SKIPPED,
    GUARD_UPDATE_DURATION, PERSIST_FAILURES, PUZZLES_SOLVED, SESSIONS_ACTIVE,
    SESSIONS_TERMINATED, SETTLEMENTS, SNAPSHOTS_PERSISTED,
};
use heist_telemetry::{metric_inc, time_histogram};
use heist_types::{retry_with_backoff_when, unix_millis, PlayerId, Role, SessionState};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use vh_02_puzzle_engine::PuzzleEngine;
use vh_03_guard_behavior::{Guard, GuardBehaviorEngine};
use vh_05_reward_adjudicator::{RewardApi, RewardError, RewardPlan, SettlementReceipt};

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Messages handled by the session actor
pub(crate) enum SessionCommand {
    Join {
        role: Role,
        reply: Reply<PlayerId>,
    },
    Leave {
        player: PlayerId,
        reply: Reply<()>,
    },
    Heartbeat {
        player: PlayerId,
        reply: Reply<()>,
    },
    Disconnect {
        player: PlayerId,
        reply: Reply<()>,
    },
    Submit {
        player: PlayerId,
        action: PlayerAction,
        reply: Reply<ActionResult>,
    },
    Context {
        player: PlayerId,
        reply: Reply<CommandContext>,
    },
    /// Run maintenance now instead of waiting for the interval
    Tick { reply: Reply<()> },
    GuardsUpdated {
        guards: Vec<Guard>,
    },
    GuardUpdateFailed {
        reason: String,
    },
    Persisted {
        revision: u64,
        result: Result<(), StoreError>,
    },
    Settled {
        request_id: Uuid,
        total: u64,
        result: Result<SettlementReceipt, RewardError>,
    },
    Shutdown {
        reply: Reply<()>,
    },
}

/// Shared collaborators every session actor uses
#[derive(Clone)]
pub(crate) struct Collaborators {
    pub config: Arc<CoordinatorConfig>,
    pub puzzles: Arc<PuzzleEngine>,
    pub guards: Arc<GuardBehaviorEngine>,
    pub store: Arc<dyn SnapshotStore>,
    pub rewards: Arc<dyn RewardApi>,
    pub events: Arc<dyn EventPublisher>,
}

/// A reward plan the ledger has not accepted yet
struct OutstandingSettlement {
    plan: RewardPlan,
    rounds: u32,
    in_flight: bool,
    /// Next round allowed at; `None` while one is running
    retry_at: Option<Instant>,
}

pub(crate) struct SessionActor {
    session: Session,
    deps: Collaborators,
    commands: mpsc::Receiver<SessionCommand>,
    /// Handed to spawned work; does not keep the actor alive
    loopback: mpsc::WeakSender<SessionCommand>,
    view: watch::Sender<Arc<SessionView>>,
    guard_update_in_flight: bool,
    persist_in_flight: bool,
    persist_dirty: bool,
    persisted_revision: u64,
    consecutive_persist_failures: u32,
    settlement: Option<OutstandingSettlement>,
}

impl SessionActor {
    /// Start the actor task and return a handle to it
    pub(crate) fn spawn(session: Session, deps: Collaborators) -> SessionHandle {
        let (sender, commands) = mpsc::channel(deps.config.command_queue_capacity.max(1));
        let (view, view_rx) = watch::channel(Arc::new(session.view()));
        let handle = SessionHandle::new(session.id(), sender.clone(), view_rx);

        let mut actor = Self {
            loopback: sender.downgrade(),
            session,
            deps,
            commands,
            view,
            guard_update_in_flight: false,
            persist_in_flight: false,
            persist_dirty: false,
            persisted_revision: 0,
            consecutive_persist_failures: 0,
            settlement: None,
        };
        actor.schedule_persist();
        tokio::spawn(actor.run());
        handle
    }

    async fn run(mut self) {
        let session_id = self.session.id();
        let mut ticker = tokio::time::interval(self.deps.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        debug!(session_id = %session_id, "Session task started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Shutdown { reply }) => {
                        self.shutdown().await;
                        let _ = reply.send(Ok(()));
                        break;
                    }
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                _ = ticker.tick() => self.maintain().await,
            }
        }
        debug!(session_id = %session_id, revision = self.session.revision(), "Session task stopped");
    }

    async fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Join { role, reply } => {
                let before = self.session.fingerprint();
                let result = self.session.join(role, now());
                if let Ok(player) = &result {
                    info!(
                        session_id = %self.session.id(),
                        player_id = %player,
                        role = %role,
                        "Player joined"
                    );
                    self.delta(*player, DeltaKind::PlayerJoined, format!("{role} joined"))
                        .await;
                    self.after_mutation(before).await;
                }
                let _ = reply.send(result);
            }
            SessionCommand::Leave { player, reply } => {
                let before = self.session.fingerprint();
                let result = self.session.leave(&player);
                if result.is_ok() {
                    self.delta(player, DeltaKind::PlayerLeft, "player left".into())
                        .await;
                    self.after_mutation(before).await;
                }
                let _ = reply.send(result);
            }
            SessionCommand::Heartbeat { player, reply } => {
                let before = self.session.fingerprint();
                let result = self.session.heartbeat(&player, now());
                if let Ok(true) = result {
                    self.delta(player, DeltaKind::PlayerReconnected, "player reconnected".into())
                        .await;
                    self.after_mutation(before).await;
                }
                let _ = reply.send(result.map(|_| ()));
            }
            SessionCommand::Disconnect { player, reply } => {
                let before = self.session.fingerprint();
                let result = self.session.disconnect(&player, now());
                if let Ok(true) = result {
                    self.delta(
                        player,
                        DeltaKind::PlayerDisconnected,
                        "player disconnected".into(),
                    )
                    .await;
                    self.after_mutation(before).await;
                }
                let _ = reply.send(result.map(|_| ()));
            }
            SessionCommand::Submit {
                player,
                action,
                reply,
            } => {
                let result = self.submit(player, action).await;
                let _ = reply.send(result);
            }
            SessionCommand::Context { player, reply } => {
                let result = self
                    .session
                    .ensure_active()
                    .and_then(|_| self.session.command_context(&player));
                let _ = reply.send(result);
            }
            SessionCommand::Tick { reply } => {
                self.maintain().await;
                let _ = reply.send(Ok(()));
            }
            SessionCommand::GuardsUpdated { guards } => {
                self.guard_update_in_flight = false;
                let before = self.session.fingerprint();
                let moves = self.session.apply_guard_update(guards, &self.deps.guards);
                if moves.is_empty() {
                    return;
                }
                GUARD_UPDATES.inc();
                let event = SessionEvent::GuardsAdvanced {
                    session_id: self.session.id(),
                    revision: self.session.revision(),
                    guards: moves,
                };
                self.deps.events.publish(event).await;
                self.after_mutation(before).await;
            }
            SessionCommand::GuardUpdateFailed { reason } => {
                self.guard_update_in_flight = false;
                error!(session_id = %self.session.id(), reason = %reason, "Guard update task failed");
            }
            SessionCommand::Persisted { revision, result } => {
                self.on_persisted(revision, result).await;
            }
            SessionCommand::Settled {
                request_id,
                total,
                result,
            } => {
                self.on_settled(request_id, total, result).await;
            }
            SessionCommand::Shutdown { reply } => {
                // Handled in `run`
                let _ = reply.send(Ok(()));
            }
        }
    }

    async fn submit(
        &mut self,
        player: PlayerId,
        action: PlayerAction,
    ) -> Result<ActionResult, SessionError> {
        let kind = action.kind();
        let before = self.session.fingerprint();
        let rules = Rules {
            puzzles: &self.deps.puzzles,
            guards: &self.deps.guards,
        };

        let applied = {
            let _timer = time_histogram!(ACTION_DURATION);
            self.session.apply_action(&player, action, rules, now())
        };
        let applied = match applied {
            Ok(applied) => applied,
            Err(e) => {
                ACTIONS_REJECTED.with_label_values(&[kind.as_str()]).inc();
                debug!(session_id = %self.session.id(), player_id = %player, error = %e, "Action refused");
                return Err(e);
            }
        };

        let Some(record) = applied.record else {
            if !applied.result.success {
                ACTIONS_REJECTED.with_label_values(&[kind.as_str()]).inc();
                debug!(
                    session_id = %self.session.id(),
                    player_id = %player,
                    kind = %kind,
                    reason = %applied.result.message,
                    "Action rejected"
                );
            }
            return Ok(applied.result);
        };

        ACTIONS_APPLIED
            .with_label_values(&[kind.as_str(), record.outcome.as_str()])
            .inc();
        if let Some(puzzle_kind) = applied.solved {
            metric_inc!(PUZZLES_SOLVED, &[puzzle_kind.to_string().as_str()]);
            info!(
                session_id = %self.session.id(),
                player_id = %player,
                kind = %puzzle_kind,
                "Puzzle solved"
            );
        }

        self.delta(
            player,
            DeltaKind::Action {
                kind,
                outcome: record.outcome,
            },
            applied.result.message.clone(),
        )
        .await;
        self.after_mutation(before).await;
        Ok(applied.result)
    }

    /// Heartbeat sweep, idle check, tick-driven guard cadence and
    /// settlement retries
    async fn maintain(&mut self) {
        self.retry_settlement_if_due();

        let before = self.session.fingerprint();
        let sweep = self.session.sweep(now());
        for player in &sweep.disconnected {
            self.delta(*player, DeltaKind::PlayerDisconnected, "heartbeat timed out".into())
                .await;
        }
        for player in &sweep.removed {
            self.delta(*player, DeltaKind::PlayerLeft, "reconnect grace expired".into())
                .await;
        }
        if !sweep.is_empty() {
            self.after_mutation(before).await;
        }
        self.trigger_guards(true);
    }

    /// Invariant check, terminal handling, persistence and view publication
    async fn after_mutation(&mut self, before: Fingerprint) {
        if let Err(violation) = self.session.check_transition(&before) {
            error!(
                session_id = %self.session.id(),
                violation = %violation,
                "Invariant violated, failing session"
            );
            self.session.fail();
        }
        self.on_state_change(before.state).await;
        self.trigger_guards(false);
        self.schedule_persist();
        self.publish_view();
    }

    async fn on_state_change(&mut self, previous: SessionState) {
        let state = self.session.state();
        if state == previous || !state.is_terminal() {
            return;
        }

        SESSIONS_ACTIVE.dec();
        SESSIONS_TERMINATED.with_label_values(&[state.as_str()]).inc();
        info!(
            session_id = %self.session.id(),
            state = %state,
            revision = self.session.revision(),
            "Session terminated"
        );
        let event = SessionEvent::SessionTerminated {
            session_id: self.session.id(),
            state,
            revision: self.session.revision(),
        };
        self.deps.events.publish(event).await;

        if state == SessionState::Completed {
            self.begin_settlement();
        }
    }

    fn begin_settlement(&mut self) {
        let outcome = self.session.outcome();
        let plan = match self.deps.rewards.adjudicate(&outcome) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(session_id = %self.session.id(), error = %e, "Reward adjudication failed");
                return;
            }
        };
        self.session.attach_reward(&plan);
        self.settlement = Some(OutstandingSettlement {
            plan,
            rounds: 0,
            in_flight: false,
            retry_at: None,
        });
        self.drive_settlement();
    }

    fn retry_settlement_if_due(&mut self) {
        let due = self.settlement.as_ref().is_some_and(|s| {
            !s.in_flight && s.retry_at.is_some_and(|at| at <= now())
        });
        if due {
            self.drive_settlement();
        }
    }

    /// Submit the outstanding plan. Every round reuses the same `request_id`.
    fn drive_settlement(&mut self) {
        let Some(sender) = self.loopback.upgrade() else {
            return;
        };
        let Some(settlement) = self.settlement.as_mut() else {
            return;
        };
        if settlement.in_flight {
            return;
        }
        settlement.in_flight = true;
        settlement.retry_at = None;
        settlement.rounds += 1;
        debug!(
            session_id = %self.session.id(),
            request_id = %settlement.plan.request_id,
            round = settlement.rounds,
            "Settlement round started"
        );

        let plan = settlement.plan.clone();
        let rewards = self.deps.rewards.clone();
        tokio::spawn(async move {
            let result = rewards.settle(&plan).await;
            let _ = sender
                .send(SessionCommand::Settled {
                    request_id: plan.request_id,
                    total: plan.total,
                    result,
                })
                .await;
        });
    }

    async fn on_settled(
        &mut self,
        request_id: Uuid,
        total: u64,
        result: Result<SettlementReceipt, RewardError>,
    ) {
        let session_id = self.session.id();
        let rounds = match self.settlement.as_mut() {
            Some(s) if s.plan.request_id == request_id => {
                s.in_flight = false;
                s.rounds
            }
            _ => return,
        };

        let (status, event) = match result {
            Ok(receipt) => {
                SETTLEMENTS.with_label_values(&["settled"]).inc();
                self.settlement = None;
                (
                    RewardStatus::Settled {
                        transaction_ref: receipt.transaction_ref.clone(),
                    },
                    SessionEvent::RewardSettled {
                        session_id,
                        request_id,
                        transaction_ref: receipt.transaction_ref,
                        total,
                    },
                )
            }
            Err(e) if e.is_transient() => {
                SETTLEMENTS.with_label_values(&["retrying"]).inc();
                let retry_in = self.deps.config.settlement_retry_interval();
                if let Some(s) = self.settlement.as_mut() {
                    s.retry_at = Some(now() + retry_in);
                }
                warn!(
                    session_id = %session_id,
                    request_id = %request_id,
                    rounds,
                    retry_in_ms = retry_in.as_millis() as u64,
                    error = %e,
                    "Ledger unavailable, settlement will be retried"
                );
                (
                    RewardStatus::Retrying {
                        attempts: rounds,
                        reason: e.to_string(),
                    },
                    SessionEvent::SettlementFailed {
                        session_id,
                        request_id,
                        reason: e.to_string(),
                        retrying: true,
                    },
                )
            }
            Err(e) => {
                SETTLEMENTS.with_label_values(&["failed"]).inc();
                self.settlement = None;
                (
                    RewardStatus::Failed {
                        reason: e.to_string(),
                    },
                    SessionEvent::SettlementFailed {
                        session_id,
                        request_id,
                        reason: e.to_string(),
                        retrying: false,
                    },
                )
            }
        };
        if self.session.record_settlement(request_id, status) {
            self.deps.events.publish(event).await;
            self.schedule_persist();
            self.publish_view();
        }
    }

    fn trigger_guards(&mut self, on_tick: bool) {
        if !self.session.guard_update_due(on_tick) {
            return;
        }
        if self.guard_update_in_flight {
            GUARD_UPDATES_SKIPPED.inc();
            debug!(session_id = %self.session.id(), "Guard update still running, trigger skipped");
            return;
        }
        let Some(sender) = self.loopback.upgrade() else {
            return;
        };

        let batch = self.session.take_guard_batch();
        let engine = self.deps.guards.clone();
        let session_id = self.session.id();
        self.guard_update_in_flight = true;
        debug!(
            session_id = %session_id,
            guards = batch.guards.len(),
            observations = batch.observations(),
            "Guard update started"
        );

        tokio::spawn(async move {
            let outcome = tokio::task::spawn_blocking(move || {
                let _timer = time_histogram!(GUARD_UPDATE_DURATION);
                batch.run(&engine)
            })
            .await;
            let command = match outcome {
                Ok(guards) => SessionCommand::GuardsUpdated { guards },
                Err(e) => SessionCommand::GuardUpdateFailed {
                    reason: e.to_string(),
                },
            };
            let _ = sender.send(command).await;
        });
    }

    fn schedule_persist(&mut self) {
        let revision = self.session.revision();
        let every = self.deps.config.persist_every.max(1);
        let due = revision >= self.persisted_revision + every
            || (self.session.state().is_terminal() && revision > self.persisted_revision);
        if !due {
            return;
        }
        if self.persist_in_flight {
            self.persist_dirty = true;
            return;
        }
        let Some(sender) = self.loopback.upgrade() else {
            return;
        };

        let snapshot = self.session.snapshot(now());
        let store = self.deps.store.clone();
        let policy = self.deps.config.retry.clone();
        let session_id = self.session.id();
        self.persist_in_flight = true;

        tokio::spawn(async move {
            let result = retry_with_backoff_when(
                &policy,
                "snapshot_put",
                StoreError::is_transient,
                |_| store.put(session_id, &snapshot, unix_millis()),
            )
            .await;
            let _ = sender.send(SessionCommand::Persisted { revision, result }).await;
        });
    }

    async fn on_persisted(&mut self, revision: u64, result: Result<(), StoreError>) {
        self.persist_in_flight = false;
        match result {
            Ok(()) => {
                SNAPSHOTS_PERSISTED.inc();
                self.consecutive_persist_failures = 0;
                self.persisted_revision = self.persisted_revision.max(revision);
                debug!(session_id = %self.session.id(), revision, "Snapshot persisted");
            }
            Err(e) => {
                PERSIST_FAILURES.inc();
                self.consecutive_persist_failures += 1;
                warn!(
                    session_id = %self.session.id(),
                    revision,
                    consecutive_failures = self.consecutive_persist_failures,
                    error = %e,
                    "Snapshot write failed"
                );
                let event = SessionEvent::PersistenceFailed {
                    session_id: self.session.id(),
                    revision,
                    consecutive_failures: self.consecutive_persist_failures,
                    reason: e.to_string(),
                };
                self.deps.events.publish(event).await;

                if self.consecutive_persist_failures
                    >= self.deps.config.max_consecutive_persist_failures
                    && !self.session.state().is_terminal()
                {
                    error!(session_id = %self.session.id(), "Persistence unavailable, failing session");
                    let before = self.session.fingerprint();
                    self.session.fail();
                    self.on_state_change(before.state).await;
                    self.publish_view();
                }
            }
        }
        if std::mem::take(&mut self.persist_dirty) {
            self.schedule_persist();
        }
    }

    /// Explicit close: abandon a running session and write a final snapshot
    async fn shutdown(&mut self) {
        let before = self.session.fingerprint();
        if self.session.abandon() {
            self.on_state_change(before.state).await;
            self.publish_view();
        }
        if self.session.revision() <= self.persisted_revision {
            return;
        }
        let snapshot = self.session.snapshot(now());
        let result = retry_with_backoff_when(
            &self.deps.config.retry,
            "snapshot_put",
            StoreError::is_transient,
            |_| self.deps.store.put(self.session.id(), &snapshot, unix_millis()),
        )
        .await;
        if let Err(e) = result {
            PERSIST_FAILURES.inc();
            warn!(session_id = %self.session.id(), error = %e, "Final snapshot write failed");
        }
    }

    async fn delta(&self, player_id: PlayerId, delta: DeltaKind, message: String) {
        let event = SessionEvent::StateDelta {
            session_id: self.session.id(),
            revision: self.session.revision(),
            player_id,
            delta,
            message,
        };
        self.deps.events.publish(event).await;
    }

    fn publish_view(&self) {
        self.view.send_replace(Arc::new(self.session.view()));
    }
}
