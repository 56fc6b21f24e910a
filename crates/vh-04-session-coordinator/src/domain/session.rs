//! The session aggregate
//!
//! Owns vault, players, guards and puzzles. Every mutation goes through a
//! method here and is driven by a single writer (the session actor), so
//! none of this needs interior locking.

use super::blueprint::SessionBlueprint;
use super::command::{CommandContext, PuzzleHint, TreasureHint};
use super::errors::{InvariantViolation, SessionError};
use super::player::Player;
use super::snapshot::{
    GuardView, PlayerSnapshot, PlayerView, PuzzleView, RewardReference, RewardStatus,
    SessionView, SnapshotV1, VersionedSnapshot,
};
use crate::config::{CoordinatorConfig, GuardCadence};
use heist_bus::GuardMove;
use heist_types::{
    ActionRecord, Difficulty, PlayerId, PlayerPosition, Role, SessionId, SessionState,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;
use vh_01_vault_generator::Vault;
use vh_02_puzzle_engine::{Puzzle, PuzzleKind};
use vh_03_guard_behavior::{Guard, GuardBehaviorEngine};
use vh_05_reward_adjudicator::{
    Achievement, PlayerOutcome, RewardPlan, SessionOutcome,
};

/// Authoritative state of one heist
#[derive(Debug)]
pub struct Session {
    pub(super) id: SessionId,
    pub(super) config: Arc<CoordinatorConfig>,
    pub(super) state: SessionState,
    pub(super) difficulty: Difficulty,
    pub(super) seed: u64,
    pub(super) vault: Vault,
    pub(super) players: BTreeMap<PlayerId, Player>,
    pub(super) guards: Vec<Guard>,
    /// Pending telemetry per guard, parallel to `guards`
    pub(super) telemetry: Vec<VecDeque<ActionRecord>>,
    pub(super) puzzles: Vec<Puzzle>,
    pub(super) reward: Option<RewardReference>,
    pub(super) revision: u64,
    pub(super) actions_since_guard_update: u32,
    pub(super) started_at: Instant,
    pub(super) last_activity: Instant,
}

/// Players affected by a heartbeat sweep
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sweep {
    pub disconnected: Vec<PlayerId>,
    pub removed: Vec<PlayerId>,
    pub abandoned: bool,
}

impl Sweep {
    pub fn is_empty(&self) -> bool {
        self.disconnected.is_empty() && self.removed.is_empty() && !self.abandoned
    }
}

/// Guards and their drained telemetry, detached for a blocking update
#[derive(Clone, Debug)]
pub struct GuardBatch {
    pub guards: Vec<Guard>,
    pub telemetry: Vec<Vec<ActionRecord>>,
}

impl GuardBatch {
    /// Retrain every guard on its telemetry
    pub fn run(mut self, engine: &GuardBehaviorEngine) -> Vec<Guard> {
        for (guard, batch) in self.guards.iter_mut().zip(&self.telemetry) {
            engine.update(guard, batch);
        }
        self.guards
    }

    pub fn observations(&self) -> usize {
        self.telemetry.iter().map(Vec::len).sum()
    }
}

impl Session {
    /// Assemble a session from a blueprint. Starts `Initializing`.
    pub fn new(
        id: SessionId,
        blueprint: SessionBlueprint,
        config: Arc<CoordinatorConfig>,
        now: Instant,
    ) -> Self {
        let telemetry = vec![VecDeque::new(); blueprint.guards.len()];
        Self {
            id,
            config,
            state: SessionState::Initializing,
            difficulty: blueprint.difficulty,
            seed: blueprint.seed,
            vault: blueprint.vault,
            players: BTreeMap::new(),
            guards: blueprint.guards,
            telemetry,
            puzzles: blueprint.puzzles,
            reward: None,
            revision: 0,
            actions_since_guard_update: 0,
            started_at: now,
            last_activity: now,
        }
    }

    /// Rebuild a session from a persisted snapshot
    ///
    /// Players come back disconnected and reconnect on their next heartbeat.
    pub fn from_snapshot(
        snapshot: VersionedSnapshot,
        config: Arc<CoordinatorConfig>,
        now: Instant,
    ) -> Self {
        let snapshot = snapshot.into_latest();
        let players = snapshot
            .players
            .into_iter()
            .map(|p| {
                let player = Player::restored(
                    p.player_id,
                    p.role,
                    p.position,
                    p.history,
                    config.history_capacity,
                    now,
                );
                (p.player_id, player)
            })
            .collect();
        let mut telemetry = snapshot.telemetry;
        telemetry.resize_with(snapshot.guards.len(), VecDeque::new);

        Self {
            id: snapshot.session_id,
            config,
            state: snapshot.state,
            difficulty: snapshot.difficulty,
            seed: snapshot.seed,
            vault: snapshot.vault,
            players,
            guards: snapshot.guards,
            telemetry,
            puzzles: snapshot.puzzles,
            reward: snapshot.reward,
            revision: snapshot.revision,
            actions_since_guard_update: 0,
            started_at: now
                .checked_sub(Duration::from_millis(snapshot.elapsed_ms))
                .unwrap_or(now),
            last_activity: now,
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    pub fn puzzles(&self) -> &[Puzzle] {
        &self.puzzles
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn reward(&self) -> Option<&RewardReference> {
        self.reward.as_ref()
    }

    pub fn pending_telemetry(&self) -> usize {
        self.telemetry.iter().map(VecDeque::len).sum()
    }

    pub fn elapsed_ms(&self, now: Instant) -> u64 {
        u64::try_from(now.saturating_duration_since(self.started_at).as_millis())
            .unwrap_or(u64::MAX)
    }

    pub(super) fn player_positions(&self) -> Vec<PlayerPosition> {
        self.players.values().map(Player::as_position).collect()
    }

    pub(super) fn bump(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// `FatalSessionFailure` unless the session is `Active`
    pub fn ensure_active(&self) -> Result<(), SessionError> {
        if self.state == SessionState::Active {
            Ok(())
        } else {
            Err(SessionError::not_active(self.state))
        }
    }

    // =========================================================================
    // STATE MACHINE
    // =========================================================================

    pub(super) fn transition(&mut self, next: SessionState) -> Result<(), InvariantViolation> {
        if !self.state.can_transition_to(next) {
            return Err(InvariantViolation::IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Initializing → Active
    pub fn activate(&mut self, now: Instant) -> Result<(), InvariantViolation> {
        self.transition(SessionState::Active)?;
        self.started_at = now;
        self.last_activity = now;
        self.bump();
        Ok(())
    }

    /// Move to `Failed`. Returns `false` if the session is already terminal.
    pub fn fail(&mut self) -> bool {
        if self.transition(SessionState::Failed).is_err() {
            return false;
        }
        self.bump();
        true
    }

    /// Explicit close of a running session. Returns `false` if already terminal.
    pub fn abandon(&mut self) -> bool {
        if self.transition(SessionState::Abandoned).is_err() {
            return false;
        }
        self.bump();
        true
    }

    /// Completion rule: every puzzle solved, and either the vault is empty
    /// or (on easy difficulties) enough value has been collected.
    pub fn is_complete(&self) -> bool {
        if !self.puzzles.iter().all(Puzzle::is_solved) {
            return false;
        }
        if self.vault.is_fully_collected() {
            return true;
        }
        self.difficulty.get() <= self.config.value_target_max_difficulty
            && self.vault.collected_value() as f64
                >= self.config.value_target_fraction * self.vault.total_value() as f64
    }

    /// Active → Completed when the completion rule holds
    pub(super) fn check_completion(&mut self) -> bool {
        if self.state != SessionState::Active || !self.is_complete() {
            return false;
        }
        self.transition(SessionState::Completed).is_ok()
    }

    // =========================================================================
    // PLAYERS
    // =========================================================================

    /// Add a player at the vault entrance
    pub fn join(&mut self, role: Role, now: Instant) -> Result<PlayerId, SessionError> {
        self.ensure_active()?;
        if self.players.len() >= self.config.max_players {
            return Err(SessionError::ValidationFailure(format!(
                "session is full ({} players)",
                self.config.max_players
            )));
        }
        let id = PlayerId::new();
        self.players
            .insert(id, Player::new(id, role, self.config.history_capacity, now));
        self.last_activity = now;
        self.bump();
        Ok(id)
    }

    pub fn leave(&mut self, player: &PlayerId) -> Result<(), SessionError> {
        self.ensure_active()?;
        self.players
            .remove(player)
            .ok_or_else(|| unknown_player(player))?;
        self.bump();
        Ok(())
    }

    /// Refresh a player's heartbeat. Returns `true` if this reconnected them.
    pub fn heartbeat(&mut self, player: &PlayerId, now: Instant) -> Result<bool, SessionError> {
        self.ensure_active()?;
        let reconnected = self
            .players
            .get_mut(player)
            .ok_or_else(|| unknown_player(player))?
            .reconnect(now);
        self.last_activity = now;
        if reconnected {
            self.bump();
        }
        Ok(reconnected)
    }

    /// Returns `false` if the player was already disconnected
    pub fn disconnect(&mut self, player: &PlayerId, now: Instant) -> Result<bool, SessionError> {
        self.ensure_active()?;
        let changed = self
            .players
            .get_mut(player)
            .ok_or_else(|| unknown_player(player))?
            .disconnect(now);
        if changed {
            self.bump();
        }
        Ok(changed)
    }

    /// Heartbeat and idle maintenance
    ///
    /// Silent connected players are disconnected, players disconnected past
    /// the reconnect grace are removed, and a session with nobody connected
    /// and no activity within the idle timeout is abandoned.
    pub fn sweep(&mut self, now: Instant) -> Sweep {
        let mut sweep = Sweep::default();
        if self.state != SessionState::Active {
            return sweep;
        }

        let heartbeat_timeout = self.config.heartbeat_timeout();
        let grace = self.config.reconnect_grace();
        for player in self.players.values_mut() {
            let silent = player.silent_for(now);
            if player.is_connected() {
                if silent >= heartbeat_timeout && player.disconnect(now) {
                    sweep.disconnected.push(player.id);
                }
            } else if silent >= grace {
                sweep.removed.push(player.id);
            }
        }
        for id in &sweep.removed {
            self.players.remove(id);
        }

        let nobody_connected = self.players.values().all(|p| !p.is_connected());
        let idle = now.saturating_duration_since(self.last_activity) >= self.config.idle_timeout();
        if nobody_connected && idle {
            sweep.abandoned = self.transition(SessionState::Abandoned).is_ok();
        }

        if !sweep.is_empty() {
            self.bump();
        }
        sweep
    }

    // =========================================================================
    // GUARDS
    // =========================================================================

    /// Whether the guard cadence fires now
    pub fn guard_update_due(&self, on_tick: bool) -> bool {
        if self.state != SessionState::Active || self.guards.is_empty() {
            return false;
        }
        match self.config.guard_cadence {
            GuardCadence::EveryActions(n) => {
                !on_tick && self.actions_since_guard_update >= n.max(1)
            }
            GuardCadence::Tick => on_tick,
        }
    }

    /// Drain telemetry and clone the guards for an off-thread update
    pub fn take_guard_batch(&mut self) -> GuardBatch {
        self.actions_since_guard_update = 0;
        let telemetry = self
            .telemetry
            .iter_mut()
            .map(|queue| Vec::from(std::mem::take(queue)))
            .collect();
        GuardBatch {
            guards: self.guards.clone(),
            telemetry,
        }
    }

    /// Install retrained guards, then predict and advance each one
    pub fn apply_guard_update(
        &mut self,
        updated: Vec<Guard>,
        engine: &GuardBehaviorEngine,
    ) -> Vec<GuardMove> {
        if self.state != SessionState::Active {
            return Vec::new();
        }
        for guard in updated {
            if let Some(slot) = self.guards.iter_mut().find(|g| g.id == guard.id) {
                *slot = guard;
            }
        }

        let players = self.player_positions();
        let moves = self
            .guards
            .iter_mut()
            .map(|guard| {
                let action = engine.predict_action(guard, &players);
                guard.advance(&action);
                GuardMove {
                    guard_id: guard.id,
                    position: guard.position,
                    confidence: action.confidence,
                    tracking: action.tracking,
                }
            })
            .collect();
        self.bump();
        moves
    }

    /// Queue a record for guards near it, or the nearest guard if none are
    pub(super) fn route_telemetry(&mut self, record: &ActionRecord) {
        let radius = self.config.telemetry_radius;
        let capacity = self.config.guards.memory_capacity.max(1);
        let mut targets: Vec<usize> = self
            .guards
            .iter()
            .enumerate()
            .filter(|(_, g)| g.position.distance_to(&record.position) <= radius)
            .map(|(i, _)| i)
            .collect();
        if targets.is_empty() {
            let nearest = self
                .guards
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    a.position
                        .distance_to(&record.position)
                        .total_cmp(&b.position.distance_to(&record.position))
                })
                .map(|(i, _)| i);
            targets.extend(nearest);
        }
        for index in targets {
            if let Some(queue) = self.telemetry.get_mut(index) {
                if queue.len() == capacity {
                    queue.pop_front();
                }
                queue.push_back(record.clone());
            }
        }
    }

    // =========================================================================
    // REWARDS
    // =========================================================================

    /// Final standings for reward adjudication
    pub fn outcome(&self) -> SessionOutcome {
        let players = self
            .players
            .values()
            .map(|player| {
                let mastered = self.puzzles.iter().any(|p| {
                    p.kind == PuzzleKind::Entanglement && p.solved_by() == Some(player.id)
                });
                PlayerOutcome {
                    player_id: player.id,
                    role: player.role(),
                    achievements: if mastered {
                        vec![Achievement::QuantumMastery]
                    } else {
                        Vec::new()
                    },
                }
            })
            .collect();
        SessionOutcome {
            session_id: self.id,
            state: self.state,
            difficulty: self.difficulty,
            players,
            collected_value: self.vault.collected_value(),
        }
    }

    pub fn attach_reward(&mut self, plan: &RewardPlan) {
        self.reward = Some(RewardReference {
            request_id: plan.request_id,
            total: plan.total,
            status: RewardStatus::Pending,
        });
        self.bump();
    }

    /// Record the settlement result. Ignored if it is for another plan.
    pub fn record_settlement(&mut self, request_id: Uuid, status: RewardStatus) -> bool {
        match self.reward.as_mut() {
            Some(reward) if reward.request_id == request_id => {
                reward.status = status;
                self.bump();
                true
            }
            _ => false,
        }
    }

    // =========================================================================
    // VIEWS
    // =========================================================================

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id,
            state: self.state,
            difficulty: self.difficulty,
            seed: self.seed,
            revision: self.revision,
            vault_size: self.vault.size,
            players: self
                .players
                .values()
                .map(|p| PlayerView {
                    player_id: p.id,
                    role: p.role(),
                    position: p.position,
                    connected: p.is_connected(),
                    actions: p.history_len(),
                })
                .collect(),
            guards: self
                .guards
                .iter()
                .map(|g| GuardView {
                    guard_id: g.id,
                    position: g.position,
                    detection_radius: g.detection_radius,
                    samples_seen: g.model.samples_seen(),
                })
                .collect(),
            puzzles: self
                .puzzles
                .iter()
                .map(|p| PuzzleView {
                    puzzle_id: p.id,
                    kind: p.kind,
                    qubit_count: p.qubit_count,
                    threshold: p.threshold,
                    solved: p.is_solved(),
                    solved_by: p.solved_by(),
                })
                .collect(),
            treasures: self.vault.treasures().to_vec(),
            collected: self.vault.collected().to_vec(),
            total_value: self.vault.total_value(),
            collected_value: self.vault.collected_value(),
            reward: self.reward.clone(),
        }
    }

    pub fn snapshot(&self, now: Instant) -> VersionedSnapshot {
        VersionedSnapshot::V1(SnapshotV1 {
            session_id: self.id,
            state: self.state,
            difficulty: self.difficulty,
            seed: self.seed,
            revision: self.revision,
            elapsed_ms: self.elapsed_ms(now),
            vault: self.vault.clone(),
            players: self
                .players
                .values()
                .map(|p| PlayerSnapshot {
                    player_id: p.id,
                    role: p.role(),
                    position: p.position,
                    history: p.history().cloned().collect(),
                })
                .collect(),
            guards: self.guards.clone(),
            telemetry: self.telemetry.clone(),
            puzzles: self.puzzles.clone(),
            reward: self.reward.clone(),
        })
    }

    /// What the command router needs to resolve a player's text
    pub fn command_context(&self, player: &PlayerId) -> Result<CommandContext, SessionError> {
        let player = self
            .players
            .get(player)
            .ok_or_else(|| unknown_player(player))?;
        Ok(CommandContext {
            session_id: self.id,
            player_id: player.id,
            role: player.role(),
            position: player.position,
            puzzles: self
                .puzzles
                .iter()
                .map(|p| PuzzleHint {
                    puzzle_id: p.id,
                    kind: p.kind,
                    solved: p.is_solved(),
                })
                .collect(),
            treasures: self
                .vault
                .treasures()
                .iter()
                .map(|t| TreasureHint {
                    treasure_id: t.id,
                    position: t.position,
                })
                .collect(),
        })
    }
}

pub(super) fn unknown_player(player: &PlayerId) -> SessionError {
    SessionError::ValidationFailure(format!("unknown player {player}"))
}
