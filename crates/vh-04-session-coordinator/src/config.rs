//! Configuration for the Session Coordinator

use heist_types::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vh_01_vault_generator::VaultConfig;
use vh_02_puzzle_engine::{PuzzleConfig, MAX_QUBITS, MIN_QUBITS};
use vh_03_guard_behavior::GuardConfig;
use vh_05_reward_adjudicator::RewardConfig;

/// When guards retrain and move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardCadence {
    /// After every `n` applied player actions.
    EveryActions(u32),
    /// On every session tick.
    Tick,
}

/// Session Coordinator configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    // =========================================================================
    // TIMING
    // =========================================================================
    /// No connected player and no heartbeat for this long → Abandoned
    pub idle_timeout_ms: u64,
    /// Connected player silent this long → Disconnected
    pub heartbeat_timeout_ms: u64,
    /// Disconnected player silent this long → removed
    pub reconnect_grace_ms: u64,
    /// Maintenance pass interval (heartbeat sweep, idle check, tick cadence)
    pub tick_interval_ms: u64,

    // =========================================================================
    // GUARDS
    // =========================================================================
    pub guard_cadence: GuardCadence,
    /// Guards in a difficulty-1 session
    pub base_guards: usize,
    /// One extra guard per this many difficulty levels
    pub difficulty_per_extra_guard: u8,
    /// Guards within this distance of an action receive its telemetry
    pub telemetry_radius: f64,

    // =========================================================================
    // PUZZLES
    // =========================================================================
    pub base_puzzles: usize,
    pub difficulty_per_extra_puzzle: u8,
    pub difficulty_per_extra_qubit: u8,

    // =========================================================================
    // RULES
    // =========================================================================
    /// Players must stand this close to a treasure to take it
    pub reach_radius: f64,
    /// Guards and treasures within this distance show up on a scan
    pub scan_radius: f64,
    /// Detection radius bonus per treasure security level
    pub security_detection_weight: f64,
    /// Detection radius multiplier applied to infiltrators
    pub infiltrator_detection_factor: f64,
    pub max_players: usize,
    /// Actions kept per player
    pub history_capacity: usize,
    /// Sessions at or below this difficulty may complete on a value target
    pub value_target_max_difficulty: u8,
    /// Fraction of total vault value that satisfies the value target
    pub value_target_fraction: f64,

    // =========================================================================
    // INFRASTRUCTURE
    // =========================================================================
    /// Persist a snapshot every N revisions
    pub persist_every: u64,
    /// Consecutive failed snapshot writes (after retries) before the session fails
    pub max_consecutive_persist_failures: u32,
    pub retry: RetryPolicy,
    /// Wait between settlement rounds while the ledger is unavailable
    pub settlement_retry_ms: u64,
    pub command_queue_capacity: usize,

    // =========================================================================
    // SUBSYSTEMS
    // =========================================================================
    pub vault: VaultConfig,
    pub puzzles: PuzzleConfig,
    pub guards: GuardConfig,
    pub rewards: RewardConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 300_000,
            heartbeat_timeout_ms: 30_000,
            reconnect_grace_ms: 120_000,
            tick_interval_ms: 1_000,
            guard_cadence: GuardCadence::EveryActions(5),
            base_guards: 1,
            difficulty_per_extra_guard: 3,
            telemetry_radius: 8.0,
            base_puzzles: 1,
            difficulty_per_extra_puzzle: 4,
            difficulty_per_extra_qubit: 3,
            reach_radius: 1.5,
            scan_radius: 10.0,
            security_detection_weight: 0.25,
            infiltrator_detection_factor: 0.5,
            max_players: 8,
            history_capacity: 64,
            value_target_max_difficulty: 3,
            value_target_fraction: 0.5,
            persist_every: 1,
            max_consecutive_persist_failures: 3,
            retry: RetryPolicy::default(),
            settlement_retry_ms: 30_000,
            command_queue_capacity: 256,
            vault: VaultConfig::default(),
            puzzles: PuzzleConfig::default(),
            guards: GuardConfig::default(),
            rewards: RewardConfig::default(),
        }
    }
}

impl CoordinatorConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }

    pub fn reconnect_grace(&self) -> Duration {
        Duration::from_millis(self.reconnect_grace_ms)
    }

    pub fn settlement_retry_interval(&self) -> Duration {
        Duration::from_millis(self.settlement_retry_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn guard_count(&self, difficulty: u8) -> usize {
        self.base_guards + usize::from(difficulty / self.difficulty_per_extra_guard.max(1))
    }

    pub fn puzzle_count(&self, difficulty: u8) -> usize {
        self.base_puzzles + usize::from(difficulty / self.difficulty_per_extra_puzzle.max(1))
    }

    pub fn qubit_count(&self, difficulty: u8) -> u8 {
        (MIN_QUBITS + difficulty / self.difficulty_per_extra_qubit.max(1)).clamp(MIN_QUBITS, MAX_QUBITS)
    }
}
