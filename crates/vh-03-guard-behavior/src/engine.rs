//! # Guard Behavior Engine
//!
//! Stateless service over `Guard` values. The session coordinator owns the
//! guards and decides when to call `update`; the engine only learns and
//! predicts.

use crate::config::GuardConfig;
use crate::domain::entities::{ActionSource, Guard, GuardAction};
use crate::domain::memory::Observation;
use crate::domain::model::BehaviorModel;
use crate::PATROL_CONFIDENCE;
use heist_types::{ActionRecord, PlayerPosition};
use tracing::{debug, warn};

/// Trains guard models and turns them into movement decisions
#[derive(Clone, Debug, Default)]
pub struct GuardBehaviorEngine {
    config: GuardConfig,
}

impl GuardBehaviorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GuardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Fold a telemetry batch into the guard's memory, then run one SGD
    /// pass over everything the memory retains.
    ///
    /// An empty batch leaves the guard untouched. Only the newest
    /// `memory_capacity` records of an oversized batch are kept.
    pub fn update(&self, guard: &mut Guard, batch: &[ActionRecord]) {
        if batch.is_empty() {
            return;
        }

        let skip = batch.len().saturating_sub(guard.memory.capacity());
        let fresh = batch.len() - skip;
        for record in &batch[skip..] {
            let (features, success) = guard.extractor.extract(record);
            guard.memory.push(Observation { features, success });
        }

        if let Some(latest) = batch.iter().map(|r| r.elapsed_ms).max() {
            guard.clock_ms = guard.clock_ms.max(latest);
        }

        let absorbed = if guard.model.is_usable() {
            fresh
        } else {
            warn!(guard_id = %guard.id, "Guard model corrupt, retraining from memory");
            guard.model = BehaviorModel::new();
            guard.memory.len()
        };
        guard
            .model
            .partial_fit(guard.memory.iter(), guard.learning_rate, self.config.l2_penalty);
        guard.model.record_samples(absorbed as u64);

        if !guard.model.is_usable() {
            warn!(guard_id = %guard.id, "Guard model diverged, resetting");
            guard.model = BehaviorModel::new();
        }

        debug!(
            guard_id = %guard.id,
            batch = batch.len(),
            samples = guard.model.samples_seen(),
            memory = guard.memory.len(),
            "Guard model updated"
        );
    }

    /// Choose the guard's next target.
    ///
    /// Falls back to the patrol waypoint with confidence 0.5 while the model
    /// is undertrained or unusable, or when no player is connected.
    pub fn predict_action(&self, guard: &Guard, players: &[PlayerPosition]) -> GuardAction {
        if guard.model.samples_seen() < self.config.min_samples || !guard.model.is_usable() {
            return patrol_action(guard);
        }

        let best = players
            .iter()
            .filter(|p| p.connected)
            .map(|p| {
                let features = guard.extractor.at(&p.position, guard.clock_ms);
                (p, guard.model.predict_proba(&features))
            })
            .filter(|(_, probability)| probability.is_finite())
            .max_by(|a, b| a.1.total_cmp(&b.1));

        match best {
            Some((player, probability)) => GuardAction {
                guard_id: guard.id,
                target: player.position,
                confidence: probability.clamp(0.0, 1.0),
                source: ActionSource::Model,
                tracking: Some(player.player_id),
            },
            None => patrol_action(guard),
        }
    }
}

fn patrol_action(guard: &Guard) -> GuardAction {
    GuardAction {
        guard_id: guard.id,
        target: guard.patrol.current_target(),
        confidence: PATROL_CONFIDENCE,
        source: ActionSource::Patrol,
        tracking: None,
    }
}
