//! Guard entities

use super::errors::GuardError;
use super::memory::ObservationMemory;
use super::model::BehaviorModel;
use super::patrol::PatrolPattern;
use crate::config::GuardConfig;
use crate::features::FeatureExtractor;
use heist_types::{Difficulty, GuardId, PlayerId, Position};
use serde::{Deserialize, Serialize};

/// An adaptive guard
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Guard {
    pub id: GuardId,
    pub difficulty: Difficulty,
    pub model: BehaviorModel,
    pub patrol: PatrolPattern,
    pub memory: ObservationMemory,
    pub position: Position,
    pub detection_radius: f64,
    pub learning_rate: f64,
    pub speed: f64,
    pub extractor: FeatureExtractor,
    /// Latest session-relative time seen in telemetry
    pub clock_ms: u64,
}

impl Guard {
    /// Fresh guard at the start of its patrol loop
    pub fn new(
        id: GuardId,
        difficulty: u8,
        arena_size: u32,
        index: usize,
        config: &GuardConfig,
    ) -> Result<Self, GuardError> {
        let difficulty = Difficulty::new(difficulty)?;
        let patrol = PatrolPattern::perimeter(arena_size, config.patrol_margin, index)?;
        Ok(Self {
            id,
            difficulty,
            model: BehaviorModel::new(),
            position: patrol.start(),
            patrol,
            memory: ObservationMemory::new(config.memory_capacity),
            detection_radius: config.detection_radius_for(difficulty.get()),
            learning_rate: config.learning_rate_for(difficulty.get()),
            speed: config.speed,
            extractor: FeatureExtractor::new(arena_size, config.time_scale_secs),
            clock_ms: 0,
        })
    }

    /// Step toward the action's target, at most `speed` units
    pub fn advance(&mut self, action: &GuardAction) {
        let distance = self.position.distance_to(&action.target);
        if distance <= self.speed {
            self.position = action.target;
            if action.source == ActionSource::Patrol {
                self.patrol.advance();
            }
        } else if distance.is_finite() {
            let ratio = self.speed / distance;
            self.position = Position::new(
                self.position.x + (action.target.x - self.position.x) * ratio,
                self.position.y + (action.target.y - self.position.y) * ratio,
            );
        }
    }

    /// True if `position` is inside the detection radius, widened by
    /// `radius_bonus` and then scaled by `factor`
    pub fn detects(&self, position: &Position, radius_bonus: f64, factor: f64) -> bool {
        self.position.distance_to(position) <= (self.detection_radius + radius_bonus) * factor
    }
}

/// Where a guard predicted action comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSource {
    Model,
    Patrol,
}

/// A guard's next move
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuardAction {
    pub guard_id: GuardId,
    pub target: Position,
    /// Probability in [0, 1]
    pub confidence: f64,
    pub source: ActionSource,
    /// Player the guard is heading for, if any
    pub tracking: Option<PlayerId>,
}
