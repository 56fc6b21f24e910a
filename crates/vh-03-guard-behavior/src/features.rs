//! Feature extraction
//!
//! Maps an observation (where, when) into a fixed-size vector:
//! `[x / size, y / size, elapsed / time_scale, 1.0]`. The trailing constant
//! is the bias input.

use heist_types::{ActionRecord, Position};
use serde::{Deserialize, Serialize};

pub const FEATURE_COUNT: usize = 4;

pub type FeatureVector = [f64; FEATURE_COUNT];

/// Normalizes positions and session time into model inputs
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureExtractor {
    arena_size: f64,
    time_scale_ms: f64,
}

impl FeatureExtractor {
    pub fn new(arena_size: u32, time_scale_secs: f64) -> Self {
        Self {
            arena_size: f64::from(arena_size.max(1)),
            time_scale_ms: (time_scale_secs * 1000.0).max(1.0),
        }
    }

    pub fn at(&self, position: &Position, elapsed_ms: u64) -> FeatureVector {
        [
            position.x / self.arena_size,
            position.y / self.arena_size,
            elapsed_ms as f64 / self.time_scale_ms,
            1.0,
        ]
    }

    /// Features and binary label for one action record
    pub fn extract(&self, record: &ActionRecord) -> (FeatureVector, bool) {
        (
            self.at(&record.position, record.elapsed_ms),
            record.outcome.is_success(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heist_types::{ActionKind, ActionOutcome, PlayerId};

    #[test]
    fn test_extract_normalizes() {
        let extractor = FeatureExtractor::new(20, 10.0);
        let record = ActionRecord {
            player_id: PlayerId::new(),
            kind: ActionKind::Move,
            payload: String::new(),
            timestamp_ms: 0,
            elapsed_ms: 5_000,
            position: Position::new(10.0, 5.0),
            outcome: ActionOutcome::Failure,
        };

        let (features, label) = extractor.extract(&record);
        assert_eq!(features, [0.5, 0.25, 0.5, 1.0]);
        assert!(!label);
    }
}
