//! Configuration for the Puzzle Engine

use serde::{Deserialize, Serialize};

/// Puzzle generation and scoring configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PuzzleConfig {
    /// Success threshold at difficulty 1
    pub base_threshold: f64,
    /// Threshold increase per difficulty step
    pub threshold_step: f64,
    /// Threshold ceiling
    pub max_threshold: f64,
    /// Hidden key length for encryption puzzles at difficulty 1
    pub min_key_length: usize,
    /// Longest operation sequence accepted by `score` (anti-DoS)
    pub max_operations: usize,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            base_threshold: 0.80,
            threshold_step: 0.01,
            max_threshold: 0.95,
            min_key_length: 2,
            max_operations: 128,
        }
    }
}

impl PuzzleConfig {
    /// Success threshold for a difficulty in 1..=10
    pub fn threshold_for(&self, difficulty: u8) -> f64 {
        let steps = f64::from(difficulty.saturating_sub(1));
        (self.base_threshold + self.threshold_step * steps).min(self.max_threshold)
    }

    /// Hidden key length for encryption puzzles
    pub fn key_length_for(&self, difficulty: u8) -> usize {
        self.min_key_length + usize::from(difficulty / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PuzzleConfig::default();
        assert_eq!(config.max_operations, 128);
        assert!((config.threshold_for(1) - 0.80).abs() < 1e-12);
        assert!((config.threshold_for(6) - 0.85).abs() < 1e-12);
        assert!(config.threshold_for(10) <= config.max_threshold);
    }

    #[test]
    fn test_key_length_grows_with_difficulty() {
        let config = PuzzleConfig::default();
        assert!(config.key_length_for(10) > config.key_length_for(1));
    }
}
