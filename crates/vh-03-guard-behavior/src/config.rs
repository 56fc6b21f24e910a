//! Configuration for the Guard Behavior Engine

use serde::{Deserialize, Serialize};

/// Guard learning and movement configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Observations retained per guard (oldest evicted first)
    pub memory_capacity: usize,
    /// Samples the model must see before it replaces the patrol pattern
    pub min_samples: u64,
    /// SGD step size at difficulty 1
    pub base_learning_rate: f64,
    /// Extra step size per difficulty level
    pub learning_rate_per_difficulty: f64,
    /// L2 regularization strength
    pub l2_penalty: f64,
    /// Detection radius at difficulty 1
    pub base_detection_radius: f64,
    /// Extra detection radius per difficulty level
    pub detection_radius_per_difficulty: f64,
    /// Distance a guard covers per advance
    pub speed: f64,
    /// Distance of the patrol loop from the vault walls
    pub patrol_margin: f64,
    /// Session time (seconds) that maps to feature value 1.0
    pub time_scale_secs: f64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            memory_capacity: 256,
            min_samples: 8,
            base_learning_rate: 0.05,
            learning_rate_per_difficulty: 0.01,
            l2_penalty: 1e-4,
            base_detection_radius: 2.0,
            detection_radius_per_difficulty: 0.3,
            speed: 3.0,
            patrol_margin: 1.0,
            time_scale_secs: 600.0,
        }
    }
}

impl GuardConfig {
    pub fn learning_rate_for(&self, difficulty: u8) -> f64 {
        self.base_learning_rate + self.learning_rate_per_difficulty * f64::from(difficulty.saturating_sub(1))
    }

    pub fn detection_radius_for(&self, difficulty: u8) -> f64 {
        self.base_detection_radius
            + self.detection_radius_per_difficulty * f64::from(difficulty.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GuardConfig::default();
        assert_eq!(config.memory_capacity, 256);
        assert_eq!(config.min_samples, 8);
        assert!((config.detection_radius_for(1) - 2.0).abs() < 1e-12);
        assert!(config.learning_rate_for(10) > config.learning_rate_for(1));
    }
}
