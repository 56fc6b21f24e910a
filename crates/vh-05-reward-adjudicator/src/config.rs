//! Configuration for the Reward Adjudicator

use heist_types::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Reward formula and settlement retry configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Amount every participant of a completed session earns
    pub base_reward: u64,
    /// Difficulty above which the high-difficulty multiplier applies
    pub high_difficulty_above: u8,
    pub high_difficulty_multiplier: f64,
    /// Multiplier for players holding `QuantumMastery`
    pub quantum_mastery_multiplier: f64,
    /// Backoff for ledger submissions
    pub retry: RetryPolicy,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            base_reward: 1_000,
            high_difficulty_above: 5,
            high_difficulty_multiplier: 1.5,
            quantum_mastery_multiplier: 2.0,
            retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RewardConfig::default();
        assert_eq!(config.base_reward, 1_000);
        assert_eq!(config.high_difficulty_above, 5);
        assert_eq!(config.high_difficulty_multiplier, 1.5);
        assert_eq!(config.quantum_mastery_multiplier, 2.0);
    }
}
