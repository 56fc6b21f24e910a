//! # Runtime Configuration
//!
//! Coordinator defaults with environment overrides. Unparseable values are
//! logged and ignored.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `HEIST_DIFFICULTY` | difficulty of the console session (1-10) |
//! | `HEIST_SEED` | generation seed (random if unset) |
//! | `HEIST_IDLE_TIMEOUT_SECS` | `idle_timeout_ms` |
//! | `HEIST_HEARTBEAT_TIMEOUT_SECS` | `heartbeat_timeout_ms` |
//! | `HEIST_TICK_MS` | `tick_interval_ms` |
//! | `HEIST_GUARD_CADENCE` | `tick` or an action count |
//! | `HEIST_MAX_PLAYERS` | `max_players` |
//! | `HEIST_SETTLEMENT_RETRY_SECS` | `settlement_retry_ms` |
//! | `HEIST_PRUNE_INTERVAL_SECS` | how often finished sessions are dropped |

use heist_types::{Difficulty, ParameterError};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use vh_04_session_coordinator::{CoordinatorConfig, GuardCadence};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid difficulty: {0}")]
    Difficulty(#[from] ParameterError),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub coordinator: CoordinatorConfig,
    pub difficulty: u8,
    pub seed: Option<u64>,
    pub prune_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            coordinator: CoordinatorConfig::default(),
            difficulty: 3,
            seed: None,
            prune_interval: Duration::from_secs(30),
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string());

        if let Some(d) = parsed::<u8>(&read, "HEIST_DIFFICULTY") {
            config.difficulty = d;
        }
        if let Some(seed) = parsed::<u64>(&read, "HEIST_SEED") {
            config.seed = Some(seed);
        }
        if let Some(secs) = parsed::<u64>(&read, "HEIST_IDLE_TIMEOUT_SECS") {
            config.coordinator.idle_timeout_ms = secs.saturating_mul(1_000);
        }
        if let Some(secs) = parsed::<u64>(&read, "HEIST_HEARTBEAT_TIMEOUT_SECS") {
            config.coordinator.heartbeat_timeout_ms = secs.saturating_mul(1_000);
        }
        if let Some(ms) = parsed::<u64>(&read, "HEIST_TICK_MS") {
            config.coordinator.tick_interval_ms = ms;
        }
        if let Some(players) = parsed::<usize>(&read, "HEIST_MAX_PLAYERS") {
            config.coordinator.max_players = players;
        }
        if let Some(secs) = parsed::<u64>(&read, "HEIST_SETTLEMENT_RETRY_SECS") {
            config.coordinator.settlement_retry_ms = secs.saturating_mul(1_000);
        }
        if let Some(secs) = parsed::<u64>(&read, "HEIST_PRUNE_INTERVAL_SECS") {
            config.prune_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(raw) = read("HEIST_GUARD_CADENCE") {
            match raw.to_ascii_lowercase().as_str() {
                "tick" => config.coordinator.guard_cadence = GuardCadence::Tick,
                other => match other.parse::<u32>() {
                    Ok(n) if n > 0 => {
                        config.coordinator.guard_cadence = GuardCadence::EveryActions(n)
                    }
                    _ => warn!(key = "HEIST_GUARD_CADENCE", value = %raw, "Ignoring invalid setting"),
                },
            }
        }
        config
    }

    /// Reject settings the coordinator cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        Difficulty::new(self.difficulty)?;
        if self.coordinator.max_players == 0 {
            return Err(ConfigError::Zero("max_players"));
        }
        if self.coordinator.idle_timeout_ms == 0 {
            return Err(ConfigError::Zero("idle_timeout"));
        }
        Ok(())
    }
}

fn parsed<T: FromStr>(read: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = read(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring invalid setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::from_lookup(|_| None);
        assert_eq!(config.difficulty, 3);
        assert!(config.seed.is_none());
        assert_eq!(config.coordinator, CoordinatorConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("HEIST_DIFFICULTY", "7"),
            ("HEIST_SEED", " 42 "),
            ("HEIST_IDLE_TIMEOUT_SECS", "60"),
            ("HEIST_GUARD_CADENCE", "tick"),
            ("HEIST_MAX_PLAYERS", "4"),
            ("HEIST_SETTLEMENT_RETRY_SECS", "5"),
        ]));
        assert_eq!(config.difficulty, 7);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.coordinator.idle_timeout_ms, 60_000);
        assert_eq!(config.coordinator.guard_cadence, GuardCadence::Tick);
        assert_eq!(config.coordinator.max_players, 4);
        assert_eq!(config.coordinator.settlement_retry_ms, 5_000);
    }

    #[test]
    fn test_invalid_values_ignored() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("HEIST_SEED", "lots"),
            ("HEIST_GUARD_CADENCE", "0"),
            ("HEIST_TICK_MS", "-5"),
        ]));
        assert!(config.seed.is_none());
        assert_eq!(config.coordinator.guard_cadence, GuardCadence::EveryActions(5));
        assert_eq!(config.coordinator.tick_interval_ms, 1_000);

        let cadence = RuntimeConfig::from_lookup(lookup(&[("HEIST_GUARD_CADENCE", "2")]));
        assert_eq!(
            cadence.coordinator.guard_cadence,
            GuardCadence::EveryActions(2)
        );
    }

    #[test]
    fn test_validate() {
        let config = RuntimeConfig::from_lookup(lookup(&[("HEIST_DIFFICULTY", "11")]));
        assert!(matches!(config.validate(), Err(ConfigError::Difficulty(_))));

        let config = RuntimeConfig::from_lookup(lookup(&[("HEIST_MAX_PLAYERS", "0")]));
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "max_players must be greater than zero"
        );
    }
}
