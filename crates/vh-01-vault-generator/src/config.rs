//! Configuration for the Vault Generator

use serde::{Deserialize, Serialize};

/// Vault generation configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Smallest floor side length
    pub min_size: u32,
    /// Largest floor side length
    pub max_size: u32,
    /// Lower bound of the per-treasure base value
    pub min_base_value: u64,
    /// Upper bound of the per-treasure base value
    pub max_base_value: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            min_size: 10,
            max_size: 50,
            min_base_value: 100,
            max_base_value: 1000,
        }
    }
}
