//! Error types for the Vault Generator

use heist_types::ParameterError;
use thiserror::Error;

/// Errors raised while generating or mutating a vault
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// Difficulty outside 1..=10
    #[error(transparent)]
    InvalidDifficulty(#[from] ParameterError),

    /// Size bounds are empty or inverted
    #[error("Invalid size bounds: min {min}, max {max}")]
    InvalidSizeBounds { min: u32, max: u32 },

    /// Base value bounds are empty or inverted
    #[error("Invalid value bounds: min {min}, max {max}")]
    InvalidValueBounds { min: u64, max: u64 },

    /// Treasure is not (or no longer) in the vault
    #[error("Treasure not found: {0}")]
    TreasureNotFound(heist_types::TreasureId),
}
