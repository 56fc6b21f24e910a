//! # Error Types
//!
//! Parameter errors shared by every subsystem. They all belong to the
//! `InvalidParameter` class: rejected at construction, never partially
//! applied.

use thiserror::Error;

/// Out-of-range or malformed input to a constructor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// Difficulty outside 1..=10.
    #[error("Difficulty out of range: {value} not within 1..=10")]
    DifficultyOutOfRange { value: u8 },

    /// Role name not in the fixed role set.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Identifier text is not a UUID.
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),
}
