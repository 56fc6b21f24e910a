//! Error types for the Puzzle Engine

use thiserror::Error;

/// All errors that can occur while generating or scoring puzzles
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PuzzleError {
    /// Difficulty outside 1..=10
    #[error("Invalid difficulty: {0} not within 1..=10")]
    InvalidDifficulty(u8),

    /// Qubit count outside 1..=5
    #[error("Invalid qubit count: {0} not within 1..=5")]
    InvalidQubitCount(u8),

    /// Gate not allowed for this puzzle or addressing a missing qubit
    #[error("Invalid operation {op}: {reason}")]
    InvalidOperation { op: String, reason: String },

    /// Operation text could not be parsed
    #[error("Unparseable operation: {0}")]
    Unparseable(String),

    /// Too many operations submitted
    #[error("Operation sequence too long: {len} > {max}")]
    TooManyOperations { len: usize, max: usize },

    /// State vector dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// State vector has zero or non-finite norm
    #[error("State vector cannot be normalized")]
    Unnormalizable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PuzzleError::TooManyOperations { len: 200, max: 128 };
        assert_eq!(err.to_string(), "Operation sequence too long: 200 > 128");
    }

    #[test]
    fn test_invalid_qubit_error() {
        assert_eq!(
            PuzzleError::InvalidQubitCount(9).to_string(),
            "Invalid qubit count: 9 not within 1..=5"
        );
    }
}
