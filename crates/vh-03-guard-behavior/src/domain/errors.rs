//! Error types for the Guard Behavior Engine

use heist_types::ParameterError;
use thiserror::Error;

/// Guard construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// Difficulty outside 1..=10
    #[error(transparent)]
    InvalidParameter(#[from] ParameterError),

    /// Vault too small to lay out a patrol loop
    #[error("Arena too small for a patrol: size {size}")]
    ArenaTooSmall { size: u32 },

    /// Persisted patrol with no waypoints or a cursor past the end
    #[error("Malformed patrol: {waypoints} waypoints, cursor {cursor}")]
    MalformedPatrol { waypoints: usize, cursor: usize },
}
