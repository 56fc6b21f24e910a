//! Error types for the Session Coordinator
//!
//! `SessionError` is the taxonomy callers see. Component errors convert into
//! it at the coordinator boundary.

use heist_types::{ParameterError, SessionId, SessionState};
use thiserror::Error;
use vh_01_vault_generator::VaultError;
use vh_02_puzzle_engine::PuzzleError;
use vh_03_guard_behavior::GuardError;
use vh_05_reward_adjudicator::RewardError;

/// Session-level errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Bad input to session creation (difficulty, generation bounds)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Request rejected without touching state
    #[error("Validation failure: {0}")]
    ValidationFailure(String),

    /// Collaborator unavailable after retries
    #[error("Transient infrastructure failure: {0}")]
    TransientInfrastructureFailure(String),

    /// Session is not active (terminal, failed, or its task stopped)
    #[error("Fatal session failure: {0}")]
    FatalSessionFailure(String),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),
}

impl SessionError {
    pub fn not_active(state: SessionState) -> Self {
        SessionError::FatalSessionFailure(format!("session is {state}"))
    }

    pub fn task_stopped() -> Self {
        SessionError::FatalSessionFailure("session task stopped".into())
    }
}

impl From<ParameterError> for SessionError {
    fn from(e: ParameterError) -> Self {
        SessionError::InvalidParameter(e.to_string())
    }
}

impl From<VaultError> for SessionError {
    fn from(e: VaultError) -> Self {
        SessionError::InvalidParameter(e.to_string())
    }
}

impl From<PuzzleError> for SessionError {
    fn from(e: PuzzleError) -> Self {
        SessionError::InvalidParameter(e.to_string())
    }
}

impl From<GuardError> for SessionError {
    fn from(e: GuardError) -> Self {
        SessionError::InvalidParameter(e.to_string())
    }
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        SessionError::TransientInfrastructureFailure(e.to_string())
    }
}

impl From<RouterError> for SessionError {
    fn from(e: RouterError) -> Self {
        SessionError::TransientInfrastructureFailure(e.to_string())
    }
}

impl From<RewardError> for SessionError {
    fn from(e: RewardError) -> Self {
        match e {
            RewardError::NotEligible { .. } => SessionError::ValidationFailure(e.to_string()),
            RewardError::Settlement(_) => {
                SessionError::TransientInfrastructureFailure(e.to_string())
            }
        }
    }
}

/// Snapshot store failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Snapshot store unavailable: {0}")]
    Unavailable(String),

    #[error("Snapshot serialization failed: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Command router failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("Command router unavailable: {0}")]
    Unavailable(String),
}

/// A broken domain invariant. Moves the session to `Failed`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("revision went from {before} to {after}")]
    RevisionNotIncreasing { before: u64, after: u64 },

    #[error("solved puzzle {0} reverted to unsolved")]
    SolvedReverted(heist_types::PuzzleId),

    #[error("collected value {collected} exceeds vault total {total}")]
    CollectedExceedsTotal { collected: u64, total: u64 },

    #[error("player {0} changed role")]
    RoleChanged(heist_types::PlayerId),

    #[error("guard {guard} holds {len} observations, capacity {capacity}")]
    GuardMemoryOverflow {
        guard: heist_types::GuardId,
        len: usize,
        capacity: usize,
    },

    #[error("illegal transition {from} → {to}")]
    IllegalTransition { from: SessionState, to: SessionState },
}
