//! Error types for the Reward Adjudicator

use heist_types::SessionState;
use thiserror::Error;

/// Ledger collaborator failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Ledger unreachable or overloaded; worth retrying
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// Ledger refused the plan; retrying will not help
    #[error("Ledger rejected settlement: {0}")]
    Rejected(String),
}

impl LedgerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_))
    }
}

/// Reward adjudication errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardError {
    /// Only completed sessions earn rewards
    #[error("Session not eligible for rewards: state is {state}")]
    NotEligible { state: SessionState },

    /// Settlement failed after all retries
    #[error("Settlement failed: {0}")]
    Settlement(#[from] LedgerError),
}

impl RewardError {
    /// True when resubmitting the same plan later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, RewardError::Settlement(e) if e.is_transient())
    }
}
