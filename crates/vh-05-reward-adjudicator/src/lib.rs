//! # VH-05: Reward Adjudicator
//!
//! Turns a completed session into a reward plan and settles it on an
//! external ledger.
//!
//! ## Reward Formula
//!
//! ```text
//! amount = base_reward
//!        × 1.5   if difficulty > 5
//!        × 2.0   if the player holds QuantumMastery
//! ```
//!
//! Only `Completed` sessions are eligible. Settlement retries transient
//! ledger failures with exponential backoff; the plan's `request_id` makes
//! every retry idempotent on the ledger side. A failed settlement never
//! reverts the session outcome.

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::RewardConfig;
pub use domain::entities::{
    Achievement, PlayerOutcome, RewardLine, RewardPlan, SessionOutcome, SettlementReceipt,
    SettlementStatus,
};
pub use domain::errors::{LedgerError, RewardError};
pub use ports::{LedgerSettlement, RewardApi};
pub use service::RewardAdjudicator;
