//! Driving Ports (API - Inbound)

use crate::domain::entities::{RewardPlan, SessionOutcome, SettlementReceipt};
use crate::domain::errors::RewardError;
use async_trait::async_trait;

/// Reward Adjudicator API
#[async_trait]
pub trait RewardApi: Send + Sync {
    /// Compute per-player rewards. Only completed sessions are eligible.
    fn adjudicate(&self, outcome: &SessionOutcome) -> Result<RewardPlan, RewardError>;

    /// Submit a plan to the ledger, retrying transient failures.
    async fn settle(&self, plan: &RewardPlan) -> Result<SettlementReceipt, RewardError>;
}
