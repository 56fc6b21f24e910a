//! Reward Adjudicator Service

use crate::config::RewardConfig;
use crate::domain::entities::{
    Achievement, RewardLine, RewardPlan, SessionOutcome, SettlementReceipt,
};
use crate::domain::errors::{LedgerError, RewardError};
use crate::ports::inbound::RewardApi;
use crate::ports::outbound::LedgerSettlement;
use async_trait::async_trait;
use heist_types::{retry_with_backoff_when, SessionState};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Computes reward plans and settles them on the ledger
pub struct RewardAdjudicator {
    config: RewardConfig,
    ledger: Arc<dyn LedgerSettlement>,
}

impl RewardAdjudicator {
    pub fn new(ledger: Arc<dyn LedgerSettlement>) -> Self {
        Self::with_config(RewardConfig::default(), ledger)
    }

    pub fn with_config(config: RewardConfig, ledger: Arc<dyn LedgerSettlement>) -> Self {
        Self { config, ledger }
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    fn multiplier_for(&self, difficulty: u8, achievements: &[Achievement]) -> f64 {
        let mut multiplier = 1.0;
        if difficulty > self.config.high_difficulty_above {
            multiplier *= self.config.high_difficulty_multiplier;
        }
        if achievements.contains(&Achievement::QuantumMastery) {
            multiplier *= self.config.quantum_mastery_multiplier;
        }
        multiplier
    }
}

#[async_trait]
impl RewardApi for RewardAdjudicator {
    fn adjudicate(&self, outcome: &SessionOutcome) -> Result<RewardPlan, RewardError> {
        if outcome.state != SessionState::Completed {
            return Err(RewardError::NotEligible {
                state: outcome.state,
            });
        }

        let difficulty = outcome.difficulty.get();
        let lines: Vec<RewardLine> = outcome
            .players
            .iter()
            .map(|player| {
                let multiplier = self.multiplier_for(difficulty, &player.achievements);
                RewardLine {
                    player_id: player.player_id,
                    amount: (self.config.base_reward as f64 * multiplier).round() as u64,
                    multiplier,
                    achievements: player.achievements.clone(),
                }
            })
            .collect();
        let total = lines.iter().map(|line| line.amount).sum();

        let plan = RewardPlan {
            request_id: Uuid::new_v4(),
            session_id: outcome.session_id,
            lines,
            total,
        };

        info!(
            session_id = %plan.session_id,
            request_id = %plan.request_id,
            players = plan.lines.len(),
            total = plan.total,
            "Reward plan computed"
        );

        Ok(plan)
    }

    async fn settle(&self, plan: &RewardPlan) -> Result<SettlementReceipt, RewardError> {
        let receipt = retry_with_backoff_when(
            &self.config.retry,
            "ledger_settlement",
            LedgerError::is_transient,
            |_| self.ledger.submit(plan),
        )
        .await
        .map_err(|e| {
            warn!(
                session_id = %plan.session_id,
                request_id = %plan.request_id,
                error = %e,
                "Reward settlement failed"
            );
            RewardError::from(e)
        })?;

        info!(
            session_id = %plan.session_id,
            request_id = %plan.request_id,
            transaction_ref = %receipt.transaction_ref,
            status = ?receipt.status,
            "Rewards settled"
        );

        Ok(receipt)
    }
}
