//! # In-Memory Ledger
//!
//! Settles reward plans into a local balance sheet. Idempotent on the
//! plan's `request_id`: a repeated submission returns the original
//! transaction reference with `Duplicate` status and credits nothing.

use async_trait::async_trait;
use heist_types::PlayerId;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;
use vh_05_reward_adjudicator::{
    LedgerError, LedgerSettlement, RewardPlan, SettlementReceipt, SettlementStatus,
};

#[derive(Default)]
struct Books {
    transactions: HashMap<Uuid, String>,
    balances: HashMap<PlayerId, u64>,
}

#[derive(Default)]
pub struct InMemoryLedger {
    books: Mutex<Books>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, player: &PlayerId) -> u64 {
        self.books.lock().balances.get(player).copied().unwrap_or(0)
    }

    pub fn transaction_count(&self) -> usize {
        self.books.lock().transactions.len()
    }
}

#[async_trait]
impl LedgerSettlement for InMemoryLedger {
    async fn submit(&self, plan: &RewardPlan) -> Result<SettlementReceipt, LedgerError> {
        let mut books = self.books.lock();
        if let Some(existing) = books.transactions.get(&plan.request_id) {
            return Ok(SettlementReceipt {
                transaction_ref: existing.clone(),
                status: SettlementStatus::Duplicate,
            });
        }

        let transaction_ref = format!(
            "tx-{}-{}",
            chrono::Utc::now().format("%Y%m%d%H%M%S"),
            &plan.request_id.simple().to_string()[..8]
        );
        for line in &plan.lines {
            *books.balances.entry(line.player_id).or_default() += line.amount;
        }
        books
            .transactions
            .insert(plan.request_id, transaction_ref.clone());

        info!(
            session_id = %plan.session_id,
            request_id = %plan.request_id,
            transaction_ref = %transaction_ref,
            total = plan.total,
            "Reward plan settled"
        );
        Ok(SettlementReceipt {
            transaction_ref,
            status: SettlementStatus::Accepted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heist_types::SessionId;
    use vh_05_reward_adjudicator::RewardLine;

    fn plan(amounts: &[u64]) -> RewardPlan {
        let lines: Vec<RewardLine> = amounts
            .iter()
            .map(|&amount| RewardLine {
                player_id: PlayerId::new(),
                amount,
                multiplier: 1.0,
                achievements: Vec::new(),
            })
            .collect();
        RewardPlan {
            request_id: Uuid::new_v4(),
            session_id: SessionId::new(),
            total: amounts.iter().sum(),
            lines,
        }
    }

    #[tokio::test]
    async fn test_settle_credits_players() {
        let ledger = InMemoryLedger::new();
        let plan = plan(&[100, 250]);
        let receipt = ledger.submit(&plan).await.unwrap();
        assert_eq!(receipt.status, SettlementStatus::Accepted);
        assert!(receipt.transaction_ref.starts_with("tx-"));
        assert_eq!(ledger.balance(&plan.lines[0].player_id), 100);
        assert_eq!(ledger.balance(&plan.lines[1].player_id), 250);
    }

    #[tokio::test]
    async fn test_resubmission_is_idempotent() {
        let ledger = InMemoryLedger::new();
        let plan = plan(&[100]);
        let first = ledger.submit(&plan).await.unwrap();
        let second = ledger.submit(&plan).await.unwrap();

        assert_eq!(second.status, SettlementStatus::Duplicate);
        assert_eq!(first.transaction_ref, second.transaction_ref);
        assert_eq!(ledger.balance(&plan.lines[0].player_id), 100);
        assert_eq!(ledger.transaction_count(), 1);
    }
}
