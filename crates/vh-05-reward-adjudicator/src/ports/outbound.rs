//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::entities::{RewardPlan, SettlementReceipt};
use crate::domain::errors::LedgerError;
use async_trait::async_trait;

/// External reward ledger.
///
/// Implementations must be idempotent on `plan.request_id`: resubmitting a
/// plan returns the original transaction reference.
#[async_trait]
pub trait LedgerSettlement: Send + Sync {
    async fn submit(&self, plan: &RewardPlan) -> Result<SettlementReceipt, LedgerError>;
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks {
    use super::*;
    use crate::domain::entities::SettlementStatus;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// In-memory ledger that can be told to fail the next N submissions.
    #[derive(Default)]
    pub struct MockLedger {
        settled: Mutex<HashMap<Uuid, String>>,
        failures_remaining: AtomicU32,
        reject: bool,
        pub submissions: AtomicU32,
    }

    impl MockLedger {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail the next `count` submissions with `Unavailable`.
        pub fn failing(count: u32) -> Self {
            Self {
                failures_remaining: AtomicU32::new(count),
                ..Self::default()
            }
        }

        /// Reject every submission permanently.
        pub fn rejecting() -> Self {
            Self {
                reject: true,
                ..Self::default()
            }
        }

        pub fn settled_count(&self) -> usize {
            self.settled.lock().map(|s| s.len()).unwrap_or(0)
        }
    }

    #[async_trait]
    impl LedgerSettlement for MockLedger {
        async fn submit(&self, plan: &RewardPlan) -> Result<SettlementReceipt, LedgerError> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err(LedgerError::Rejected("mock rejection".into()));
            }
            let pending = self.failures_remaining.load(Ordering::SeqCst);
            if pending > 0 {
                self.failures_remaining.store(pending - 1, Ordering::SeqCst);
                return Err(LedgerError::Unavailable("mock outage".into()));
            }

            let mut settled = self
                .settled
                .lock()
                .map_err(|_| LedgerError::Unavailable("poisoned".into()))?;
            if let Some(existing) = settled.get(&plan.request_id) {
                return Ok(SettlementReceipt {
                    transaction_ref: existing.clone(),
                    status: SettlementStatus::Duplicate,
                });
            }
            let transaction_ref = format!("tx-{}", plan.request_id.simple());
            settled.insert(plan.request_id, transaction_ref.clone());
            Ok(SettlementReceipt {
                transaction_ref,
                status: SettlementStatus::Accepted,
            })
        }
    }
}
