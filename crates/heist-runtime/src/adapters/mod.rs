//! # Collaborator Adapters
//!
//! In-process implementations of the coordinator's outbound ports.
//!
//! | Port | Adapter |
//! |------|---------|
//! | `SnapshotStore` | `InMemorySnapshotStore` |
//! | `LedgerSettlement` | `InMemoryLedger` |
//! | `CommandRouter` | `KeywordCommandRouter` |

mod ledger;
mod router;
mod store;

pub use ledger::InMemoryLedger;
pub use router::KeywordCommandRouter;
pub use store::InMemorySnapshotStore;
