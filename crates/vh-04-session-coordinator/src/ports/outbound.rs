//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::command::{CommandContext, RoutedCommand};
use crate::domain::errors::{RouterError, StoreError};
use crate::domain::snapshot::VersionedSnapshot;
use async_trait::async_trait;
use heist_types::SessionId;

/// Durable snapshot storage
///
/// `put` is retried by the caller; implementations should treat a repeated
/// write of the same revision as an overwrite.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn put(
        &self,
        session_id: SessionId,
        snapshot: &VersionedSnapshot,
        timestamp_ms: u64,
    ) -> Result<(), StoreError>;

    async fn latest(&self, session_id: SessionId) -> Result<Option<VersionedSnapshot>, StoreError>;
}

/// Free-text command interpretation
#[async_trait]
pub trait CommandRouter: Send + Sync {
    async fn route(
        &self,
        text: &str,
        context: &CommandContext,
    ) -> Result<RoutedCommand, RouterError>;
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks {
    use super::*;
    use parking_lot::RwLock;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// In-memory store that can be told to fail
    #[derive(Default)]
    pub struct MockSnapshotStore {
        snapshots: RwLock<HashMap<SessionId, VersionedSnapshot>>,
        failures_remaining: AtomicU32,
        always_fail: bool,
        pub writes: AtomicU32,
    }

    impl MockSnapshotStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail the next `count` writes
        pub fn failing(count: u32) -> Self {
            Self {
                failures_remaining: AtomicU32::new(count),
                ..Self::default()
            }
        }

        /// Fail every write
        pub fn unavailable() -> Self {
            Self {
                always_fail: true,
                ..Self::default()
            }
        }

        pub fn stored_revision(&self, session_id: &SessionId) -> Option<u64> {
            self.snapshots
                .read()
                .get(session_id)
                .map(VersionedSnapshot::revision)
        }

        pub fn insert(&self, snapshot: VersionedSnapshot) {
            self.snapshots.write().insert(snapshot.session_id(), snapshot);
        }
    }

    #[async_trait]
    impl SnapshotStore for MockSnapshotStore {
        async fn put(
            &self,
            session_id: SessionId,
            snapshot: &VersionedSnapshot,
            _timestamp_ms: u64,
        ) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.always_fail {
                return Err(StoreError::Unavailable("mock outage".into()));
            }
            let pending = self.failures_remaining.load(Ordering::SeqCst);
            if pending > 0 {
                self.failures_remaining.store(pending - 1, Ordering::SeqCst);
                return Err(StoreError::Unavailable("mock outage".into()));
            }

            let mut snapshots = self.snapshots.write();
            let newer = snapshots
                .get(&session_id)
                .map_or(true, |existing| existing.revision() <= snapshot.revision());
            if newer {
                snapshots.insert(session_id, snapshot.clone());
            }
            Ok(())
        }

        async fn latest(
            &self,
            session_id: SessionId,
        ) -> Result<Option<VersionedSnapshot>, StoreError> {
            if self.always_fail {
                return Err(StoreError::Unavailable("mock outage".into()));
            }
            Ok(self.snapshots.read().get(&session_id).cloned())
        }
    }

    /// Router that answers every line with the same command
    pub struct MockCommandRouter {
        response: Result<RoutedCommand, RouterError>,
        pub calls: AtomicU32,
    }

    impl MockCommandRouter {
        pub fn returning(command: RoutedCommand) -> Self {
            Self {
                response: Ok(command),
                calls: AtomicU32::new(0),
            }
        }

        pub fn unavailable() -> Self {
            Self {
                response: Err(RouterError::Unavailable("mock outage".into())),
                calls: AtomicU32::new(0),
            }
        }
    }

    impl Default for MockCommandRouter {
        fn default() -> Self {
            Self::returning(RoutedCommand::unrecognized())
        }
    }

    #[async_trait]
    impl CommandRouter for MockCommandRouter {
        async fn route(
            &self,
            _text: &str,
            _context: &CommandContext,
        ) -> Result<RoutedCommand, RouterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }
}
