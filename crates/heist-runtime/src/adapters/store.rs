//! # In-Memory Snapshot Store
//!
//! Keeps a bounded history of snapshots per session, newest last. A write
//! older than the stored head is kept in history but never replaces it, so
//! a slow retry cannot roll a session back.

use async_trait::async_trait;
use heist_types::SessionId;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use tracing::debug;
use vh_04_session_coordinator::{SnapshotStore, StoreError, VersionedSnapshot};

/// Snapshots kept per session by default
const DEFAULT_HISTORY: usize = 16;

#[derive(Clone, Debug)]
struct StoredSnapshot {
    timestamp_ms: u64,
    snapshot: VersionedSnapshot,
}

pub struct InMemorySnapshotStore {
    sessions: RwLock<HashMap<SessionId, VecDeque<StoredSnapshot>>>,
    history: usize,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::with_history(DEFAULT_HISTORY)
    }

    pub fn with_history(history: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            history: history.max(1),
        }
    }

    /// Number of snapshots held for a session
    pub fn history_len(&self, session_id: &SessionId) -> usize {
        self.sessions
            .read()
            .get(session_id)
            .map_or(0, VecDeque::len)
    }

    /// Write time of the current head, if any
    pub fn latest_timestamp(&self, session_id: &SessionId) -> Option<u64> {
        self.sessions
            .read()
            .get(session_id)
            .and_then(|h| h.back())
            .map(|s| s.timestamp_ms)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn put(
        &self,
        session_id: SessionId,
        snapshot: &VersionedSnapshot,
        timestamp_ms: u64,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write();
        let history = sessions.entry(session_id).or_default();
        let revision = snapshot.revision();

        // Same revision twice is an overwrite
        if let Some(existing) = history.iter_mut().find(|s| s.snapshot.revision() == revision) {
            existing.snapshot = snapshot.clone();
            existing.timestamp_ms = timestamp_ms;
            return Ok(());
        }

        let entry = StoredSnapshot {
            timestamp_ms,
            snapshot: snapshot.clone(),
        };
        let position = history
            .iter()
            .position(|s| s.snapshot.revision() > revision)
            .unwrap_or(history.len());
        history.insert(position, entry);
        while history.len() > self.history {
            history.pop_front();
        }

        debug!(session_id = %session_id, revision, "Snapshot stored");
        Ok(())
    }

    async fn latest(&self, session_id: SessionId) -> Result<Option<VersionedSnapshot>, StoreError> {
        Ok(self
            .sessions
            .read()
            .get(&session_id)
            .and_then(|h| h.back())
            .map(|s| s.snapshot.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vh_04_session_coordinator::{CoordinatorConfig, Session, SessionBlueprint};

    fn snapshot_at(session: &Session, revision: u64) -> VersionedSnapshot {
        let mut snapshot = session.snapshot(std::time::Instant::now()).into_latest();
        snapshot.revision = revision;
        snapshot.into()
    }

    fn session() -> (SessionId, Session) {
        let config = CoordinatorConfig::default();
        let blueprint = SessionBlueprint::generate(5, 2, &config).unwrap();
        let id = SessionId::new();
        let now = std::time::Instant::now();
        (id, Session::new(id, blueprint, Arc::new(config), now))
    }

    #[tokio::test]
    async fn test_latest_is_highest_revision() {
        let store = InMemorySnapshotStore::new();
        let (id, session) = session();

        store.put(id, &snapshot_at(&session, 3), 10).await.unwrap();
        store.put(id, &snapshot_at(&session, 1), 11).await.unwrap();

        let latest = store.latest(id).await.unwrap().unwrap();
        assert_eq!(latest.revision(), 3);
        assert_eq!(store.latest_timestamp(&id), Some(10));
        assert_eq!(store.history_len(&id), 2);
    }

    #[tokio::test]
    async fn test_same_revision_overwrites() {
        let store = InMemorySnapshotStore::new();
        let (id, session) = session();

        store.put(id, &snapshot_at(&session, 2), 10).await.unwrap();
        store.put(id, &snapshot_at(&session, 2), 20).await.unwrap();
        assert_eq!(store.history_len(&id), 1);
        assert_eq!(store.latest_timestamp(&id), Some(20));
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let store = InMemorySnapshotStore::with_history(3);
        let (id, session) = session();
        for revision in 1..=10 {
            store
                .put(id, &snapshot_at(&session, revision), revision)
                .await
                .unwrap();
        }
        assert_eq!(store.history_len(&id), 3);
        assert_eq!(store.latest(id).await.unwrap().unwrap().revision(), 10);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let store = InMemorySnapshotStore::default();
        assert!(store.latest(SessionId::new()).await.unwrap().is_none());
        assert_eq!(store.session_count(), 0);
    }
}
