//! # Vault Heist Runtime
//!
//! Wires the session coordinator to in-process collaborators and runs the
//! background tasks a deployment needs.
//!
//! ## Modular Structure
//!
//! - `adapters/` - In-memory store and ledger, keyword command router
//! - `config` - `RuntimeConfig` with environment overrides
//! - `console` - Line-oriented player console
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Initialize telemetry (logs and metrics)
//! 3. Build the session manager and its collaborators
//! 4. Start the event logger and the pruning loop
//! 5. Create the console session and read input until EOF or Ctrl-C

pub mod adapters;
pub mod config;
pub mod console;

use std::sync::Arc;

use anyhow::{Context, Result};
use heist_bus::{EventFilter, InMemoryEventBus, SessionEvent};
use heist_telemetry::log_session_event;
use heist_types::SessionId;
use tokio::sync::watch;
use tracing::{error, info, warn};
use vh_04_session_coordinator::{SessionApi, SessionManager};

use crate::adapters::{InMemoryLedger, InMemorySnapshotStore, KeywordCommandRouter};
use crate::config::RuntimeConfig;

pub struct HeistRuntime {
    config: RuntimeConfig,
    manager: Arc<SessionManager>,
    store: Arc<InMemorySnapshotStore>,
    ledger: Arc<InMemoryLedger>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl HeistRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        info!("Creating vault heist runtime");

        let store = Arc::new(InMemorySnapshotStore::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let manager = Arc::new(SessionManager::new(
            config.coordinator.clone(),
            store.clone(),
            ledger.clone(),
            Arc::new(KeywordCommandRouter::new()),
            Arc::new(InMemoryEventBus::new()),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            manager,
            store,
            ledger,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Start background tasks
    pub fn start(&self) {
        self.spawn_event_logger();
        self.spawn_pruner();
        info!(
            difficulty = self.config.difficulty,
            idle_timeout_ms = self.config.coordinator.idle_timeout_ms,
            guard_cadence = ?self.config.coordinator.guard_cadence,
            "Runtime started"
        );
    }

    /// Create a session with the configured difficulty and seed
    pub async fn create_session(&self) -> Result<SessionId> {
        let session = match self.config.seed {
            Some(seed) => {
                self.manager
                    .create_session_with_seed(self.config.difficulty, seed)
                    .await
            }
            None => self.manager.create_session(self.config.difficulty).await,
        };
        session.context("Failed to create session")
    }

    pub fn manager(&self) -> Arc<SessionManager> {
        Arc::clone(&self.manager)
    }

    pub fn store(&self) -> &InMemorySnapshotStore {
        &self.store
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    /// Close every session and stop background tasks
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        self.manager.shutdown_all().await;
        info!("Shutdown complete");
    }

    fn spawn_event_logger(&self) {
        let mut subscription = self.manager.bus().subscribe(EventFilter::all());
        let mut shutdown = self.shutdown_rx.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = subscription.recv() => match event {
                        Some(event) => {
                            if subscription.take_resync() {
                                warn!(missed = subscription.missed(), "Event logger fell behind");
                            }
                            log_event(&event);
                        }
                        None => break,
                    },
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    fn spawn_pruner(&self) {
        let manager = Arc::clone(&self.manager);
        let mut shutdown = self.shutdown_rx.clone();
        let period = self.config.prune_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        manager.prune_terminated().await;
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });
    }
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::SessionCreated {
            session_id,
            difficulty,
            seed,
        } => log_session_event!(info, session_id, "Session created", difficulty, seed),
        SessionEvent::SessionTerminated {
            session_id,
            state,
            revision,
        } => log_session_event!(info, session_id, "Session ended", state = %state, revision),
        SessionEvent::StateDelta {
            session_id,
            revision,
            player_id,
            message,
            ..
        } => log_session_event!(
            debug,
            session_id,
            "State changed",
            revision,
            player_id = %player_id,
            detail = %message
        ),
        SessionEvent::GuardsAdvanced {
            session_id,
            revision,
            guards,
        } => log_session_event!(
            debug,
            session_id,
            "Guards advanced",
            revision,
            guards = guards.len()
        ),
        SessionEvent::PersistenceFailed {
            session_id,
            consecutive_failures,
            reason,
            ..
        } => log_session_event!(
            warn,
            session_id,
            "Snapshot not stored",
            consecutive_failures,
            reason = %reason
        ),
        SessionEvent::RewardSettled {
            session_id,
            transaction_ref,
            total,
            ..
        } => log_session_event!(
            info,
            session_id,
            "Rewards settled",
            transaction_ref = %transaction_ref,
            total
        ),
        SessionEvent::SettlementFailed {
            session_id,
            reason,
            retrying,
            ..
        } => log_session_event!(
            warn,
            session_id,
            "Settlement failed",
            reason = %reason,
            retrying
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Console;
    use heist_types::SessionState;
    use vh_04_session_coordinator::SnapshotStore;

    fn runtime() -> HeistRuntime {
        let config = RuntimeConfig {
            seed: Some(11),
            difficulty: 2,
            ..RuntimeConfig::default()
        };
        HeistRuntime::new(config)
    }

    #[tokio::test]
    async fn test_console_session_flow() {
        let runtime = runtime();
        runtime.start();
        let session = runtime.create_session().await.unwrap();
        let mut console = Console::new(runtime.manager(), session);

        let reply = console.handle_line("scan").await.unwrap();
        assert!(reply.text.contains("join first"));

        let reply = console.handle_line("join strategist").await.unwrap();
        assert!(reply.text.starts_with("joined as strategist"));
        assert!(console.player().is_some());

        let reply = console.handle_line("scan").await.unwrap();
        assert!(reply.text.starts_with("[ok]"));

        let reply = console.handle_line("move to 1 1").await.unwrap();
        assert!(reply.text.starts_with("[ok]"), "{}", reply.text);

        let reply = console.handle_line("status").await.unwrap();
        assert!(reply.text.starts_with("active"));
        assert!(reply.text.contains("players 1/1"));

        let reply = console.handle_line("dance").await.unwrap();
        assert!(reply.text.starts_with("[no]"));

        let reply = console.handle_line("join hacker").await.unwrap();
        assert_eq!(reply.text, "already joined");

        let reply = console.handle_line("quit").await.unwrap();
        assert!(reply.quit);

        runtime.shutdown().await;
        let view = runtime.manager().get_snapshot(session);
        assert!(view.is_err());
        assert_eq!(
            runtime
                .store()
                .latest(session)
                .await
                .unwrap()
                .unwrap()
                .into_latest()
                .state,
            SessionState::Abandoned
        );
    }

    #[tokio::test]
    async fn test_seeded_sessions_match() {
        let runtime = runtime();
        let a = runtime.create_session().await.unwrap();
        let b = runtime.create_session().await.unwrap();
        let manager = runtime.manager();
        let (a, b) = (
            manager.get_snapshot(a).unwrap(),
            manager.get_snapshot(b).unwrap(),
        );
        assert_eq!(a.seed, 11);
        assert_eq!(a.treasures, b.treasures);
    }
}
