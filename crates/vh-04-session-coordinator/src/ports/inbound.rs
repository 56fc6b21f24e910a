//! Driving Ports (API - Inbound)

use crate::domain::action::{ActionResult, PlayerAction};
use crate::domain::errors::SessionError;
use crate::domain::snapshot::SessionView;
use async_trait::async_trait;
use heist_types::{PlayerId, Role, SessionId};
use std::sync::Arc;

/// Session Coordinator API
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Generate a session from a fresh seed and start it
    async fn create_session(&self, difficulty: u8) -> Result<SessionId, SessionError>;

    /// Add a player with a fixed role at the vault entrance
    async fn join(&self, session: SessionId, role: Role) -> Result<PlayerId, SessionError>;

    async fn leave(&self, session: SessionId, player: PlayerId) -> Result<(), SessionError>;

    /// Refresh a player's heartbeat, reconnecting them if needed
    async fn heartbeat(&self, session: SessionId, player: PlayerId) -> Result<(), SessionError>;

    async fn disconnect(&self, session: SessionId, player: PlayerId) -> Result<(), SessionError>;

    /// Apply one action
    ///
    /// Only `FatalSessionFailure` (and `SessionNotFound`) are returned as
    /// `Err`. Validation problems come back as `success: false`.
    async fn submit_action(
        &self,
        session: SessionId,
        player: PlayerId,
        action: PlayerAction,
    ) -> Result<ActionResult, SessionError>;

    /// Route free text through the command router and apply the result
    async fn submit_command(
        &self,
        session: SessionId,
        player: PlayerId,
        text: &str,
    ) -> Result<ActionResult, SessionError>;

    /// Latest complete view. Never waits on the session task.
    fn get_snapshot(&self, session: SessionId) -> Result<Arc<SessionView>, SessionError>;

    /// Stop the session task and drop it from the registry
    async fn close(&self, session: SessionId) -> Result<(), SessionError>;
}
