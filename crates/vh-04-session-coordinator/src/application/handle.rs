use super::actor::SessionCommand;
use crate::domain::action::{ActionResult, PlayerAction};
use crate::domain::command::CommandContext;
use crate::domain::errors::SessionError;
use crate::domain::snapshot::SessionView;
use heist_types::{PlayerId, Role, SessionId, SessionState};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Cheap, cloneable entry point to one running session
#[derive(Clone, Debug)]
pub struct SessionHandle {
    session_id: SessionId,
    commands: mpsc::Sender<SessionCommand>,
    view: watch::Receiver<Arc<SessionView>>,
}

impl SessionHandle {
    pub(crate) fn new(
        session_id: SessionId,
        commands: mpsc::Sender<SessionCommand>,
        view: watch::Receiver<Arc<SessionView>>,
    ) -> Self {
        Self {
            session_id,
            commands,
            view,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Last published view. Does not wait on the session task.
    pub fn view(&self) -> Arc<SessionView> {
        self.view.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.view.borrow().state
    }

    /// Receiver that wakes on every published view
    pub fn subscribe_view(&self) -> watch::Receiver<Arc<SessionView>> {
        self.view.clone()
    }

    /// Whether the session task has exited
    pub fn is_stopped(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, SessionError>>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| SessionError::task_stopped())?;
        response.await.map_err(|_| SessionError::task_stopped())?
    }

    pub async fn join(&self, role: Role) -> Result<PlayerId, SessionError> {
        self.request(|reply| SessionCommand::Join { role, reply })
            .await
    }

    pub async fn leave(&self, player: PlayerId) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Leave { player, reply })
            .await
    }

    pub async fn heartbeat(&self, player: PlayerId) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Heartbeat { player, reply })
            .await
    }

    pub async fn disconnect(&self, player: PlayerId) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Disconnect { player, reply })
            .await
    }

    pub async fn submit(
        &self,
        player: PlayerId,
        action: PlayerAction,
    ) -> Result<ActionResult, SessionError> {
        self.request(|reply| SessionCommand::Submit {
            player,
            action,
            reply,
        })
        .await
    }

    /// What the command router needs to know about a player
    pub async fn context(&self, player: PlayerId) -> Result<CommandContext, SessionError> {
        self.request(|reply| SessionCommand::Context { player, reply })
            .await
    }

    /// Run one maintenance pass and wait for it
    pub async fn tick(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Tick { reply }).await
    }

    /// Abandon if still running, write a final snapshot, stop the task
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Shutdown { reply })
            .await
    }
}
