//! Commands accepted by the engine's event loop, and the cloneable handle
//! used to send them.

use cloudburst_sources::{DeployTarget, StreamEvent};
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::{Error, Result};
use crate::state::ViewState;

/// Why a refresh cycle was requested. All reasons are handled identically;
/// the distinction exists for logging.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RefreshReason {
    /// The local countdown wrapped around.
    Scheduled,
    /// A recognized push message arrived.
    Push,
    /// Explicit user action.
    Manual,
}

/// One unit of work for the event loop. Every trigger in the system funnels
/// through this queue, which is what makes at-most-one-refresh-in-flight
/// hold.
#[derive(Debug)]
pub(crate) enum Command {
    Refresh(RefreshReason),
    SelectNode(String),
    SetStage { target: DeployTarget, active: bool },
    StreamEvent(StreamEvent),
    StreamConnected(bool),
    RecentEvents(oneshot::Sender<Vec<StreamEvent>>),
}

/// Cheap cloneable handle onto a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    pub(crate) commands: mpsc::Sender<Command>,
    pub(crate) view: watch::Receiver<ViewState>,
}

impl EngineHandle {
    /// Latest published view state.
    #[must_use]
    pub fn view(&self) -> ViewState {
        self.view.borrow().clone()
    }

    /// Watch channel for view updates.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ViewState> {
        self.view.clone()
    }

    /// Request an immediate refresh cycle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineStopped`] if the event loop is gone.
    pub async fn request_refresh(&self) -> Result<()> {
        self.send(Command::Refresh(RefreshReason::Manual)).await
    }

    /// Change the node whose weather is displayed and refresh.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineStopped`] if the event loop is gone.
    pub async fn select_node(&self, node: impl Into<String> + Send) -> Result<()> {
        self.send(Command::SelectNode(node.into())).await
    }

    /// Toggle stage-2 (aerostat) deployment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineStopped`] if the event loop is gone.
    pub async fn set_stage2(&self, active: bool) -> Result<()> {
        self.send(Command::SetStage {
            target: DeployTarget::Aerostat,
            active,
        })
        .await
    }

    /// Toggle stage-3 (drone) deployment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineStopped`] if the event loop is gone.
    pub async fn set_stage3(&self, active: bool) -> Result<()> {
        self.send(Command::SetStage {
            target: DeployTarget::Drone,
            active,
        })
        .await
    }

    /// The most recent push events, newest first (bounded window).
    ///
    /// # Errors
    ///
    /// Returns [`Error::EngineStopped`] if the event loop is gone.
    pub async fn recent_events(&self) -> Result<Vec<StreamEvent>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::RecentEvents(tx)).await?;
        rx.await.map_err(|_| Error::EngineStopped)
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::EngineStopped)
    }
}
