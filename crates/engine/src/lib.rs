//! Real-time telemetry aggregation engine for the cloudburst dashboard.
//!
//! Reconciles push notifications with periodic polling, merges the three
//! backend payloads into one consistent [`ViewState`], maintains bounded
//! rolling history, classifies risk, and recovers from connection loss.
//! Everything runs on one event loop task: timer ticks, push events, and
//! user actions all funnel through a single command queue, so at most one
//! refresh pipeline is ever in flight.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod aggregate;
mod command;
mod error;
mod history;
mod risk;
mod scheduler;
mod state;
mod supervisor;

pub use command::{EngineHandle, RefreshReason};
pub use error::{Error, Result};
pub use history::{HISTORY_LEN, HistorySeries, HistoryView};
pub use risk::{MAX_PREDICTION_PCT, RiskTier, clamp_score, classify};
pub use state::{MAX_SATELLITE_ROWS, SatelliteRisk, SatelliteRow, ViewState, WeatherView};

use std::collections::VecDeque;
use std::time::Duration;

use chrono::Utc;
use cloudburst_sources::{
    DeployAction, DeployRequest, DeployTarget, ManualStageRequest, StreamEvent, TelemetrySources,
};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::aggregate::CycleInputs;
use crate::command::Command;
use crate::history::Histories;
use crate::scheduler::Countdown;

/// Commands buffered between handles and the event loop.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Recent push events retained for inspection.
const EVENT_LOG_CAPACITY: usize = 200;

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Node whose weather is displayed initially.
    pub selected_node: String,
    /// Seconds between scheduled refreshes; 0 disables the local countdown.
    pub refresh_countdown_secs: u32,
    /// Delay before re-establishing a dropped push subscription.
    pub reconnect_delay: Duration,
    /// Originator tag sent with write operations.
    pub by: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            selected_node: "node0".to_string(),
            refresh_countdown_secs: 30,
            reconnect_delay: Duration::from_secs(5),
            by: "dashboard".to_string(),
        }
    }
}

/// Options for constructing an [`Engine`].
pub struct EngineOptions<S> {
    /// Source adapter the engine reads from and writes through.
    pub sources: S,
    /// Engine configuration.
    pub config: EngineConfig,
}

/// The telemetry engine. Owns the event loop and the reconnection
/// supervisor; publishes [`ViewState`] snapshots over a watch channel.
pub struct Engine<S: TelemetrySources> {
    sources: S,
    config: EngineConfig,
    commands: mpsc::Sender<Command>,
    view_rx: watch::Receiver<ViewState>,
    worker: Mutex<Option<EventLoop<S>>>,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl<S: TelemetrySources> Engine<S> {
    /// Create an engine. Nothing runs until [`start`](Self::start).
    #[must_use]
    pub fn new(EngineOptions { sources, config }: EngineOptions<S>) -> Self {
        let (commands, commands_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let histories = Histories::seeded(Utc::now());
        let initial = ViewState::initial(config.selected_node.clone(), &histories);
        let (view_tx, view_rx) = watch::channel(initial.clone());

        let shutdown_token = CancellationToken::new();
        let worker = EventLoop {
            sources: sources.clone(),
            config: config.clone(),
            commands: commands_rx,
            histories,
            view: initial,
            view_tx,
            shutdown: shutdown_token.clone(),
            event_log: VecDeque::new(),
        };

        Self {
            sources,
            config,
            commands,
            view_rx,
            worker: Mutex::new(Some(worker)),
            shutdown_token,
            task_tracker: TaskTracker::new(),
        }
    }

    /// Handle for sending commands and watching view updates.
    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            commands: self.commands.clone(),
            view: self.view_rx.clone(),
        }
    }

    /// Start the event loop and the reconnection supervisor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyStarted`] if the engine was started before.
    pub async fn start(&self) -> Result<JoinHandle<()>> {
        if self.task_tracker.is_closed() {
            return Err(Error::AlreadyStarted);
        }

        let worker = self
            .worker
            .lock()
            .await
            .take()
            .ok_or(Error::AlreadyStarted)?;

        self.task_tracker.spawn(supervisor::run(
            self.sources.clone(),
            self.commands.clone(),
            self.config.reconnect_delay,
            self.shutdown_token.clone(),
        ));

        let handle = self.task_tracker.spawn(worker.run());

        self.task_tracker.close();

        Ok(handle)
    }

    /// Stop all tasks, close the push subscription, and wait for teardown.
    /// No view update is published after this returns.
    pub async fn shutdown(&self) {
        info!("telemetry engine shutting down...");

        self.shutdown_token.cancel();
        self.task_tracker.wait().await;

        info!("telemetry engine shutdown");
    }
}

/// All mutable engine state, owned by exactly one task.
struct EventLoop<S: TelemetrySources> {
    sources: S,
    config: EngineConfig,
    commands: mpsc::Receiver<Command>,
    histories: Histories,
    view: ViewState,
    view_tx: watch::Sender<ViewState>,
    shutdown: CancellationToken,
    event_log: VecDeque<StreamEvent>,
}

async fn next_tick(ticker: Option<&mut time::Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

impl<S: TelemetrySources> EventLoop<S> {
    async fn run(mut self) {
        // Initial fill so the dashboard is not blank until the first
        // trigger fires.
        self.refresh(RefreshReason::Manual).await;

        let mut countdown = Countdown::new(self.config.refresh_countdown_secs);
        let mut ticker = (self.config.refresh_countdown_secs > 0).then(|| {
            let mut ticker = time::interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => break,
                () = next_tick(ticker.as_mut()) => {
                    if countdown.tick() {
                        debug!("countdown wrapped, requesting refresh");
                        self.handle(Command::Refresh(RefreshReason::Scheduled)).await;
                    }
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                }
            }
        }

        debug!("event loop stopped");
    }

    /// Work through one command and everything it uncovers. Refreshes run
    /// inline on this task, so a second pipeline can never overlap the
    /// first; requests that queued up behind an in-flight cycle are
    /// coalesced away when it completes.
    async fn handle(&mut self, command: Command) {
        let mut queue = VecDeque::from([command]);
        while let Some(command) = queue.pop_front() {
            match command {
                Command::Refresh(reason) => {
                    self.refresh(reason).await;
                    queue.extend(self.take_pending_coalesced());
                }
                Command::SelectNode(node) => {
                    debug!(%node, "node selected");
                    self.view.selected_node = node;
                    self.publish();
                    queue.push_back(Command::Refresh(RefreshReason::Manual));
                }
                Command::SetStage { target, active } => self.set_stage(target, active).await,
                Command::StreamEvent(event) => {
                    let refresh = event.triggers_refresh();
                    self.record_event(event);
                    if refresh {
                        queue.push_back(Command::Refresh(RefreshReason::Push));
                    }
                }
                Command::StreamConnected(connected) => {
                    if self.view.connected != connected {
                        info!(connected, "push stream connectivity changed");
                        self.view.connected = connected;
                        self.publish();
                    }
                }
                Command::RecentEvents(reply) => {
                    let _ = reply.send(self.event_log.iter().cloned().collect());
                }
            }
        }
    }

    /// Drain the channel, dropping the refresh requests that piled up while
    /// a cycle was in flight and keeping everything else in order.
    fn take_pending_coalesced(&mut self) -> Vec<Command> {
        let mut kept = Vec::new();
        let mut coalesced = 0_usize;
        while let Ok(command) = self.commands.try_recv() {
            if matches!(command, Command::Refresh(_)) {
                coalesced += 1;
            } else {
                kept.push(command);
            }
        }
        if coalesced > 0 {
            debug!(coalesced, "coalesced refresh requests");
        }
        kept
    }

    /// One read-then-merge cycle. The three reads go out together and the
    /// merge runs only once all of them have settled; a hardware or
    /// prediction failure aborts the cycle and leaves the previous view
    /// untouched.
    async fn refresh(&mut self, reason: RefreshReason) {
        debug!(?reason, "refresh cycle started");
        self.view.analyzing = true;
        self.publish();

        let (hardware, predictions, live_rows) = tokio::join!(
            self.sources.fetch_hardware(),
            self.sources.fetch_predictions(),
            self.sources.fetch_live_rows(),
        );

        match (hardware, predictions) {
            (Ok(hardware), Ok(predictions)) => {
                self.view = aggregate::merge_cycle(
                    &self.view,
                    CycleInputs {
                        hardware,
                        predictions,
                        live_rows,
                    },
                    &mut self.histories,
                    Utc::now(),
                );
                self.publish();
            }
            (Err(error), _) => {
                warn!(%error, "hardware read failed, refresh aborted");
                self.end_cycle_unchanged();
            }
            (_, Err(error)) => {
                warn!(%error, "prediction read failed, refresh aborted");
                self.end_cycle_unchanged();
            }
        }
    }

    fn end_cycle_unchanged(&mut self) {
        // Previous view survives intact apart from the busy flag.
        self.view.analyzing = false;
        self.publish();
    }

    /// Optimistic stage toggle: the local flag flips and publishes before
    /// the backend is consulted, and a failed deploy does not roll it back
    /// (long-standing dashboard behavior, kept deliberately).
    async fn set_stage(&mut self, target: DeployTarget, active: bool) {
        match target {
            DeployTarget::Aerostat => self.view.stage2_active = active,
            DeployTarget::Drone => self.view.stage3_active = active,
        }
        self.publish();

        let action = if active {
            DeployAction::Deploy
        } else {
            DeployAction::Reset
        };
        let request = DeployRequest {
            what: target,
            action,
            by: self.config.by.clone(),
        };
        if let Err(error) = self.sources.deploy(request).await {
            warn!(%error, target = target.as_str(), "deploy failed; local stage state kept");
            return;
        }

        let state = if active { "deploying" } else { "idle" };
        let request = ManualStageRequest {
            what: target.as_str().to_string(),
            state: state.to_string(),
            by: self.config.by.clone(),
        };
        if let Err(error) = self.sources.set_manual_stage(request).await {
            warn!(%error, target = target.as_str(), "manual stage update failed");
        }
    }

    fn record_event(&mut self, event: StreamEvent) {
        if let StreamEvent::Raw(text) = &event {
            debug!(%text, "retained undecodable stream message");
        }
        if self.event_log.len() == EVENT_LOG_CAPACITY {
            self.event_log.pop_back();
        }
        self.event_log.push_front(event);
    }

    fn publish(&self) {
        // A cycle finishing after teardown must not surface.
        if self.shutdown.is_cancelled() {
            return;
        }
        let _ = self.view_tx.send(self.view.clone());
    }
}
