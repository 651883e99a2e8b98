//! Reconnection supervisor.
//!
//! Sole owner of the push subscription: nothing else may open or close it.
//! Forwards every event into the engine's command queue and re-establishes
//! the connection after a fixed delay when it drops — exactly one scheduled
//! attempt per failure, never a second concurrent subscription.

use std::time::Duration;

use cloudburst_sources::TelemetrySources;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::command::Command;

pub(crate) async fn run<S: TelemetrySources>(
    sources: S,
    commands: mpsc::Sender<Command>,
    reconnect_delay: Duration,
    shutdown: CancellationToken,
) {
    loop {
        if shutdown.is_cancelled() {
            return;
        }

        match sources.subscribe_updates().await {
            Ok(mut events) => {
                if commands.send(Command::StreamConnected(true)).await.is_err() {
                    return;
                }
                loop {
                    tokio::select! {
                        () = shutdown.cancelled() => return,
                        event = events.recv() => match event {
                            Some(event) => {
                                if commands.send(Command::StreamEvent(event)).await.is_err() {
                                    return;
                                }
                            }
                            None => {
                                warn!("update stream dropped");
                                break;
                            }
                        }
                    }
                }
            }
            Err(error) => warn!(%error, "update subscription failed"),
        }

        if commands
            .send(Command::StreamConnected(false))
            .await
            .is_err()
        {
            return;
        }

        debug!(
            delay_secs = reconnect_delay.as_secs(),
            "scheduling reconnect"
        );
        tokio::select! {
            () = shutdown.cancelled() => return,
            () = tokio::time::sleep(reconnect_delay) => {}
        }
    }
}
