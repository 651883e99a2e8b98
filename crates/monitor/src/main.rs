//! Headless runner for the cloudburst telemetry engine.
//!
//! Wires a source adapter into the engine and logs every published view
//! state until ctrl-c. With `--simulate` the synthetic generator stands in
//! for the backend, which is handy for demos and for exercising the engine
//! with no infrastructure at all.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

use error::Result;

use clap::Parser;
use cloudburst_engine::{Engine, EngineConfig, EngineOptions, ViewState};
use cloudburst_sources::TelemetrySources;
use cloudburst_sources_http::{HttpSources, HttpSourcesOptions};
use cloudburst_sources_mock::SyntheticSources;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Base URL of the backend API.
    #[arg(
        long,
        env = "CLOUDBURST_API",
        default_value = "http://127.0.0.1:8000/api"
    )]
    base_url: String,

    /// Node whose weather is displayed initially.
    #[arg(long, default_value = "node0")]
    node: String,

    /// Seconds between scheduled refreshes (0 disables the countdown).
    #[arg(long, default_value_t = 30)]
    refresh_secs: u32,

    /// Run against the synthetic generator instead of a backend.
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder().with_max_level(Level::INFO).finish(),
    )?;

    let args = Args::parse();
    let config = EngineConfig {
        selected_node: args.node.clone(),
        refresh_countdown_secs: args.refresh_secs,
        ..EngineConfig::default()
    };

    if args.simulate {
        info!("running against the synthetic generator");
        run(SyntheticSources::new(), config).await
    } else {
        let sources = HttpSources::new(HttpSourcesOptions {
            base_url: args.base_url.clone(),
        })?;

        match sources.status().await {
            Ok(status) => info!(ok = status.ok, time = ?status.time, "backend reachable"),
            Err(error) => warn!(%error, "backend status probe failed; starting anyway"),
        }

        run(sources, config).await
    }
}

async fn run<S: TelemetrySources>(sources: S, config: EngineConfig) -> Result<()> {
    let engine = Engine::new(EngineOptions { sources, config });
    let handle = engine.handle();
    let _engine_task = engine.start().await?;

    let mut view = handle.watch();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = view.borrow_and_update().clone();
                log_view(&snapshot);
            }
        }
    }

    engine.shutdown().await;
    Ok(())
}

fn log_view(view: &ViewState) {
    info!(
        node = %view.selected_node,
        prediction_pct = view.prediction_pct,
        risk_tier = ?view.risk_tier,
        global_risk = view.global_risk,
        temperature = view.weather.temperature,
        humidity = view.weather.humidity,
        pressure = view.weather.pressure,
        satellite_rows = view.satellite.len(),
        connected = view.connected,
        analyzing = view.analyzing,
        "view updated"
    );
}
