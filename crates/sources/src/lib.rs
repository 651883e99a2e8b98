//! Source adapter seam for the cloudburst telemetry engine.
//!
//! Defines the wire types for the three backend payloads and the push
//! stream, plus the [`TelemetrySources`] trait every adapter implements.
//! The engine only ever talks to this trait, so the production HTTP
//! adapter, the scripted test double, and the synthetic generator are
//! interchangeable.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod serde_lenient;
mod types;

pub use types::*;

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;

/// Uniform interface over the backend's read and write operations.
///
/// Read operations either succeed with the parsed payload or fail with the
/// adapter's error type; the live-rows read is the exception and degrades to
/// an empty sequence instead of propagating (read-only telemetry is
/// best-effort). Write operations propagate failure unconditionally.
#[async_trait]
pub trait TelemetrySources: Clone + Send + Sync + 'static {
    /// Adapter-specific error type.
    type Error: Debug + Error + Send + Sync;

    /// Fetch the per-node hardware snapshot table.
    async fn fetch_hardware(&self) -> Result<HardwareTable, Self::Error>;

    /// Fetch the rolling prediction batch; only the last entry is consumed.
    async fn fetch_predictions(&self) -> Result<PredictionBatch, Self::Error>;

    /// Fetch the latest satellite rows. Best-effort: any failure degrades to
    /// an empty sequence rather than reaching the caller.
    async fn fetch_live_rows(&self) -> Vec<RawSatelliteRow>;

    /// Open the push subscription, closing any existing connection first so
    /// at most one is live per adapter. The returned channel closes when the
    /// connection drops.
    async fn subscribe_updates(&self) -> Result<UpdateStream, Self::Error>;

    /// Deploy or reset a named subsystem.
    async fn deploy(&self, request: DeployRequest) -> Result<(), Self::Error>;

    /// Set a manual stage override.
    async fn set_manual_stage(&self, request: ManualStageRequest)
    -> Result<(), Self::Error>;

    /// Producer-side hardware ingestion passthrough. Not consumed by the
    /// engine; exposed for node simulators and field tooling.
    async fn ingest_hardware(&self, payload: Value) -> Result<(), Self::Error>;

    /// Backend health probe.
    async fn status(&self) -> Result<StatusInfo, Self::Error>;
}
