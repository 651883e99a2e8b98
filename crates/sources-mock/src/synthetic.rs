//! Backend-free source adapter producing plausible weather.
//!
//! The value ranges mirror the dashboard's presentation stub; nothing here
//! is a telemetry claim. Kept behind [`TelemetrySources`] so a real feed can
//! replace it without touching the aggregator.

use std::sync::Arc;

use async_trait::async_trait;
use cloudburst_sources::{
    DEFAULT_NODE_IDS, DeployRequest, HardwareTable, ManualStageRequest, NodeSnapshot,
    PredictionBatch, PredictionEntry, PredictionRecord, RawSatelliteRow, Stage, StatusInfo,
    StreamEvent, TelemetrySources, UpdateStream,
};
use rand::Rng;
use serde_json::{Value, json};
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use crate::error::Result;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn sample(range: std::ops::Range<f64>) -> f64 {
    round2(rand::thread_rng().gen_range(range))
}

/// Source adapter that fabricates every payload locally.
#[derive(Clone, Default)]
pub struct SyntheticSources {
    /// Keeps the scripted subscription alive; the generator never pushes
    /// events, so the channel only closes on resubscribe or drop.
    stream_tx: Arc<Mutex<Option<mpsc::Sender<StreamEvent>>>>,
}

impl SyntheticSources {
    /// Create a generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn node_snapshot() -> NodeSnapshot {
        NodeSnapshot {
            temperature: Some(sample(29.5..30.9)),
            humidity: Some(sample(32.0..33.0)),
            pressure: Some(sample(954.0..954.5)),
            wind_speed: Some(sample(0.53..1.36)),
            rainfall_mm: Some(sample(0.2794..1.398)),
            stage: Some(Stage::Stage1),
            alert: Some("NORMAL".to_string()),
            risk: Some(sample(5.0..45.0)),
            ..NodeSnapshot::default()
        }
    }

    /// The baseline satellite rows shown before any real observation.
    #[must_use]
    pub fn sample_rows() -> Vec<RawSatelliteRow> {
        let rows = [
            ("18.72", "74.08", "-62.4", "1.85", "28.4", "18.2", "Extreme", "14:30"),
            ("18.68", "74.05", "-58.2", "1.62", "25.8", "16.5", "Moderate", "14:29"),
            ("18.75", "74.12", "-45.3", "1.21", "19.2", "12.8", "Low", "14:28"),
            ("18.70", "74.15", "-52.8", "1.45", "22.6", "15.1", "Moderate", "14:27"),
            ("18.65", "74.03", "-38.7", "0.98", "16.3", "10.5", "Low", "14:26"),
        ];

        rows.iter()
            .map(
                |(lat, lon, ctt, ot, flux, cii, risk, ts)| RawSatelliteRow {
                    lat: Some(Value::from(*lat)),
                    lon: Some(Value::from(*lon)),
                    ctt: Some(Value::from(*ctt)),
                    ot_index: Some(Value::from(*ot)),
                    moisture_flux: Some(Value::from(*flux)),
                    cii: Some(Value::from(*cii)),
                    risk_level: Some((*risk).to_string()),
                    timestamp: Some((*ts).to_string()),
                },
            )
            .collect()
    }
}

#[async_trait]
impl TelemetrySources for SyntheticSources {
    type Error = crate::Error;

    async fn fetch_hardware(&self) -> Result<HardwareTable> {
        Ok(DEFAULT_NODE_IDS
            .iter()
            .map(|id| ((*id).to_string(), Self::node_snapshot()))
            .collect())
    }

    async fn fetch_predictions(&self) -> Result<PredictionBatch> {
        Ok(vec![PredictionEntry::Single(PredictionRecord {
            risk_score: Some(json!(sample(20.0..60.0))),
            ..PredictionRecord::default()
        })])
    }

    async fn fetch_live_rows(&self) -> Vec<RawSatelliteRow> {
        Self::sample_rows()
    }

    async fn subscribe_updates(&self) -> Result<UpdateStream> {
        let (tx, rx) = mpsc::channel(1);
        *self.stream_tx.lock().await = Some(tx);
        Ok(rx)
    }

    async fn deploy(&self, request: DeployRequest) -> Result<()> {
        debug!(?request, "synthetic deploy accepted");
        Ok(())
    }

    async fn set_manual_stage(&self, request: ManualStageRequest) -> Result<()> {
        debug!(?request, "synthetic manual stage accepted");
        Ok(())
    }

    async fn ingest_hardware(&self, _payload: Value) -> Result<()> {
        Ok(())
    }

    async fn status(&self) -> Result<StatusInfo> {
        Ok(StatusInfo {
            ok: true,
            time: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fabricated_table_covers_the_default_nodes() {
        let sources = SyntheticSources::new();
        let table = sources.fetch_hardware().await.unwrap();

        assert_eq!(table.len(), DEFAULT_NODE_IDS.len());
        let node0 = &table["node0"];
        let temperature = node0.temperature.unwrap();
        assert!((29.5..=30.9).contains(&temperature));
        assert_eq!(node0.stage, Some(Stage::Stage1));
    }

    #[tokio::test]
    async fn fabricated_predictions_resolve_to_a_score() {
        let sources = SyntheticSources::new();
        let batch = sources.fetch_predictions().await.unwrap();
        let score = batch.last().unwrap().score().unwrap();
        assert!((20.0..=60.0).contains(&score));
    }
}
