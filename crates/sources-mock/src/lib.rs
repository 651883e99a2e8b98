//! Test doubles for the cloudburst source adapter seam.
//!
//! [`MockSources`] is a fully scripted double: every read can be queued with
//! canned payloads or failures, every write is recorded, and the push stream
//! is driven by the test. [`SyntheticSources`] generates plausible weather
//! with no backend at all, for running the engine standalone.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod synthetic;

pub use error::{Error, Result};
pub use synthetic::SyntheticSources;

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use cloudburst_sources::{
    DeployRequest, HardwareTable, ManualStageRequest, PredictionBatch, RawSatelliteRow,
    StatusInfo, StreamEvent, TelemetrySources, UpdateStream,
};
use serde_json::Value;
use tokio::sync::{Mutex, mpsc};

/// Events buffered per scripted subscription.
const STREAM_CHANNEL_CAPACITY: usize = 16;

#[derive(Default)]
struct Script<T> {
    /// One-shot responses consumed front to back.
    queued: VecDeque<Result<T>>,
    /// Response served once the queue is drained.
    steady: T,
}

impl<T: Clone> Script<T> {
    fn next(&mut self) -> Result<T> {
        self.queued
            .pop_front()
            .unwrap_or_else(|| Ok(self.steady.clone()))
    }
}

#[derive(Default)]
struct Inner {
    hardware: Mutex<Script<HardwareTable>>,
    predictions: Mutex<Script<PredictionBatch>>,
    live_rows: Mutex<Script<Vec<RawSatelliteRow>>>,
    stream_tx: Mutex<Option<mpsc::Sender<StreamEvent>>>,
    deploys: Mutex<Vec<DeployRequest>>,
    manual_stages: Mutex<Vec<ManualStageRequest>>,
    ingested: Mutex<Vec<Value>>,
    fail_deploy: AtomicBool,
    fail_manual_stage: AtomicBool,
    hardware_fetches: AtomicUsize,
    prediction_fetches: AtomicUsize,
    live_fetches: AtomicUsize,
    subscriptions: AtomicUsize,
}

/// Scripted source adapter for engine tests.
#[derive(Clone, Default)]
pub struct MockSources {
    inner: Arc<Inner>,
}

impl MockSources {
    /// A double that serves empty payloads until scripted otherwise.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hardware table served once the queue is drained.
    pub async fn set_hardware(&self, table: HardwareTable) {
        self.inner.hardware.lock().await.steady = table;
    }

    /// Queue a one-shot hardware response (payload or failure).
    pub async fn queue_hardware(&self, response: Result<HardwareTable>) {
        self.inner.hardware.lock().await.queued.push_back(response);
    }

    /// Set the prediction batch served once the queue is drained.
    pub async fn set_predictions(&self, batch: PredictionBatch) {
        self.inner.predictions.lock().await.steady = batch;
    }

    /// Queue a one-shot prediction response.
    pub async fn queue_predictions(&self, response: Result<PredictionBatch>) {
        self.inner.predictions.lock().await.queued.push_back(response);
    }

    /// Set the satellite rows served once the queue is drained.
    pub async fn set_live_rows(&self, rows: Vec<RawSatelliteRow>) {
        self.inner.live_rows.lock().await.steady = rows;
    }

    /// Queue a one-shot live-rows response. A queued failure exercises the
    /// degrade-to-empty contract of the live read.
    pub async fn queue_live_rows(&self, response: Result<Vec<RawSatelliteRow>>) {
        self.inner.live_rows.lock().await.queued.push_back(response);
    }

    /// Make subsequent deploy calls fail.
    pub fn fail_deploy(&self, fail: bool) {
        self.inner.fail_deploy.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent manual-stage calls fail.
    pub fn fail_manual_stage(&self, fail: bool) {
        self.inner.fail_manual_stage.store(fail, Ordering::SeqCst);
    }

    /// Push an event into the currently open subscription. Returns `false`
    /// when no subscription is open or the consumer is gone.
    pub async fn push_event(&self, event: StreamEvent) -> bool {
        let tx = self.inner.stream_tx.lock().await.clone();
        match tx {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Drop the current subscription's sender, simulating a dead connection.
    pub async fn disconnect_stream(&self) {
        self.inner.stream_tx.lock().await.take();
    }

    /// Number of hardware fetches served so far.
    #[must_use]
    pub fn hardware_fetches(&self) -> usize {
        self.inner.hardware_fetches.load(Ordering::SeqCst)
    }

    /// Number of prediction fetches served so far.
    #[must_use]
    pub fn prediction_fetches(&self) -> usize {
        self.inner.prediction_fetches.load(Ordering::SeqCst)
    }

    /// Number of live-row fetches served so far.
    #[must_use]
    pub fn live_fetches(&self) -> usize {
        self.inner.live_fetches.load(Ordering::SeqCst)
    }

    /// Number of subscriptions opened so far.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.load(Ordering::SeqCst)
    }

    /// Deploy requests received, in order.
    pub async fn deploys(&self) -> Vec<DeployRequest> {
        self.inner.deploys.lock().await.clone()
    }

    /// Manual-stage requests received, in order.
    pub async fn manual_stages(&self) -> Vec<ManualStageRequest> {
        self.inner.manual_stages.lock().await.clone()
    }

    /// Ingested producer payloads, in order.
    pub async fn ingested(&self) -> Vec<Value> {
        self.inner.ingested.lock().await.clone()
    }
}

#[async_trait]
impl TelemetrySources for MockSources {
    type Error = Error;

    async fn fetch_hardware(&self) -> Result<HardwareTable> {
        self.inner.hardware_fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.hardware.lock().await.next()
    }

    async fn fetch_predictions(&self) -> Result<PredictionBatch> {
        self.inner.prediction_fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.predictions.lock().await.next()
    }

    async fn fetch_live_rows(&self) -> Vec<RawSatelliteRow> {
        self.inner.live_fetches.fetch_add(1, Ordering::SeqCst);
        // Same degrade contract as the production adapter: failures become
        // an empty sequence at this boundary.
        self.inner
            .live_rows
            .lock()
            .await
            .next()
            .unwrap_or_default()
    }

    async fn subscribe_updates(&self) -> Result<UpdateStream> {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        *self.inner.stream_tx.lock().await = Some(tx);
        self.inner.subscriptions.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    async fn deploy(&self, request: DeployRequest) -> Result<()> {
        self.inner.deploys.lock().await.push(request);
        if self.inner.fail_deploy.load(Ordering::SeqCst) {
            return Err(Error::SourceUnavailable);
        }
        Ok(())
    }

    async fn set_manual_stage(&self, request: ManualStageRequest) -> Result<()> {
        self.inner.manual_stages.lock().await.push(request);
        if self.inner.fail_manual_stage.load(Ordering::SeqCst) {
            return Err(Error::SourceUnavailable);
        }
        Ok(())
    }

    async fn ingest_hardware(&self, payload: Value) -> Result<()> {
        self.inner.ingested.lock().await.push(payload);
        Ok(())
    }

    async fn status(&self) -> Result<StatusInfo> {
        Ok(StatusInfo {
            ok: true,
            time: None,
        })
    }
}
