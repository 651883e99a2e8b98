//! HTTP source adapter for the cloudburst telemetry engine.
//!
//! Wraps the backend's REST endpoints and SSE update stream behind the
//! [`TelemetrySources`] trait. The adapter is an explicitly constructed
//! value, not a process-wide singleton; every engine gets its own instance.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod sse;

pub use error::{Error, Result};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cloudburst_sources::{
    DeployRequest, HardwareTable, ManualStageRequest, PredictionBatch, RawSatelliteRow,
    StatusInfo, StreamEvent, TelemetrySources, UpdateStream,
};
use futures::StreamExt;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Events buffered between the connection task and the consumer.
const STREAM_CHANNEL_CAPACITY: usize = 64;

/// Per-request deadline for the REST endpoints. The update stream is exempt;
/// it is long-lived by design.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Options for constructing an [`HttpSources`].
pub struct HttpSourcesOptions {
    /// Base URL all endpoints live under, e.g. `http://127.0.0.1:8000/api/`.
    /// A missing trailing slash is tolerated.
    pub base_url: String,
}

/// Production source adapter over the backend's REST + SSE API.
#[derive(Clone)]
pub struct HttpSources {
    client: Client,
    base_url: Url,
    /// Token for the currently open push connection, if any. Opening a new
    /// subscription cancels the previous one so at most one is ever live.
    subscription: Arc<Mutex<Option<CancellationToken>>>,
}

impl HttpSources {
    /// Create an adapter for the given backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client
    /// cannot be constructed.
    pub fn new(options: HttpSourcesOptions) -> Result<Self> {
        let mut base = options.base_url;
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            base_url,
            subscription: Arc::new(Mutex::new(None)),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(Error::BaseUrl)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &'static str) -> Result<T> {
        let response = self
            .client
            .get(self.endpoint(path)?)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::MalformedPayload(path, e))
    }

    async fn post_json<B: Serialize + Sync>(&self, path: &'static str, body: &B) -> Result<()> {
        self.client
            .post(self.endpoint(path)?)
            .timeout(REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

#[async_trait]
impl TelemetrySources for HttpSources {
    type Error = Error;

    async fn fetch_hardware(&self) -> Result<HardwareTable> {
        self.get_json("hardware_output").await
    }

    async fn fetch_predictions(&self) -> Result<PredictionBatch> {
        self.get_json("predictions").await
    }

    async fn fetch_live_rows(&self) -> Vec<RawSatelliteRow> {
        match self.get_json::<Vec<RawSatelliteRow>>("live_latest").await {
            Ok(rows) => rows,
            Err(error) => {
                warn!(%error, "live rows fetch degraded to empty");
                Vec::new()
            }
        }
    }

    async fn subscribe_updates(&self) -> Result<UpdateStream> {
        let token = CancellationToken::new();
        {
            let mut slot = self.subscription.lock().await;
            if let Some(previous) = slot.take() {
                previous.cancel();
            }
            *slot = Some(token.clone());
        }

        let response = self
            .client
            .get(self.endpoint("stream/updates")?)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?
            .error_for_status()?;

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut parser = sse::EventStreamParser::new();
            loop {
                tokio::select! {
                    () = token.cancelled() => {
                        debug!("update stream closed by new subscription");
                        break;
                    }
                    chunk = body.next() => match chunk {
                        Some(Ok(bytes)) => {
                            for payload in parser.push(&bytes) {
                                if tx.send(StreamEvent::decode(&payload)).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Some(Err(error)) => {
                            warn!(%error, "{}", Error::StreamDisconnected);
                            break;
                        }
                        None => {
                            warn!("{}", Error::StreamDisconnected);
                            break;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn deploy(&self, request: DeployRequest) -> Result<()> {
        self.post_json("deploy", &request).await
    }

    async fn set_manual_stage(&self, request: ManualStageRequest) -> Result<()> {
        self.post_json("manual_stage", &request).await
    }

    async fn ingest_hardware(&self, payload: Value) -> Result<()> {
        self.post_json("ingest/hardware", &payload).await
    }

    async fn status(&self) -> Result<StatusInfo> {
        self.get_json("status").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let sources = HttpSources::new(HttpSourcesOptions {
            base_url: "http://127.0.0.1:8000/api".to_string(),
        })
        .unwrap();

        assert_eq!(
            sources.endpoint("hardware_output").unwrap().as_str(),
            "http://127.0.0.1:8000/api/hardware_output"
        );
        assert_eq!(
            sources.endpoint("stream/updates").unwrap().as_str(),
            "http://127.0.0.1:8000/api/stream/updates"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = HttpSources::new(HttpSourcesOptions {
            base_url: "not a url".to_string(),
        });
        assert!(matches!(result, Err(Error::BaseUrl(_))));
    }
}
