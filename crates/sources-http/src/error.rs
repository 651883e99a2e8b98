use thiserror::Error;

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors the HTTP source adapter can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// Configured base URL did not parse.
    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),

    /// Body was not decodable as the expected shape.
    #[error("malformed payload from {0}: {1}")]
    MalformedPayload(&'static str, #[source] serde_json::Error),

    /// Transport failure or non-success status.
    #[error("source unavailable: {0}")]
    SourceUnavailable(#[from] reqwest::Error),

    /// Push connection dropped.
    #[error("update stream disconnected")]
    StreamDisconnected,
}
