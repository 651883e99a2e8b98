use thiserror::Error;

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure modes the scripted double can be told to produce.
#[derive(Clone, Copy, Debug, Error)]
pub enum Error {
    /// Simulated transport failure or non-success status.
    #[error("source unavailable")]
    SourceUnavailable,

    /// Simulated undecodable body.
    #[error("malformed payload")]
    MalformedPayload,
}
