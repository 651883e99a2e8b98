use thiserror::Error;

/// Result type for this binary.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this binary.
#[derive(Debug, Error)]
pub enum Error {
    /// Engine lifecycle failure.
    #[error(transparent)]
    Engine(#[from] cloudburst_engine::Error),

    /// Source adapter configuration failure.
    #[error(transparent)]
    Sources(#[from] cloudburst_sources_http::Error),

    /// Failed to install the tracing subscriber.
    #[error(transparent)]
    Tracing(#[from] tracing::subscriber::SetGlobalDefaultError),
}
