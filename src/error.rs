//! Error types for the receipt renderer

use thiserror::Error;

/// Result type alias for renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while producing a receipt
#[derive(Error, Debug)]
pub enum Error {
    /// The banner image could not be fetched or is not an image
    #[error("Failed to fetch resource: {0}")]
    FetchError(String),

    /// Template assembly, layout or rasterization failed
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// PDF assembly failed
    #[error("Encoding failed: {0}")]
    EncodingError(String),

    /// The donation record is missing data needed to render or save it
    #[error("Invalid donation record: {0}")]
    InvalidRecord(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Filesystem error while reading inputs or writing a receipt
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}
