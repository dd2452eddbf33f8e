//! Error types for the stream pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Errors that can occur while scraping, resolving or assembling streams.
#[derive(Error, Debug)]
pub enum ScoutError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status code.
    #[error("{service} returned HTTP {status}")]
    UpstreamStatus { service: String, status: u16 },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Invalid query.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Content identifier could not be interpreted.
    #[error("Invalid content id: {0}")]
    InvalidContentId(String),

    /// Content type other than movie or series.
    #[error("Invalid type '{0}'. Must be either \"movie\" or \"series\"")]
    UnknownContentType(String),

    /// Lookup found nothing for the identifier.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The availability backend reported a failure.
    #[error("{service} error: {message}")]
    Backend { service: String, message: String },

    /// A resolved transfer contained no playable video file.
    #[error("No suitable video file found")]
    NoVideoFile,

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Configuration could not be loaded.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl ScoutError {
    /// Builds a backend error for the named service.
    pub fn backend(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            service: service.into(),
            message: message.into(),
        }
    }
}
