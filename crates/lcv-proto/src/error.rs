//! Error types for lcv-proto

use thiserror::Error;

/// Result type alias using lcv-proto Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the analysis backend
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed (connect, send, or reading the body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP error! status: {status} ({url})")]
    Status { status: u16, url: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a status error
    pub fn status(status: u16, url: impl Into<String>) -> Self {
        Self::Status {
            status,
            url: url.into(),
        }
    }

    /// Whether this error belongs to the transport family: a bad status or
    /// a network failure before or during streaming.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Status { .. })
    }
}
