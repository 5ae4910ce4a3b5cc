//! Error types for lcv-session

use thiserror::Error;

use crate::state::SessionStatus;

/// Result type alias using lcv-session Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by session operations
#[derive(Error, Debug)]
pub enum Error {
    /// The request could not be made or the stream broke
    #[error(transparent)]
    Transport(#[from] lcv_proto::Error),

    /// A stream is already in flight for this session
    #[error("session is busy ({status})")]
    Busy { status: SessionStatus },

    /// The operation is not allowed from the current status
    #[error("cannot {operation} while {status}")]
    InvalidState {
        operation: &'static str,
        status: SessionStatus,
    },
}

impl Error {
    /// Whether the call was refused without touching the session
    pub fn is_rejected(&self) -> bool {
        matches!(self, Error::Busy { .. } | Error::InvalidState { .. })
    }
}
