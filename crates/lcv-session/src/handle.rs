//! A cloneable handle for poking the session from external code.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::state::{SessionState, SessionStatus};

/// A cloneable handle for poking the session from external code.
///
/// All fields are `Arc`-wrapped, so cloning is cheap.
#[derive(Clone, Default)]
pub struct SessionHandle {
    pub(crate) cancel: Arc<Mutex<CancellationToken>>,
    pub(crate) state: Arc<Mutex<SessionState>>,
}

impl SessionHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Abort the request or stream in flight, if any.
    ///
    /// The session returns to idle; an abort is not recorded as an error.
    pub fn abort(&self) {
        self.cancel.lock().cancel();
    }

    /// Replace the token with a fresh one for the next stream.
    pub(crate) fn reset_cancel(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.cancel.lock() = token.clone();
        token
    }

    /// Current status.
    pub fn status(&self) -> SessionStatus {
        self.state.lock().status
    }

    /// Whether a request or stream is in flight.
    pub fn is_streaming(&self) -> bool {
        self.state.lock().stream_active
    }
}
