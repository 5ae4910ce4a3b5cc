//! Session event types

use lcv_proto::StreamEvent;
use serde::Serialize;

use crate::state::SessionStatus;

/// Events published to session observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The session moved between states
    Status {
        from: SessionStatus,
        to: SessionStatus,
    },

    /// A decoded event from the active stream
    Stream { event: StreamEvent },

    /// The attempt failed; the message is also kept as the last error
    Error { message: String },
}

impl SessionEvent {
    /// The new status if this is a transition
    pub fn status(&self) -> Option<SessionStatus> {
        match self {
            SessionEvent::Status { to, .. } => Some(*to),
            _ => None,
        }
    }
}
