//! Session status and the per-session record

use std::fmt;

use lcv_proto::{Interrupt, StreamEvent};
use serde::{Deserialize, Serialize};

/// Where a session is in its request/stream cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Nothing in flight
    #[default]
    Idle,
    /// Start request sent, waiting for the response
    Sending,
    /// Response body being consumed
    Streaming,
    /// Paused on an interrupt until `answer` is called
    AwaitingAnswer,
    /// Resume request sent, waiting for the response
    Resuming,
    /// The last attempt failed
    Errored,
}

impl SessionStatus {
    /// Statuses with a request or stream in flight
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            SessionStatus::Sending | SessionStatus::Streaming | SessionStatus::Resuming
        )
    }

    /// Statuses from which a new analysis may start
    pub fn can_send(self) -> bool {
        matches!(self, SessionStatus::Idle | SessionStatus::Errored)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Sending => "sending",
            SessionStatus::Streaming => "streaming",
            SessionStatus::AwaitingAnswer => "awaiting answer",
            SessionStatus::Resuming => "resuming",
            SessionStatus::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Mutable record behind one session.
///
/// `pending_interrupt` is set from the moment an interrupt arrives until it
/// is answered, the stream is aborted, or the attempt fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// The single authoritative state value
    pub status: SessionStatus,
    /// Events of the current stream, in arrival order
    pub events: Vec<StreamEvent>,
    /// Whether a request or its body is still in flight
    pub stream_active: bool,
    /// The interrupt waiting for an answer
    pub pending_interrupt: Option<Interrupt>,
    /// Last error
    pub error: Option<String>,
}

impl SessionState {
    /// Assistant text of the current stream, chunks joined in order
    pub fn transcript(&self) -> String {
        self.events.iter().filter_map(StreamEvent::as_text).collect()
    }
}
