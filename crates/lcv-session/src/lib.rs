//! lcv-session: chat session over the analysis event stream
//!
//! [`ChatSession`] owns at most one active stream at a time, records the
//! events it receives, pauses on interrupts and resumes the server thread
//! once the interrupt is answered.

pub mod error;
pub mod events;
pub mod handle;
pub mod session;
pub mod state;
pub mod transport;

pub use error::{Error, Result};
pub use events::SessionEvent;
pub use handle::SessionHandle;
pub use session::ChatSession;
pub use state::{SessionState, SessionStatus};
pub use transport::{HttpTransport, OutboundRequest, Transport};
