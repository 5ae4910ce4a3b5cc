//! Chat session state machine

use std::sync::Arc;

use lcv_proto::{
    AnalyseRequest, ConsumeOutcome, ConsumeSummary, Interrupt, StreamConsumer, StreamEvent,
};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    events::SessionEvent,
    handle::SessionHandle,
    state::{SessionState, SessionStatus},
    transport::{OutboundRequest, Transport},
};

/// One conversation with the analysis backend.
///
/// Cloning gives another reference to the same session, so a UI task can
/// observe or abort while another task drives `send`/`answer`.
#[derive(Clone)]
pub struct ChatSession {
    id: Uuid,
    transport: Arc<dyn Transport>,
    event_tx: broadcast::Sender<SessionEvent>,
    handle: SessionHandle,
}

impl ChatSession {
    /// Create a new idle session
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            id: Uuid::new_v4(),
            transport,
            event_tx,
            handle: SessionHandle::new(),
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Get a handle to abort or inspect the session from outside
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Abort the request or stream in flight
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn status(&self) -> SessionStatus {
        self.handle.status()
    }

    /// Events of the current stream
    pub fn events(&self) -> Vec<StreamEvent> {
        self.handle.state.lock().events.clone()
    }

    /// Assistant text received so far on the current stream
    pub fn transcript(&self) -> String {
        self.handle.state.lock().transcript()
    }

    pub fn pending_interrupt(&self) -> Option<Interrupt> {
        self.handle.state.lock().pending_interrupt.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.handle.state.lock().error.clone()
    }

    pub fn is_streaming(&self) -> bool {
        self.handle.is_streaming()
    }

    /// Start a new analysis and consume its stream.
    ///
    /// Allowed from idle or errored. Returns once the stream has ended,
    /// paused on an interrupt, or been aborted.
    pub async fn send(&self, request: AnalyseRequest) -> Result<()> {
        let cancel = {
            let mut state = self.handle.state.lock();
            if state.stream_active || state.status.is_busy() {
                return Err(Error::Busy {
                    status: state.status,
                });
            }
            if !state.status.can_send() {
                return Err(Error::InvalidState {
                    operation: "send",
                    status: state.status,
                });
            }
            state.pending_interrupt = None;
            self.begin(&mut state, SessionStatus::Sending)
        };

        tracing::info!(session = %self.id, "Sending analysis request");
        self.run(OutboundRequest::Analyse(request), cancel).await
    }

    /// Answer the pending interrupt and consume the resumed stream.
    ///
    /// Allowed only while awaiting an answer, after the interrupted stream
    /// has finished.
    pub async fn answer(&self, value: bool) -> Result<()> {
        let (request, cancel) = {
            let mut state = self.handle.state.lock();
            if state.stream_active {
                return Err(Error::Busy {
                    status: state.status,
                });
            }
            let interrupt = match (state.status, state.pending_interrupt.take()) {
                (SessionStatus::AwaitingAnswer, Some(interrupt)) => interrupt,
                (status, pending) => {
                    state.pending_interrupt = pending;
                    return Err(Error::InvalidState {
                        operation: "answer",
                        status,
                    });
                }
            };
            let cancel = self.begin(&mut state, SessionStatus::Resuming);
            (interrupt.resume(value), cancel)
        };

        tracing::info!(
            session = %self.id,
            thread_id = %request.thread_id,
            interrupt_id = %request.interrupt_id,
            answer = value,
            "Answering interrupt"
        );
        self.run(OutboundRequest::Resume(request), cancel).await
    }

    /// Leave the errored state without side effects
    pub fn clear_error(&self) -> Result<()> {
        let mut state = self.handle.state.lock();
        if state.status != SessionStatus::Errored {
            return Err(Error::InvalidState {
                operation: "clear error",
                status: state.status,
            });
        }
        state.error = None;
        self.transition(&mut state, SessionStatus::Idle);
        Ok(())
    }

    /// Reset the record for a fresh stream and enter `status`.
    fn begin(&self, state: &mut SessionState, status: SessionStatus) -> CancellationToken {
        state.events.clear();
        state.error = None;
        state.stream_active = true;
        self.transition(state, status);
        self.handle.reset_cancel()
    }

    async fn run(&self, request: OutboundRequest, cancel: CancellationToken) -> Result<()> {
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.transport.open(&request) => Some(result),
        };

        let body = match opened {
            None => {
                self.finish_cancelled();
                return Ok(());
            }
            Some(Err(e)) => return Err(self.fail(e)),
            Some(Ok(body)) => body,
        };

        {
            let mut state = self.handle.state.lock();
            self.transition(&mut state, SessionStatus::Streaming);
        }

        match StreamConsumer::new(cancel)
            .consume(body, |event| self.record(event))
            .await
        {
            Ok(summary) if summary.outcome == ConsumeOutcome::Cancelled => {
                self.finish_cancelled();
                Ok(())
            }
            Ok(summary) => {
                self.finish_stream(summary);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Append a decoded event to the log and publish it
    fn record(&self, event: StreamEvent) {
        let mut state = self.handle.state.lock();
        state.events.push(event.clone());
        let interrupt = match &event {
            StreamEvent::Interrupt(interrupt) => Some(interrupt.clone()),
            _ => None,
        };
        let _ = self.event_tx.send(SessionEvent::Stream { event });

        if let Some(interrupt) = interrupt {
            tracing::info!(
                session = %self.id,
                thread_id = %interrupt.thread_id,
                interrupt_id = %interrupt.interrupt_id,
                "Stream paused on interrupt"
            );
            state.pending_interrupt = Some(interrupt);
            self.transition(&mut state, SessionStatus::AwaitingAnswer);
        }
    }

    fn finish_stream(&self, summary: ConsumeSummary) {
        let mut state = self.handle.state.lock();
        state.stream_active = false;
        tracing::info!(
            session = %self.id,
            outcome = ?summary.outcome,
            delivered = summary.delivered,
            skipped = summary.skipped,
            "Stream finished"
        );
        if state.pending_interrupt.is_some() {
            self.transition(&mut state, SessionStatus::AwaitingAnswer);
        } else {
            self.transition(&mut state, SessionStatus::Idle);
        }
    }

    fn finish_cancelled(&self) {
        let mut state = self.handle.state.lock();
        tracing::info!(session = %self.id, "Stream aborted");
        state.stream_active = false;
        state.pending_interrupt = None;
        self.transition(&mut state, SessionStatus::Idle);
    }

    fn fail(&self, error: lcv_proto::Error) -> Error {
        let message = error.to_string();
        tracing::warn!(session = %self.id, "Request failed: {}", message);

        let mut state = self.handle.state.lock();
        state.stream_active = false;
        state.pending_interrupt = None;
        state.error = Some(message.clone());
        let _ = self.event_tx.send(SessionEvent::Error { message });
        self.transition(&mut state, SessionStatus::Errored);
        Error::Transport(error)
    }

    fn transition(&self, state: &mut SessionState, to: SessionStatus) {
        let from = state.status;
        if from == to {
            return;
        }
        state.status = to;
        tracing::debug!(session = %self.id, "Status {} -> {}", from, to);
        let _ = self.event_tx.send(SessionEvent::Status { from, to });
    }
}
