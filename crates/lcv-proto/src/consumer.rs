//! Read loop turning a byte source into stream events

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::{
    error::Result,
    event::decode_frame,
    frame::FrameSplitter,
    text::Utf8Decoder,
    types::StreamEvent,
};

/// Why the read loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// A `done` event was decoded
    Done,
    /// The source ended without a `done` event
    EndOfStream,
    /// The cancellation token fired
    Cancelled,
}

/// Result of consuming one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumeSummary {
    pub outcome: ConsumeOutcome,
    /// Events handed to the sink
    pub delivered: usize,
    /// Frames that failed to decode and were skipped
    pub skipped: usize,
}

/// Drives one response body from bytes to events.
///
/// A consumer is used for exactly one stream; its buffers are dropped with it.
#[derive(Debug)]
pub struct StreamConsumer {
    text: Utf8Decoder,
    splitter: FrameSplitter,
    cancel: CancellationToken,
    delivered: usize,
    skipped: usize,
}

impl StreamConsumer {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            text: Utf8Decoder::new(),
            splitter: FrameSplitter::new(),
            cancel,
            delivered: 0,
            skipped: 0,
        }
    }

    /// Pull chunks from `source` until `done`, end of data, or cancellation,
    /// calling `sink` once per decoded event in frame order.
    ///
    /// Frames that fail to decode are logged and skipped. Only a failing
    /// source ends the loop with an error.
    pub async fn consume<S, B, F>(mut self, mut source: S, mut sink: F) -> Result<ConsumeSummary>
    where
        S: Stream<Item = Result<B>> + Unpin,
        B: AsRef<[u8]>,
        F: FnMut(StreamEvent),
    {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Stream cancelled by caller");
                    return Ok(self.summary(ConsumeOutcome::Cancelled));
                }
                next = source.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    let text = self.text.decode(chunk.as_ref());
                    if let Some(outcome) = self.feed(&text, &mut sink) {
                        return Ok(self.summary(outcome));
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!("Stream failed after {} events: {}", self.delivered, e);
                    return Err(e);
                }
                None => {
                    let tail = self.text.finish();
                    if let Some(outcome) = self.feed(&tail, &mut sink) {
                        return Ok(self.summary(outcome));
                    }
                    if !self.splitter.remainder().is_empty() {
                        tracing::debug!(
                            "Discarding {} bytes of unterminated frame at end of stream",
                            self.splitter.remainder().len()
                        );
                    }
                    tracing::debug!("Stream closed by server without done event");
                    return Ok(self.summary(ConsumeOutcome::EndOfStream));
                }
            }
        }
    }

    /// Split and decode `text`. Returns the outcome once a `done` event has
    /// been delivered or the token fires between frames.
    fn feed<F: FnMut(StreamEvent)>(&mut self, text: &str, sink: &mut F) -> Option<ConsumeOutcome> {
        for frame in self.splitter.push(text) {
            if self.cancel.is_cancelled() {
                tracing::debug!("Stream cancelled by caller");
                self.splitter.clear();
                return Some(ConsumeOutcome::Cancelled);
            }
            match decode_frame(&frame) {
                Ok(event) => {
                    tracing::debug!(event = event.name(), "Decoded frame");
                    let terminal = event.is_terminal();
                    self.delivered += 1;
                    sink(event);
                    if terminal {
                        self.splitter.clear();
                        return Some(ConsumeOutcome::Done);
                    }
                }
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!("Skipping frame: {} ({:?})", e, frame.as_str());
                }
            }
        }
        None
    }

    fn summary(&self, outcome: ConsumeOutcome) -> ConsumeSummary {
        ConsumeSummary {
            outcome,
            delivered: self.delivered,
            skipped: self.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, types::Interrupt};

    fn chunks(parts: &[&[u8]]) -> impl Stream<Item = Result<Vec<u8>>> + Unpin {
        let owned: Vec<Result<Vec<u8>>> = parts.iter().map(|p| Ok(p.to_vec())).collect();
        futures::stream::iter(owned)
    }

    async fn run(parts: &[&[u8]]) -> (Vec<StreamEvent>, ConsumeSummary) {
        let mut events = Vec::new();
        let summary = StreamConsumer::new(CancellationToken::new())
            .consume(chunks(parts), |e| events.push(e))
            .await
            .unwrap();
        (events, summary)
    }

    const STREAM: &str = concat!(
        "event: message\ndata: \"Analyse des données \u{2013} \"\n\n",
        "event: message\ndata: \"lettre de crédit ✓\"\n\n",
        "event: interrupt\ndata: {\"question\":\"Proceed?\",\"interrupt_id\":\"abc\",\"thread_id\":\"t1\"}\n\n",
        "event: done\ndata: null\n\n",
    );

    #[tokio::test]
    async fn test_whole_stream() {
        let (events, summary) = run(&[STREAM.as_bytes()]).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::message("Analyse des données \u{2013} "),
                StreamEvent::message("lettre de crédit ✓"),
                StreamEvent::Interrupt(Interrupt::new("Proceed?", "abc", "t1")),
                StreamEvent::Done,
            ]
        );
        assert_eq!(summary.outcome, ConsumeOutcome::Done);
        assert_eq!(summary.delivered, 4);
        assert_eq!(summary.skipped, 0);
    }

    #[tokio::test]
    async fn test_chunk_boundaries_do_not_matter() {
        let bytes = STREAM.as_bytes();
        let (expected, _) = run(&[bytes]).await;

        // Every two-way byte split, including inside multi-byte characters
        for split in 0..=bytes.len() {
            let (events, _) = run(&[&bytes[..split], &bytes[split..]]).await;
            assert_eq!(events, expected, "split at byte {}", split);
        }

        // One byte at a time
        let singles: Vec<&[u8]> = bytes.chunks(1).collect();
        let (events, _) = run(&singles).await;
        assert_eq!(events, expected);

        // Uneven chunks
        let uneven: Vec<&[u8]> = bytes.chunks(7).collect();
        let (events, _) = run(&uneven).await;
        assert_eq!(events, expected);
    }

    #[tokio::test]
    async fn test_done_stops_before_later_frames() {
        let stream = "event: message\ndata: \"a\"\n\nevent: done\n\nevent: message\ndata: \"ignored\"\n\n";
        let (events, summary) = run(&[stream.as_bytes()]).await;
        assert_eq!(events, vec![StreamEvent::message("a"), StreamEvent::Done]);
        assert_eq!(summary.outcome, ConsumeOutcome::Done);
    }

    #[tokio::test]
    async fn test_done_does_not_wait_for_end_of_data() {
        let head = futures::stream::iter(vec![Ok::<_, Error>(
            b"event: message\ndata: \"a\"\n\nevent: done\n\n".to_vec(),
        )]);
        // A source that would never end on its own
        let source = head.chain(futures::stream::pending());
        let mut events = Vec::new();
        let summary = StreamConsumer::new(CancellationToken::new())
            .consume(source, |e| events.push(e))
            .await
            .unwrap();
        assert_eq!(summary.outcome, ConsumeOutcome::Done);
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_frame_skipped() {
        let stream = concat!(
            "event: message\ndata: \"first\"\n\n",
            "event: progress\ndata: 50\n\n",
            "event: message\ndata: \"second\"\n\n",
        );
        let (events, summary) = run(&[stream.as_bytes()]).await;
        assert_eq!(
            events,
            vec![StreamEvent::message("first"), StreamEvent::message("second")]
        );
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.outcome, ConsumeOutcome::EndOfStream);
    }

    #[tokio::test]
    async fn test_end_of_stream_without_done() {
        let (events, summary) =
            run(&[b"event: message\ndata: \"a\"\n\nevent: message\ndata: \"cut".as_slice()]).await;
        assert_eq!(events, vec![StreamEvent::message("a")]);
        assert_eq!(summary.outcome, ConsumeOutcome::EndOfStream);
        assert_eq!(summary.delivered, 1);
    }

    #[tokio::test]
    async fn test_cancel_before_first_chunk() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut events = Vec::new();
        let summary = StreamConsumer::new(cancel)
            .consume(chunks(&[STREAM.as_bytes()]), |e| events.push(e))
            .await
            .unwrap();
        assert_eq!(summary.outcome, ConsumeOutcome::Cancelled);
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_mid_stream() {
        let cancel = CancellationToken::new();
        let head = futures::stream::iter(vec![Ok::<_, Error>(
            b"event: message\ndata: \"a\"\n\n".to_vec(),
        )]);
        let source = head.chain(futures::stream::pending());
        let trigger = cancel.clone();
        let mut events = Vec::new();
        let summary = StreamConsumer::new(cancel)
            .consume(source, |e| {
                events.push(e);
                trigger.cancel();
            })
            .await
            .unwrap();
        assert_eq!(summary.outcome, ConsumeOutcome::Cancelled);
        assert_eq!(events, vec![StreamEvent::message("a")]);
    }

    #[tokio::test]
    async fn test_cancel_stops_remaining_frames_of_chunk() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let chunk = concat!(
            "event: message\ndata: \"a\"\n\n",
            "event: interrupt\ndata: {\"question\":\"q\",\"interrupt_id\":\"i\",\"thread_id\":\"t\"}\n\n",
            "event: done\n\n",
        );
        let mut events = Vec::new();
        let summary = StreamConsumer::new(cancel)
            .consume(chunks(&[chunk.as_bytes()]), |e| {
                events.push(e);
                trigger.cancel();
            })
            .await
            .unwrap();
        assert_eq!(summary.outcome, ConsumeOutcome::Cancelled);
        assert_eq!(summary.delivered, 1);
        assert_eq!(events, vec![StreamEvent::message("a")]);
    }

    #[tokio::test]
    async fn test_source_error_propagates() {
        let source = futures::stream::iter(vec![
            Ok(b"event: message\ndata: \"a\"\n\n".to_vec()),
            Err(Error::status(502, "http://localhost/analyse")),
        ]);
        let mut events = Vec::new();
        let err = StreamConsumer::new(CancellationToken::new())
            .consume(source, |e| events.push(e))
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(events, vec![StreamEvent::message("a")]);
    }
}
