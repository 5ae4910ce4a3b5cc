//! Decoding frames into stream events

use serde::Deserialize;
use thiserror::Error;

use crate::{frame::Frame, types::Interrupt, types::StreamEvent};

/// Why a frame could not be turned into a [`StreamEvent`].
///
/// Decode failures are local to one frame; the consumer logs and skips them.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// No `event:` line in the frame
    #[error("frame has no event name")]
    MissingEvent,

    /// No `data:` line where the event requires a payload
    #[error("'{0}' frame has no data")]
    MissingData(String),

    /// Event name is not one we understand
    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    /// Payload is not valid JSON
    #[error("invalid JSON in '{event}' frame: {source}")]
    Json {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    /// Payload is valid JSON of the wrong shape
    #[error("unexpected payload for '{event}': {source}")]
    Shape {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Event name and joined data lines of one frame
#[derive(Debug, Default, PartialEq, Eq)]
struct RawFields<'a> {
    event: Option<&'a str>,
    data: Option<String>,
}

fn parse_fields(frame: &str) -> RawFields<'_> {
    let mut fields = RawFields::default();
    for line in frame.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (name, value) = match line.split_once(':') {
            Some((name, value)) => (name, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match name {
            "event" => fields.event = Some(value.trim()),
            "data" => match fields.data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => fields.data = Some(value.to_string()),
            },
            // id, retry and anything else carry nothing we use
            _ => {}
        }
    }
    fields
}

#[derive(Deserialize)]
struct InterruptPayload {
    question: String,
    interrupt_id: String,
    thread_id: String,
}

fn payload(event: &str, data: Option<String>) -> Result<serde_json::Value, DecodeError> {
    let data = data.ok_or_else(|| DecodeError::MissingData(event.to_string()))?;
    serde_json::from_str(data.trim()).map_err(|source| DecodeError::Json {
        event: event.to_string(),
        source,
    })
}

/// Decode one complete frame.
///
/// Pure: the same frame always gives the same result.
pub fn decode_frame(frame: &Frame) -> Result<StreamEvent, DecodeError> {
    let RawFields { event, data } = parse_fields(frame.as_str());
    let event = event.ok_or(DecodeError::MissingEvent)?;

    match event {
        "message" => {
            let value = payload(event, data)?;
            let text = String::deserialize(value).map_err(|source| DecodeError::Shape {
                event: event.to_string(),
                source,
            })?;
            Ok(StreamEvent::Message { text })
        }
        "interrupt" => {
            let value = payload(event, data)?;
            let InterruptPayload {
                question,
                interrupt_id,
                thread_id,
            } = InterruptPayload::deserialize(value).map_err(|source| DecodeError::Shape {
                event: event.to_string(),
                source,
            })?;
            Ok(StreamEvent::Interrupt(Interrupt {
                question,
                interrupt_id,
                thread_id,
            }))
        }
        // Payload is ignored, absent or not
        "done" => Ok(StreamEvent::Done),
        other => Err(DecodeError::UnknownEvent(other.to_string())),
    }
}
