//! Wire types: stream events and request bodies

use serde::{Deserialize, Serialize};

/// A pause point raised by the server, waiting on a yes/no answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interrupt {
    /// Question to put to the human
    pub question: String,
    /// Identifies this specific pause point
    pub interrupt_id: String,
    /// Identifies the conversation on the server
    pub thread_id: String,
}

impl Interrupt {
    pub fn new(
        question: impl Into<String>,
        interrupt_id: impl Into<String>,
        thread_id: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            interrupt_id: interrupt_id.into(),
            thread_id: thread_id.into(),
        }
    }

    /// Build the resume request answering this interrupt
    pub fn resume(&self, answer: bool) -> ResumeRequest {
        ResumeRequest {
            thread_id: self.thread_id.clone(),
            interrupt_id: self.interrupt_id.clone(),
            answer,
        }
    }
}

/// Events decoded from the analysis stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental chunk of assistant output
    Message { text: String },
    /// Server paused awaiting a human answer
    Interrupt(Interrupt),
    /// No more events on this stream
    Done,
}

impl StreamEvent {
    /// Create a message event
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message { text: text.into() }
    }

    /// Wire name used on the `event:` line
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Message { .. } => "message",
            StreamEvent::Interrupt(_) => "interrupt",
            StreamEvent::Done => "done",
        }
    }

    /// Check if this event ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done)
    }

    /// Text of a message event
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StreamEvent::Message { text } => Some(text),
            _ => None,
        }
    }

    /// Encode as a wire frame, delimiter included
    pub fn encode(&self) -> String {
        let data = match self {
            StreamEvent::Message { text } => serde_json::Value::String(text.clone()),
            StreamEvent::Interrupt(interrupt) => serde_json::json!({
                "question": interrupt.question,
                "interrupt_id": interrupt.interrupt_id,
                "thread_id": interrupt.thread_id,
            }),
            StreamEvent::Done => serde_json::Value::Null,
        };
        format!("event: {}\ndata: {}\n\n", self.name(), data)
    }
}

/// An image attachment, base64 encoded without the data URL prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "image")]
pub struct Image {
    pub image_url_base64: String,
}

impl Image {
    pub fn new(image_url_base64: impl Into<String>) -> Self {
        Self {
            image_url_base64: image_url_base64.into(),
        }
    }
}

/// A PDF attachment, base64 encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "pdf_file")]
pub struct Document {
    pub file_data_base64: String,
}

impl Document {
    pub fn new(file_data_base64: impl Into<String>) -> Self {
        Self {
            file_data_base64: file_data_base64.into(),
        }
    }
}

/// Body of the start-analysis request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyseRequest {
    pub images: Vec<Image>,
    pub documents: Vec<Document>,
}

impl AnalyseRequest {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.documents.is_empty()
    }
}

/// Body of the resume request answering an interrupt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeRequest {
    pub thread_id: String,
    pub interrupt_id: String,
    pub answer: bool,
}
