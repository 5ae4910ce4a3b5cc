//! lcv-proto: streaming protocol client for document analysis
//!
//! This crate turns the chunked event stream served by the analysis backend
//! into typed [`StreamEvent`]s. Bytes flow through an incremental UTF-8
//! decoder, the [`FrameSplitter`], the [`event`] decoder and finally the
//! [`StreamConsumer`] which hands events to a sink in arrival order.

pub mod client;
pub mod consumer;
pub mod error;
pub mod event;
pub mod frame;
pub mod text;
pub mod types;

pub use client::{AnalysisClient, ByteStream, Endpoints};
pub use consumer::{ConsumeOutcome, ConsumeSummary, StreamConsumer};
pub use error::{Error, Result};
pub use event::{DecodeError, decode_frame};
pub use frame::{Frame, FrameSplitter};
pub use text::Utf8Decoder;
pub use types::*;
