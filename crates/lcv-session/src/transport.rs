//! Transport abstraction for opening analysis streams

use async_trait::async_trait;
use lcv_proto::{AnalyseRequest, AnalysisClient, ByteStream, Endpoints, ResumeRequest, Result};

/// A request the session sends to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundRequest {
    /// Start a new analysis
    Analyse(AnalyseRequest),
    /// Answer a pending interrupt
    Resume(ResumeRequest),
}

/// Transport for opening an event stream
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the response body once the server has
    /// accepted it. A non-success status is an error.
    async fn open(&self, request: &OutboundRequest) -> Result<ByteStream>;
}

/// HTTP transport - posts to the analyse or resume endpoint
pub struct HttpTransport {
    client: AnalysisClient,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            client: AnalysisClient::new(endpoints),
        }
    }

    /// Create from an existing client
    pub fn with_client(client: AnalysisClient) -> Self {
        Self { client }
    }

    pub fn endpoints(&self) -> &Endpoints {
        self.client.endpoints()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, request: &OutboundRequest) -> Result<ByteStream> {
        match request {
            OutboundRequest::Analyse(request) => self.client.start(request).await,
            OutboundRequest::Resume(request) => self.client.resume(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChatSession, SessionStatus};
    use lcv_proto::{Document, Interrupt, StreamEvent};
    use mockito::Matcher;
    use std::sync::Arc;

    fn body(events: &[StreamEvent]) -> String {
        events.iter().map(StreamEvent::encode).collect()
    }

    #[tokio::test]
    async fn test_session_over_http_interrupt_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let analyse = server
            .mock("POST", "/analyse")
            .match_body(Matcher::Json(serde_json::json!({
                "images": [],
                "documents": [{"type": "pdf_file", "file_data_base64": "cGRm"}],
            })))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body(&[
                StreamEvent::message("Reading the credit. "),
                StreamEvent::Interrupt(Interrupt::new("Accept the discrepancy?", "int-1", "thread-9")),
                StreamEvent::Done,
            ]))
            .create_async()
            .await;
        let resume = server
            .mock("POST", "/resume")
            .match_body(Matcher::Json(serde_json::json!({
                "thread_id": "thread-9",
                "interrupt_id": "int-1",
                "answer": false,
            })))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body(&[StreamEvent::message("Rejected."), StreamEvent::Done]))
            .create_async()
            .await;

        let endpoints = Endpoints::from_base(&server.url(), "/analyse", "/resume").unwrap();
        let transport = HttpTransport::new(endpoints);
        assert!(transport.endpoints().resume.ends_with("/resume"));
        let session = ChatSession::new(Arc::new(transport));

        let request = AnalyseRequest {
            images: vec![],
            documents: vec![Document::new("cGRm")],
        };
        session.send(request).await.unwrap();
        assert_eq!(session.status(), SessionStatus::AwaitingAnswer);
        assert_eq!(session.transcript(), "Reading the credit. ");

        session.answer(false).await.unwrap();
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.transcript(), "Rejected.");

        analyse.assert_async().await;
        resume.assert_async().await;
    }

    #[tokio::test]
    async fn test_session_over_http_bad_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/analyse")
            .with_status(503)
            .create_async()
            .await;

        let endpoints = Endpoints::from_base(&server.url(), "/analyse", "/resume").unwrap();
        let session = ChatSession::new(Arc::new(HttpTransport::new(endpoints)));

        assert!(session.send(AnalyseRequest::default()).await.is_err());
        assert_eq!(session.status(), SessionStatus::Errored);
        assert!(session.last_error().unwrap().contains("503"));
        mock.assert_async().await;
    }
}
