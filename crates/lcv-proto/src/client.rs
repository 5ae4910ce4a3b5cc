//! HTTP client for the analyse and resume endpoints

use std::pin::Pin;

use futures::{Stream, StreamExt};
use serde::Serialize;

use crate::{
    error::{Error, Result},
    types::{AnalyseRequest, ResumeRequest},
};

/// A response body as a stream of raw chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// URLs of the two endpoints the client talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Starts a new analysis
    pub analyse: String,
    /// Resumes a thread paused on an interrupt
    pub resume: String,
}

impl Endpoints {
    pub fn new(analyse: impl Into<String>, resume: impl Into<String>) -> Self {
        Self {
            analyse: analyse.into(),
            resume: resume.into(),
        }
    }

    /// Join both paths onto a base URL
    pub fn from_base(base_url: &str, analyse_path: &str, resume_path: &str) -> Result<Self> {
        let base = base_url.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }
        let join = |path: &str| format!("{}/{}", base, path.trim().trim_start_matches('/'));
        Ok(Self::new(join(analyse_path), join(resume_path)))
    }
}

/// Client for the streaming analysis backend
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl AnalysisClient {
    /// Create a client with a fresh connection pool
    pub fn new(endpoints: Endpoints) -> Self {
        Self::with_client(reqwest::Client::new(), endpoints)
    }

    /// Create a client sharing an existing `reqwest::Client`
    pub fn with_client(http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// POST a start request and return the event stream body
    pub async fn start(&self, request: &AnalyseRequest) -> Result<ByteStream> {
        tracing::debug!(
            images = request.images.len(),
            documents = request.documents.len(),
            "Starting analysis"
        );
        self.post(&self.endpoints.analyse, request).await
    }

    /// POST a resume request and return the event stream body
    pub async fn resume(&self, request: &ResumeRequest) -> Result<ByteStream> {
        tracing::debug!(
            thread_id = %request.thread_id,
            interrupt_id = %request.interrupt_id,
            answer = request.answer,
            "Resuming thread"
        );
        self.post(&self.endpoints.resume, request).await
    }

    async fn post<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<ByteStream> {
        let response = self
            .http
            .post(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Body of a failed call is not read
            return Err(Error::status(status.as_u16(), url));
        }

        tracing::debug!("{} answered {}", url, status);
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(Error::from));
        Ok(Box::pin(body))
    }
}
