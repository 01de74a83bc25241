//! Reply backends for the chat pipeline.
//!
//! The [`ReplyBackend`] trait is the single suspension point of the reply
//! pipeline. Two implementations ship with the crate:
//!
//! - [`SimulatedBackend`]: waits a fixed latency and returns a placeholder.
//! - [`HttpBackend`]: `POST {endpoint}` with `{ "message": .. }`, expecting
//!   `{ "reply": .. }` back.
//!
//! Every failure is reported as a [`BackendError`] whose kind stays
//! distinguishable for diagnostics even though the user only ever sees one
//! generic message.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

/// Request body of the reply contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyRequest {
    /// Latest user text.
    pub message: String,
}

/// Response body of the reply contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyResponse {
    /// Assistant reply text.
    pub reply: String,
}

/// Errors produced by a reply backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No reply arrived within the configured bound.
    #[error("reply timed out after {after:?}")]
    Timeout { after: Duration },

    /// The backend could not be reached.
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend answered but the body was not a reply document.
    #[error("malformed reply: {0}")]
    MalformedResponse(String),

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The pipeline was cancelled before the reply arrived.
    #[error("reply cancelled")]
    Cancelled,
}

impl BackendError {
    /// Stable, machine-readable failure kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::ConnectionRefused(_) => "connection_refused",
            Self::Status { .. } => "status",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Transport(_) => "transport",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Asynchronous source of assistant replies.
#[async_trait]
pub trait ReplyBackend: Send + Sync + std::fmt::Debug {
    /// Produce the assistant reply for `message`.
    async fn reply(&self, message: &str) -> Result<String, BackendError>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

/// Backend that sleeps for a fixed latency and returns a canned reply.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    latency: Duration,
    reply: String,
}

impl SimulatedBackend {
    #[must_use]
    pub fn new(latency: Duration, reply: impl Into<String>) -> Self {
        Self {
            latency,
            reply: reply.into(),
        }
    }

    #[must_use]
    pub fn latency(&self) -> Duration {
        self.latency
    }
}

#[async_trait]
impl ReplyBackend for SimulatedBackend {
    async fn reply(&self, _message: &str) -> Result<String, BackendError> {
        tokio::time::sleep(self.latency).await;
        Ok(self.reply.clone())
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

/// Backend that forwards the message to a remote HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    endpoint: Url,
    timeout: Duration,
    http: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend for `endpoint` whose requests give up after `timeout`.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint,
            timeout,
            http,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn classify(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout {
                after: self.timeout,
            }
        } else if err.is_connect() {
            BackendError::ConnectionRefused(err.to_string())
        } else if err.is_decode() {
            BackendError::MalformedResponse(err.to_string())
        } else {
            BackendError::Transport(err)
        }
    }
}

#[async_trait]
impl ReplyBackend for HttpBackend {
    async fn reply(&self, message: &str) -> Result<String, BackendError> {
        let body = ReplyRequest {
            message: message.to_string(),
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        let parsed: ReplyResponse = serde_json::from_slice(&bytes)
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        Ok(parsed.reply)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
