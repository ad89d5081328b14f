//! HTTP Backend Implementation
//!
//! Answer backend for the retrieval service's JSON API.
//!
//! # API
//!
//! - `POST /api/ask` with `{"question": string, "topk": integer}`
//! - 2xx: `{"answer": string, "retrieved_docs"?: [string]}`
//! - anything else is a failure

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::traits::{AskBackend, AskRequest, AskResponse, BackendError};

/// Default per-request timeout for the HTTP client
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How long an error response body may take to arrive before it is dropped
const ERROR_BODY_WAIT: Duration = Duration::from_secs(2);

/// HTTP answer backend
#[derive(Clone, Debug)]
pub struct HttpBackend {
    /// Base URL without trailing slash
    base_url: String,
    /// Client-side timeout, reported when it fires
    timeout: Duration,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpBackend {
    /// Create a new HTTP backend with the default timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a new HTTP backend with an explicit timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            http_client,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get ask endpoint URL
    fn ask_url(&self) -> String {
        format!("{}/api/ask", self.base_url)
    }

    fn map_request_error(&self, error: &reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else {
            BackendError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl AskBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, BackendError> {
        let url = self.ask_url();
        tracing::debug!(url = %url, topk = request.topk, "Sending question");

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_request_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            // The status decides; the body is only kept for the log
            let body = tokio::time::timeout(ERROR_BODY_WAIT, response.text())
                .await
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "Backend returned error status");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_request_error(&e))?;

        let json: Value =
            serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(AskResponse::from_json(&json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://localhost:8000/").unwrap();
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.ask_url(), "http://localhost:8000/api/ask");
    }

    #[test]
    fn test_name_is_base_url() {
        let backend = HttpBackend::new("https://rag.internal").unwrap();
        assert_eq!(backend.name(), "https://rag.internal");
    }
}
