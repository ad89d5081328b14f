//! Answer Backend Traits
//!
//! Trait and wire types for the question-answering service. The Conductor only
//! ever talks to an [`AskBackend`]; how the question reaches the service is the
//! implementation's business.
//!
//! # Response Leniency
//!
//! A 2xx body is never rejected for its shape. A missing or empty answer is
//! reported as `answer: None` and the Conductor shows a placeholder; a missing
//! document list is empty; non-string document entries are skipped.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Text shown when a successful response carries no usable answer
pub const NO_ANSWER_PLACEHOLDER: &str = "(no answer)";

/// Request body for `POST /api/ask`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AskRequest {
    /// Trimmed question text
    pub question: String,
    /// Retrieval breadth
    pub topk: u32,
}

impl AskRequest {
    /// Create a new request
    pub fn new(question: impl Into<String>, topk: u32) -> Self {
        Self {
            question: question.into(),
            topk,
        }
    }
}

/// Parsed success response
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AskResponse {
    /// Answer text, `None` when the body had no usable answer
    pub answer: Option<String>,
    /// Evidence document identifiers, in backend order
    pub retrieved_docs: Vec<String>,
}

impl AskResponse {
    /// Create a response with an answer
    pub fn answered(answer: impl Into<String>, retrieved_docs: Vec<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            retrieved_docs,
        }
    }

    /// Extract a response from an arbitrary JSON body
    ///
    /// `answer` wins over the legacy `answer_text` field; an empty string
    /// counts as absent.
    pub fn from_json(body: &Value) -> Self {
        let non_empty = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let answer = non_empty("answer").or_else(|| non_empty("answer_text"));

        let retrieved_docs = body
            .get("retrieved_docs")
            .and_then(Value::as_array)
            .map(|docs| {
                docs.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            answer,
            retrieved_docs,
        }
    }
}

/// Why a request produced no response body
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Non-2xx HTTP status
    #[error("Server {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, kept for logs only
        body: String,
    },

    /// Connection refused, DNS failure, reset and the like
    #[error("{0}")]
    Transport(String),

    /// 2xx response whose body is not JSON
    #[error("invalid response body: {0}")]
    Decode(String),

    /// No settlement within the configured timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The request task panicked or was cancelled
    #[error("request task aborted: {0}")]
    Aborted(String),
}

/// Answer backend trait
///
/// Implement this to point the Conductor at a different service.
#[async_trait]
pub trait AskBackend: Send + Sync {
    /// Get the backend name, shown to surfaces on connect
    fn name(&self) -> &str;

    /// Send one question and wait for the full response
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, BackendError>;
}
