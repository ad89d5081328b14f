//! Interaction Audit Log
//!
//! Opt-in JSONL record of completed exchanges, one object per line. The log
//! is write-only: it is never read back into a conversation.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::backend::AskResponse;

/// Answers longer than this are cut in the log
pub const SNIPPET_CHARS: usize = 800;

/// Errors writing the audit log
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Failed to create, open or write the file
    #[error("Failed to write audit log {path}: {source}")]
    Io {
        /// Path of the log file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize the record
    #[error("Failed to encode audit record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One logged exchange
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// RFC 3339 UTC timestamp
    pub timestamp: String,
    /// Question as sent
    pub question: String,
    /// Answer, cut to [`SNIPPET_CHARS`] characters
    pub answer_snippet: String,
    /// Documents the backend returned
    pub retrieved_docs: Vec<String>,
}

impl InteractionRecord {
    /// Build a record for a question and its response, stamped now
    pub fn new(question: &str, answer: &str, retrieved_docs: &[String]) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            question: question.to_string(),
            answer_snippet: snippet(answer),
            retrieved_docs: retrieved_docs.to_vec(),
        }
    }
}

fn snippet(answer: &str) -> String {
    match answer.char_indices().nth(SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}...", &answer[..cut]),
        None => answer.to_string(),
    }
}

/// Append-only JSONL interaction log
#[derive(Clone, Debug)]
pub struct InteractionLog {
    path: PathBuf,
}

impl InteractionLog {
    /// Log to the given file (created on first write)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    pub async fn append(&self, record: &InteractionRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let io_err = |source| AuditError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_err)?;
        file.write_all(line.as_bytes()).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
        Ok(())
    }

    /// Record a successful exchange, logging and swallowing write failures
    pub async fn record(&self, question: &str, answer: &str, response: &AskResponse) {
        let record = InteractionRecord::new(question, answer, &response.retrieved_docs);
        if let Err(e) = self.append(&record).await {
            tracing::warn!(error = %e, "Failed to record interaction");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_answer_kept_whole() {
        assert_eq!(snippet("The late fee is $25."), "The late fee is $25.");
    }

    #[test]
    fn test_long_answer_cut() {
        let answer = "é".repeat(SNIPPET_CHARS + 5);
        let cut = snippet(&answer);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), SNIPPET_CHARS + 3);
    }

    #[test]
    fn test_exact_length_not_cut() {
        let answer = "a".repeat(SNIPPET_CHARS);
        assert_eq!(snippet(&answer), answer);
    }

    #[test]
    fn test_timestamp_is_utc() {
        let record = InteractionRecord::new("q", "a", &[]);
        assert!(record.timestamp.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_append_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("interactions.jsonl");
        let log = InteractionLog::new(&path);

        let response = AskResponse::answered("yes", vec!["a.pdf".to_string()]);
        log.record("first?", "yes", &response).await;
        log.record("second?", "yes", &response).await;

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: InteractionRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.question, "first?");
        assert_eq!(first.answer_snippet, "yes");
        assert_eq!(first.retrieved_docs, vec!["a.pdf"]);
    }

    #[tokio::test]
    async fn test_unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for append
        let log = InteractionLog::new(dir.path());
        let record = InteractionRecord::new("q", "a", &[]);
        assert!(matches!(log.append(&record).await, Err(AuditError::Io { .. })));
    }
}
