//! Conversation Store
//!
//! The ordered transcript plus the small amount of view state that belongs to
//! a conversation session. Pure state: no I/O, no async.
//!
//! # Invariants
//!
//! - Messages are append-only and totally ordered by append order.
//! - An appended message is never altered; only shared references leave the
//!   store.
//! - Evidence (`docs`) only ever sits on assistant messages.
//!
//! The store does not enforce the single-flight policy or validate `top_k`;
//! the Conductor and the surfaces do that at the boundary.

use serde::{Deserialize, Serialize};

use crate::messages::{MessageId, MessageRole};

/// Retrieval breadth used when nothing else is configured
pub const DEFAULT_TOP_K: u32 = 4;

/// Retrieval breadths a surface may offer
pub const SUPPORTED_TOP_K: [u32; 5] = [2, 3, 4, 5, 6];

/// Whether `top_k` is one of the breadths surfaces may offer
#[must_use]
pub fn is_supported_top_k(top_k: u32) -> bool {
    SUPPORTED_TOP_K.contains(&top_k)
}

/// A message in the conversation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    id: MessageId,
    role: MessageRole,
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    docs: Option<Vec<String>>,
    timestamp: u64,
}

impl ConversationMessage {
    /// Create a new message with a fresh ID
    ///
    /// Assistant messages always carry a (possibly empty) document list.
    /// Documents passed for any other role are dropped.
    pub fn new(role: MessageRole, text: impl Into<String>, docs: Option<Vec<String>>) -> Self {
        let docs = match role {
            MessageRole::Assistant => Some(docs.unwrap_or_default()),
            MessageRole::User | MessageRole::System => {
                if docs.as_ref().is_some_and(|d| !d.is_empty()) {
                    tracing::warn!(?role, "Dropping evidence passed for a non-assistant message");
                }
                None
            }
        };

        Self {
            id: MessageId::new(),
            role,
            text: text.into(),
            docs,
            timestamp: now_ms(),
        }
    }

    /// Unique message ID
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Who sent this message
    pub fn role(&self) -> MessageRole {
        self.role
    }

    /// Display text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Evidence document identifiers, in backend order (empty if none)
    pub fn docs(&self) -> &[String] {
        self.docs.as_deref().unwrap_or(&[])
    }

    /// Whether this message carries an evidence list at all
    pub fn carries_docs(&self) -> bool {
        self.docs.is_some()
    }

    /// When the message was created (Unix timestamp ms)
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Conversation state for one session
#[derive(Clone, Debug)]
pub struct ConversationState {
    /// Transcript, in append order
    messages: Vec<ConversationMessage>,
    /// Unsent input text
    pending_question: String,
    /// True while a request is outstanding
    loading: bool,
    /// Retrieval breadth sent with each question
    top_k: u32,
    /// Evidence panel visibility (view state only)
    evidence_visible: bool,
    /// Bumped on every clear; tags in-flight requests
    generation: u64,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            pending_question: String::new(),
            loading: false,
            top_k: DEFAULT_TOP_K,
            evidence_visible: false,
            generation: 0,
        }
    }
}

impl ConversationState {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty conversation with a starting breadth and panel state
    pub fn with_view(top_k: u32, evidence_visible: bool) -> Self {
        Self {
            top_k,
            evidence_visible,
            ..Self::default()
        }
    }

    /// Append a message and return it
    ///
    /// The conversation grows by exactly one entry; nothing else changes.
    pub fn append_message(
        &mut self,
        role: MessageRole,
        text: impl Into<String>,
        docs: Option<Vec<String>>,
    ) -> &ConversationMessage {
        let idx = self.messages.len();
        self.messages.push(ConversationMessage::new(role, text, docs));
        &self.messages[idx]
    }

    /// Replace the unsent input text
    pub fn set_pending_question(&mut self, text: impl Into<String>) {
        self.pending_question = text.into();
    }

    /// Set the loading flag
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Set the retrieval breadth (any value; callers validate)
    pub fn set_top_k(&mut self, top_k: u32) {
        self.top_k = top_k;
    }

    /// Empty the transcript
    ///
    /// Leaves `pending_question`, `loading` and `top_k` alone.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Flip evidence panel visibility, returning the new value
    pub fn toggle_evidence_visible(&mut self) -> bool {
        self.evidence_visible = !self.evidence_visible;
        self.evidence_visible
    }

    /// All messages, in order
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// Most recent assistant message, if any
    pub fn last_assistant(&self) -> Option<&ConversationMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
    }

    /// Number of messages in the transcript
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Unsent input text
    pub fn pending_question(&self) -> &str {
        &self.pending_question
    }

    /// Whether a request is outstanding
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Retrieval breadth
    pub fn top_k(&self) -> u32 {
        self.top_k
    }

    /// Evidence panel visibility
    pub fn evidence_visible(&self) -> bool {
        self.evidence_visible
    }

    /// Clear generation
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Get current timestamp in milliseconds
fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}
