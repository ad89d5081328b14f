//! Conductor Messages
//!
//! Messages sent from the Conductor to UI surfaces. These are the only way the
//! conversation controller tells a surface what changed.
//!
//! # Design Philosophy
//!
//! Surfaces are pure renderers. They apply these messages to their own display
//! state and never mutate the conversation store. This keeps the store's
//! invariants (ordering, single in-flight request, evidence on the right
//! answer) in one place and lets the same core drive a TUI, a test harness or
//! a headless script.

use serde::{Deserialize, Serialize};

use crate::session::ConversationMessage;

/// Messages from Conductor to UI Surface
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ConductorMessage {
    // ============================================
    // Conversation Messages
    // ============================================
    /// A message was appended to the transcript
    Message {
        /// The appended message (immutable from here on)
        message: ConversationMessage,
    },

    /// The transcript was emptied
    Cleared,

    /// The unsent input text changed
    PendingQuestion {
        /// Current input text
        text: String,
    },

    // ============================================
    // View State
    // ============================================
    /// Evidence panel shown or hidden
    EvidenceVisibility {
        /// Whether the panel is visible
        visible: bool,
    },

    /// Retrieval breadth changed
    TopK {
        /// Number of documents the backend should retrieve
        top_k: u32,
    },

    // ============================================
    // System Messages
    // ============================================
    /// System notification
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Message content
        message: String,
    },

    /// Conductor state change
    State {
        /// The new state
        state: ConductorState,
    },

    /// Session information, sent when a surface connects
    SessionInfo {
        /// Session ID
        session_id: SessionId,
        /// Backend the questions are sent to
        backend: String,
    },

    /// Request surface to quit
    Quit {
        /// Optional goodbye message
        message: Option<String>,
    },
}

/// Message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new unique session ID
    ///
    /// Counter plus timestamp, so two sessions created in the same
    /// millisecond still differ.
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::time::{SystemTime, UNIX_EPOCH};

        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let count = COUNTER.fetch_add(1, Ordering::SeqCst);
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(format!("session_{timestamp}_{count}"))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    /// User question
    User,
    /// Backend answer or a synthesized diagnostic
    Assistant,
    /// System message
    System,
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
}

/// Conductor operational states
///
/// A submission moves `Idle -> Dispatched`; settlement moves it back to
/// `Idle`. There is no state with two requests outstanding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConductorState {
    /// No request outstanding, submissions accepted
    Idle,
    /// One request outstanding, submissions rejected
    Dispatched,
    /// Shutting down
    ShuttingDown,
}

impl ConductorState {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Dispatched => "Assistant is thinking...",
            Self::ShuttingDown => "Shutting down...",
        }
    }

    /// Whether a new submission would be accepted
    #[must_use]
    pub fn accepts_submissions(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
