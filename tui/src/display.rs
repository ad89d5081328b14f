//! Display State Types
//!
//! Types that represent the current display state for the TUI.
//! These are derived from ConductorMessages and used for rendering.
//!
//! # Design Philosophy
//!
//! The TUI is a "thin client" - it just renders what the Conductor tells it to.
//! Display state is the bridge between ConductorMessages and rendering. It
//! never decides anything about the conversation; the only thing it owns is
//! how the transcript looks.

use triage_conductor::{
    ConductorMessage, ConductorState, ConversationMessage, EvidencePanel, MessageRole,
    NotifyLevel, DEFAULT_TOP_K,
};

/// Display role for messages
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayRole {
    /// User question
    User,
    /// Answer or diagnostic
    Assistant,
    /// System message
    System,
}

impl From<MessageRole> for DisplayRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => DisplayRole::User,
            MessageRole::Assistant => DisplayRole::Assistant,
            MessageRole::System => DisplayRole::System,
        }
    }
}

impl DisplayRole {
    /// Get the prefix for this role
    pub fn prefix(&self) -> &'static str {
        match self {
            DisplayRole::User => "You: ",
            DisplayRole::Assistant => "Assistant: ",
            DisplayRole::System => "",
        }
    }
}

/// A notification to display
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayNotification {
    /// Notification level
    pub level: NotifyLevel,
    /// Message content
    pub message: String,
}

/// Everything the TUI renders
#[derive(Clone, Debug)]
pub struct DisplayState {
    /// Transcript, mirrored from the Conductor
    pub messages: Vec<ConversationMessage>,
    /// Unsent input text
    pub pending_question: String,
    /// Conductor state
    pub conductor_state: ConductorState,
    /// Retrieval breadth
    pub top_k: u32,
    /// Evidence panel visibility
    pub evidence_visible: bool,
    /// Backend the session talks to
    pub backend: String,
    /// Pending notification (if any)
    pub notification: Option<DisplayNotification>,
    /// Goodbye text once the Conductor asked the surface to quit
    pub quit: Option<String>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            pending_question: String::new(),
            conductor_state: ConductorState::Idle,
            top_k: DEFAULT_TOP_K,
            evidence_visible: false,
            backend: String::new(),
            notification: None,
            quit: None,
        }
    }
}

impl DisplayState {
    /// Create a new display state
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a ConductorMessage to update display state
    pub fn apply_message(&mut self, msg: ConductorMessage) {
        match msg {
            // Conversation messages
            ConductorMessage::Message { message } => {
                // Snapshots replay the transcript on (re)connect
                if !self.messages.iter().any(|m| m.id() == message.id()) {
                    self.messages.push(message);
                }
            }
            ConductorMessage::Cleared => {
                self.messages.clear();
            }
            ConductorMessage::PendingQuestion { text } => {
                self.pending_question = text;
            }

            // View state
            ConductorMessage::EvidenceVisibility { visible } => {
                self.evidence_visible = visible;
            }
            ConductorMessage::TopK { top_k } => {
                self.top_k = top_k;
            }

            // System messages
            ConductorMessage::State { state } => {
                self.conductor_state = state;
            }
            ConductorMessage::SessionInfo { backend, .. } => {
                self.backend = backend;
            }
            ConductorMessage::Notify { level, message } => {
                self.notification = Some(DisplayNotification { level, message });
            }
            ConductorMessage::Quit { message } => {
                self.quit = Some(message.unwrap_or_default());
            }
        }
    }

    /// Whether a request is outstanding
    pub fn is_loading(&self) -> bool {
        self.conductor_state == ConductorState::Dispatched
    }

    /// Whether pressing send would do anything
    pub fn can_send(&self) -> bool {
        self.conductor_state.accepts_submissions() && !self.pending_question.trim().is_empty()
    }

    /// Evidence panel contents
    pub fn evidence(&self) -> EvidencePanel {
        EvidencePanel::from_messages(self.evidence_visible, &self.messages)
    }

    /// Clear the notification
    pub fn clear_notification(&mut self) {
        self.notification = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use triage_conductor::{ConversationState, SessionId};

    fn assistant(text: &str, docs: &[&str]) -> ConversationMessage {
        let mut state = ConversationState::new();
        state
            .append_message(
                MessageRole::Assistant,
                text,
                Some(docs.iter().map(ToString::to_string).collect()),
            )
            .clone()
    }

    fn user(text: &str) -> ConversationMessage {
        let mut state = ConversationState::new();
        state.append_message(MessageRole::User, text, None).clone()
    }

    #[test]
    fn test_role_prefix() {
        assert_eq!(DisplayRole::from(MessageRole::User).prefix(), "You: ");
        assert_eq!(
            DisplayRole::from(MessageRole::Assistant).prefix(),
            "Assistant: "
        );
        assert_eq!(DisplayRole::from(MessageRole::System).prefix(), "");
    }

    #[test]
    fn test_default_state() {
        let display = DisplayState::new();
        assert!(display.messages.is_empty());
        assert_eq!(display.top_k, 4);
        assert!(!display.is_loading());
        assert!(!display.can_send());
    }

    #[test]
    fn test_messages_and_clear() {
        let mut display = DisplayState::new();
        display.apply_message(ConductorMessage::Message {
            message: user("What is the late fee?"),
        });
        display.apply_message(ConductorMessage::Message {
            message: assistant("The late fee is $25.", &["policy_fees.pdf"]),
        });
        assert_eq!(display.messages.len(), 2);

        display.apply_message(ConductorMessage::Cleared);
        assert!(display.messages.is_empty());
    }

    #[test]
    fn test_snapshot_replay_does_not_duplicate() {
        let mut display = DisplayState::new();
        let question = user("What is the late fee?");
        display.apply_message(ConductorMessage::Message {
            message: question.clone(),
        });
        display.apply_message(ConductorMessage::Message { message: question });
        assert_eq!(display.messages.len(), 1);
    }

    #[test]
    fn test_can_send_needs_text_and_idle() {
        let mut display = DisplayState::new();
        display.apply_message(ConductorMessage::PendingQuestion {
            text: "   ".to_string(),
        });
        assert!(!display.can_send());

        display.apply_message(ConductorMessage::PendingQuestion {
            text: "why?".to_string(),
        });
        assert!(display.can_send());

        display.apply_message(ConductorMessage::State {
            state: ConductorState::Dispatched,
        });
        assert!(display.is_loading());
        assert!(!display.can_send());
    }

    #[test]
    fn test_evidence_follows_latest_answer() {
        let mut display = DisplayState::new();
        display.apply_message(ConductorMessage::Message {
            message: assistant("first", &["old.pdf"]),
        });
        display.apply_message(ConductorMessage::Message {
            message: assistant("second", &["new.pdf", "faq.md"]),
        });
        display.apply_message(ConductorMessage::EvidenceVisibility { visible: true });

        let panel = display.evidence();
        assert!(panel.visible);
        assert_eq!(panel.docs, vec!["new.pdf", "faq.md"]);
    }

    #[test]
    fn test_session_info_and_notify() {
        let mut display = DisplayState::new();
        display.apply_message(ConductorMessage::SessionInfo {
            session_id: SessionId::new(),
            backend: "http://localhost:8000".to_string(),
        });
        display.apply_message(ConductorMessage::Notify {
            level: NotifyLevel::Warning,
            message: "Unsupported topk 9".to_string(),
        });

        assert_eq!(display.backend, "http://localhost:8000");
        assert_eq!(
            display.notification,
            Some(DisplayNotification {
                level: NotifyLevel::Warning,
                message: "Unsupported topk 9".to_string(),
            })
        );
        display.clear_notification();
        assert!(display.notification.is_none());
    }

    #[test]
    fn test_quit() {
        let mut display = DisplayState::new();
        display.apply_message(ConductorMessage::Quit {
            message: Some("Goodbye!".to_string()),
        });
        assert_eq!(display.quit.as_deref(), Some("Goodbye!"));
    }
}
