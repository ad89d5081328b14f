//! Evidence Panel
//!
//! Derives what the evidence panel shows from the conversation. Everything
//! here is a pure function of `(evidence_visible, messages)`; nothing mutates
//! the transcript.

use crate::messages::{MessageId, MessageRole};
use crate::session::{ConversationMessage, ConversationState};

/// What the evidence panel should display
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvidencePanel {
    /// Whether the panel is shown at all
    pub visible: bool,
    /// Assistant message the documents belong to
    pub source: Option<MessageId>,
    /// Documents of the most recent assistant message, in backend order
    pub docs: Vec<String>,
}

impl EvidencePanel {
    /// Build the panel contents from the current conversation
    ///
    /// The panel tracks the most recent assistant message, even when that
    /// message has no documents (a failure or a degraded answer empties it).
    pub fn from_state(state: &ConversationState) -> Self {
        Self::for_message(state.evidence_visible(), state.last_assistant())
    }

    /// Same as [`EvidencePanel::from_state`] for surfaces that mirror the
    /// transcript themselves
    pub fn from_messages(visible: bool, messages: &[ConversationMessage]) -> Self {
        let latest = messages
            .iter()
            .rev()
            .find(|m| m.role() == MessageRole::Assistant);
        Self::for_message(visible, latest)
    }

    fn for_message(visible: bool, latest: Option<&ConversationMessage>) -> Self {
        Self {
            visible,
            source: latest.map(|m| m.id().clone()),
            docs: latest.map(|m| m.docs().to_vec()).unwrap_or_default(),
        }
    }

    /// Whether there is anything to list
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Inline source attribution under an answer, e.g. `Sources: a.pdf, b.md`
///
/// `None` for non-assistant messages and answers without documents.
pub fn sources_line(message: &ConversationMessage) -> Option<String> {
    if message.role() != MessageRole::Assistant || message.docs().is_empty() {
        return None;
    }
    Some(format!("Sources: {}", message.docs().join(", ")))
}
