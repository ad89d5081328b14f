//! Surface Events
//!
//! Events sent from UI surfaces to the Conductor. A surface reports what the
//! user did; the Conductor decides what it means for the conversation.

use serde::{Deserialize, Serialize};

/// Events from UI Surface to Conductor
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// Surface connected and wants a snapshot of the current state
    Connected {
        /// Surface type identifier
        surface_type: SurfaceType,
    },

    /// User edited the input field
    ///
    /// Always accepted, including while a request is outstanding.
    InputChanged {
        /// Full input text after the edit
        text: String,
    },

    /// User pressed send; submits the pending question
    Submit,

    /// Submit the given text instead of the pending question
    SubmitText {
        /// Question text (trimmed before use)
        text: String,
    },

    /// User cleared the conversation
    Clear,

    /// User toggled the evidence panel
    ToggleEvidence,

    /// User picked a retrieval breadth
    SetTopK {
        /// Requested breadth
        top_k: u32,
    },

    /// User requested quit
    QuitRequested,
}

/// Surface type identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceType {
    /// Terminal UI (ratatui)
    Tui,
    /// Headless (testing, scripting)
    Headless,
}
