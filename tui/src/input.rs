//! Key Bindings
//!
//! Maps terminal key presses to user actions. Pure: the App turns actions into
//! SurfaceEvents, so the bindings can be tested without a terminal.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use triage_conductor::SUPPORTED_TOP_K;

/// Something the user asked for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Leave the application
    Quit,
    /// Send the pending question
    Submit,
    /// Empty the transcript
    Clear,
    /// Show or hide the evidence panel
    ToggleEvidence,
    /// Move to the next supported retrieval breadth
    CycleTopK,
    /// The input text after an edit
    Edit(String),
    /// Scroll the transcript
    Scroll(ScrollAction),
}

/// Transcript scrolling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollAction {
    /// One page towards older messages
    PageUp,
    /// One page towards newer messages
    PageDown,
    /// Oldest message
    Top,
    /// Latest message
    Bottom,
}

/// Map a key press to an action
///
/// `pending` is the current input text; edits produce the full new text.
pub fn map_key(key: KeyEvent, pending: &str) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('c') if ctrl => Some(Action::Quit),

        KeyCode::Enter => Some(Action::Submit),
        KeyCode::Char('l') if ctrl => Some(Action::Clear),
        KeyCode::Char('e') if ctrl => Some(Action::ToggleEvidence),
        KeyCode::F(2) => Some(Action::ToggleEvidence),
        KeyCode::Char('t') if ctrl => Some(Action::CycleTopK),
        KeyCode::F(3) => Some(Action::CycleTopK),

        KeyCode::PageUp => Some(Action::Scroll(ScrollAction::PageUp)),
        KeyCode::PageDown => Some(Action::Scroll(ScrollAction::PageDown)),
        KeyCode::Home if ctrl => Some(Action::Scroll(ScrollAction::Top)),
        KeyCode::End if ctrl => Some(Action::Scroll(ScrollAction::Bottom)),

        // Other control chords are not text
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(c) => {
            let mut text = pending.to_string();
            text.push(c);
            Some(Action::Edit(text))
        }
        KeyCode::Backspace => {
            if pending.is_empty() {
                return None;
            }
            let mut text = pending.to_string();
            text.pop();
            Some(Action::Edit(text))
        }

        _ => None,
    }
}

/// Next supported breadth after `current`, wrapping around
///
/// An unsupported `current` starts over from the smallest breadth.
pub fn next_top_k(current: u32) -> u32 {
    let pos = SUPPORTED_TOP_K.iter().position(|&k| k == current);
    match pos {
        Some(i) => SUPPORTED_TOP_K[(i + 1) % SUPPORTED_TOP_K.len()],
        None => SUPPORTED_TOP_K[0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(map_key(key(KeyCode::Esc), ""), Some(Action::Quit));
        assert_eq!(map_key(ctrl('c'), "draft"), Some(Action::Quit));
    }

    #[test]
    fn test_typing_builds_full_text() {
        assert_eq!(
            map_key(key(KeyCode::Char('e')), "What is the late fe"),
            Some(Action::Edit("What is the late fee".to_string()))
        );
        assert_eq!(
            map_key(key(KeyCode::Backspace), "fee?"),
            Some(Action::Edit("fee".to_string()))
        );
        assert_eq!(map_key(key(KeyCode::Backspace), ""), None);
    }

    #[test]
    fn test_control_chords() {
        assert_eq!(map_key(ctrl('l'), ""), Some(Action::Clear));
        assert_eq!(map_key(ctrl('e'), ""), Some(Action::ToggleEvidence));
        assert_eq!(map_key(key(KeyCode::F(2)), ""), Some(Action::ToggleEvidence));
        assert_eq!(map_key(ctrl('t'), ""), Some(Action::CycleTopK));
        assert_eq!(map_key(ctrl('x'), "draft"), None);
    }

    #[test]
    fn test_enter_submits() {
        assert_eq!(map_key(key(KeyCode::Enter), ""), Some(Action::Submit));
    }

    #[test]
    fn test_scroll_keys() {
        assert_eq!(
            map_key(key(KeyCode::PageUp), ""),
            Some(Action::Scroll(ScrollAction::PageUp))
        );
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::End, KeyModifiers::CONTROL), ""),
            Some(Action::Scroll(ScrollAction::Bottom))
        );
        assert_eq!(map_key(key(KeyCode::Home), ""), None);
    }

    #[test]
    fn test_next_top_k_cycles() {
        assert_eq!(next_top_k(2), 3);
        assert_eq!(next_top_k(4), 5);
        assert_eq!(next_top_k(6), 2);
        assert_eq!(next_top_k(9), 2);
    }
}
