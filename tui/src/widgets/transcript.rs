//! Transcript layout: turns the display state into wrapped, styled lines.

use ratatui::style::{Modifier, Style};

use triage_conductor::{sources_line, ConductorState};

use super::text_block::{wrap_styled, StyledLine};
use crate::display::{DisplayRole, DisplayState};
use crate::theme::{self, THINKING_BLUE};

/// Build the transcript lines for a region `width` columns wide
///
/// Each message is prefixed by its speaker. Answers with evidence get an
/// inline sources line. While a request is outstanding a thinking line
/// closes the transcript.
pub fn transcript_lines(display: &DisplayState, width: usize) -> Vec<StyledLine> {
    let mut lines = Vec::new();

    for message in &display.messages {
        let role = DisplayRole::from(message.role());
        let content = format!("{}{}", role.prefix(), message.text());
        lines.extend(wrap_styled(&content, width, theme::role_style(role)));

        if let Some(sources) = sources_line(message) {
            lines.extend(wrap_styled(&sources, width, theme::sources_style()));
        }
        lines.push(StyledLine::blank());
    }

    if display.conductor_state == ConductorState::Dispatched {
        lines.push(StyledLine::new(
            ConductorState::Dispatched.description(),
            Style::default()
                .fg(THINKING_BLUE)
                .add_modifier(Modifier::ITALIC),
        ));
    }

    lines
}
