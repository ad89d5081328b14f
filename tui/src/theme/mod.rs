//! Theme and Colors
//!
//! The triage palette: quiet grays for chrome, one accent per speaker.

use ratatui::style::{Color, Modifier, Style};

use triage_conductor::NotifyLevel;

use crate::display::DisplayRole;

// ============================================================================
// Speaker Colors
// ============================================================================

/// User question green
pub const USER_GREEN: Color = Color::Rgb(130, 220, 130);

/// Assistant answer teal
pub const ASSISTANT_TEAL: Color = Color::Rgb(110, 200, 210);

/// System/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

// ============================================================================
// UI Colors
// ============================================================================

/// Source attributions and the evidence panel
pub const EVIDENCE_AMBER: Color = Color::Rgb(230, 190, 110);

/// "Assistant is thinking..." indicator
pub const THINKING_BLUE: Color = Color::Rgb(150, 180, 255);

/// Warning yellow
pub const WARNING_YELLOW: Color = Color::Rgb(240, 210, 90);

/// Error red
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Fade shades for lines at a scroll edge (outermost first)
pub const FADE: [Color; 2] = [Color::Rgb(80, 80, 80), Color::Rgb(120, 120, 120)];

/// Style for a transcript line by speaker
pub fn role_style(role: DisplayRole) -> Style {
    match role {
        DisplayRole::User => Style::default().fg(USER_GREEN),
        DisplayRole::Assistant => Style::default().fg(ASSISTANT_TEAL),
        DisplayRole::System => Style::default().fg(DIM_GRAY),
    }
}

/// Style for inline "Sources: ..." lines
pub fn sources_style() -> Style {
    Style::default()
        .fg(EVIDENCE_AMBER)
        .add_modifier(Modifier::ITALIC)
}

/// Style for a notification
pub fn notify_style(level: NotifyLevel) -> Style {
    match level {
        NotifyLevel::Info => Style::default().fg(DIM_GRAY),
        NotifyLevel::Warning => Style::default().fg(WARNING_YELLOW),
        NotifyLevel::Error => Style::default().fg(ERROR_RED),
    }
}
