//! Evidence Panel Widget
//!
//! Lists the documents retrieved for the most recent answer.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget, Wrap};

use triage_conductor::EvidencePanel;

use crate::theme::{DIM_GRAY, EVIDENCE_AMBER};

/// Shown when the latest answer has no documents
pub const NO_EVIDENCE: &str = "No documents for the latest answer.";

/// Bordered list of evidence documents
pub struct EvidenceView<'a> {
    panel: &'a EvidencePanel,
}

impl<'a> EvidenceView<'a> {
    /// View over a derived panel
    pub fn new(panel: &'a EvidencePanel) -> Self {
        Self { panel }
    }

    fn lines(&self) -> Vec<Line<'a>> {
        if self.panel.is_empty() {
            return vec![Line::from(Span::styled(
                NO_EVIDENCE,
                Style::default().fg(DIM_GRAY),
            ))];
        }

        self.panel
            .docs
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                Line::from(vec![
                    Span::styled(format!("{}. ", i + 1), Style::default().fg(DIM_GRAY)),
                    Span::styled(doc.as_str(), Style::default().fg(EVIDENCE_AMBER)),
                ])
            })
            .collect()
    }
}

impl Widget for EvidenceView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::LEFT)
            .border_style(Style::default().fg(DIM_GRAY))
            .title(" Evidence ");

        Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
