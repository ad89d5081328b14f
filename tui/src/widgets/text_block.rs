//! TextBlock Widget
//!
//! A borderless, scrollable region of pre-styled lines, anchored to the
//! bottom so the newest content stays in view.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::StatefulWidget;
use textwrap::wrap;

use crate::theme::FADE;

/// One rendered line and its style
#[derive(Clone, Debug, PartialEq)]
pub struct StyledLine {
    /// Line text (already wrapped)
    pub text: String,
    /// Style to draw it with
    pub style: Style,
}

impl StyledLine {
    /// Create a styled line
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// An empty spacer line
    pub fn blank() -> Self {
        Self::new(String::new(), Style::default())
    }
}

/// Wrap `text` to `width`, keeping explicit line breaks
pub fn wrap_styled(text: &str, width: usize, style: Style) -> Vec<StyledLine> {
    let width = width.max(1);
    text.lines()
        .flat_map(|line| {
            if line.is_empty() {
                vec![StyledLine::new(String::new(), style)]
            } else {
                wrap(line, width)
                    .into_iter()
                    .map(|cow| StyledLine::new(cow.into_owned(), style))
                    .collect()
            }
        })
        .collect()
}

/// State for a scrollable text block
#[derive(Debug, Default)]
pub struct TextBlockState {
    /// Scroll offset (lines from bottom, 0 = latest)
    pub scroll_offset: usize,
    /// Total content lines at last render
    pub total_lines: usize,
    /// Visible height at last render
    pub height: usize,
}

impl TextBlockState {
    /// Scroll towards older lines
    pub fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.total_lines.saturating_sub(self.height);
        self.scroll_offset = (self.scroll_offset + lines).min(max_scroll);
    }

    /// Scroll towards newer lines
    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Scroll to the oldest line
    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = self.total_lines.saturating_sub(self.height);
    }

    /// Scroll to the latest line
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    /// Half the visible height, at least one line
    pub fn page(&self) -> usize {
        (self.height / 2).max(1)
    }
}

/// A borderless, scrollable text block
pub struct TextBlock<'a> {
    lines: &'a [StyledLine],
}

impl<'a> TextBlock<'a> {
    /// Block over already wrapped lines
    pub fn new(lines: &'a [StyledLine]) -> Self {
        Self { lines }
    }
}

impl StatefulWidget for TextBlock<'_> {
    type State = TextBlockState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let height = area.height as usize;
        state.total_lines = self.lines.len();
        state.height = height;

        // Clamp scroll
        let max_scroll = state.total_lines.saturating_sub(height);
        state.scroll_offset = state.scroll_offset.min(max_scroll);

        let visible_end = state.total_lines - state.scroll_offset;
        let visible_start = visible_end.saturating_sub(height);
        let has_content_above = visible_start > 0;
        let has_content_below = state.scroll_offset > 0;

        let visible = &self.lines[visible_start..visible_end];
        for (i, line) in visible.iter().enumerate() {
            // Shade the two lines at an edge with hidden content past it
            let from_bottom = visible.len() - 1 - i;
            let style = if has_content_above && i < FADE.len() {
                Style::default().fg(FADE[i])
            } else if has_content_below && from_bottom < FADE.len() {
                Style::default().fg(FADE[from_bottom])
            } else {
                line.style
            };

            let y = area.y + u16::try_from(i).unwrap_or(u16::MAX);
            let text: String = line.text.chars().take(area.width as usize).collect();
            buf.set_string(area.x, y, &text, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(n: usize) -> Vec<StyledLine> {
        (0..n)
            .map(|i| StyledLine::new(format!("line {i}"), Style::default()))
            .collect()
    }

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn test_wrap_styled_keeps_breaks() {
        let wrapped = wrap_styled("one two three\n\nfour", 8, Style::default());
        let texts: Vec<_> = wrapped.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["one two", "three", "", "four"]);
    }

    #[test]
    fn test_renders_latest_lines() {
        let content = lines(10);
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        let mut state = TextBlockState::default();

        TextBlock::new(&content).render(area, &mut buf, &mut state);

        assert_eq!(row(&buf, 0), "line 7");
        assert_eq!(row(&buf, 2), "line 9");
        assert_eq!(state.total_lines, 10);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let content = lines(10);
        let area = Rect::new(0, 0, 20, 4);
        let mut buf = Buffer::empty(area);
        let mut state = TextBlockState::default();
        TextBlock::new(&content).render(area, &mut buf, &mut state);

        state.scroll_up(100);
        assert_eq!(state.scroll_offset, 6);

        TextBlock::new(&content).render(area, &mut buf, &mut state);
        assert_eq!(row(&buf, 0), "line 0");

        state.scroll_down(100);
        assert_eq!(state.scroll_offset, 0);
    }
}
