//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, resize)
//! - ConductorClient for the conversation
//! - DisplayState for rendering
//!
//! The App:
//! 1. Converts terminal events to SurfaceEvents
//! 2. Sends events to the embedded Conductor via ConductorClient
//! 3. Receives ConductorMessages and updates DisplayState
//! 4. Renders based on DisplayState

use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::{Frame, Terminal};

use triage_conductor::{AskBackend, ConductorMessage, HttpBackend};

use crate::conductor_client::ConductorClient;
use crate::display::DisplayState;
use crate::input::{map_key, next_top_k, Action, ScrollAction};
use crate::theme::{self, DIM_GRAY, USER_GREEN};
use crate::widgets::text_block::wrap_styled;
use crate::widgets::{transcript_lines, EvidenceView, TextBlock, TextBlockState};

/// Input box height (lines) for text wrapping
const INPUT_HEIGHT: u16 = 4;

/// Status area height (hints + tip)
const STATUS_HEIGHT: u16 = 2;

/// Evidence panel share of the conversation width (percent)
const EVIDENCE_WIDTH_PERCENT: u16 = 30;

/// Frame tick
const FRAME: Duration = Duration::from_millis(16);

/// Shown in the empty input box
const INPUT_PLACEHOLDER: &str = "Ask something about invoices, policies, loans...";

/// Always-on reminder under the key hints
const SENSITIVE_DATA_TIP: &str =
    "Tip: sensitive inputs (credit cards, PAN, etc.) will be blocked by the agent.";

/// Main application state
pub struct App<B: AskBackend + 'static = HttpBackend> {
    /// Is the app still running?
    running: bool,
    /// Goodbye message to show on exit
    goodbye_message: Option<String>,

    /// Client for communicating with the embedded Conductor
    conductor: ConductorClient<B>,
    /// Display state derived from ConductorMessages
    display: DisplayState,

    /// Transcript scroll position
    transcript: TextBlockState,
}

impl<B: AskBackend + 'static> App<B> {
    /// Create a new App around a conductor client
    pub fn new(conductor: ConductorClient<B>) -> Self {
        Self {
            running: true,
            goodbye_message: None,
            conductor,
            display: DisplayState::new(),
            transcript: TextBlockState::default(),
        }
    }

    /// Start the Conductor and connect this surface
    pub async fn startup(&mut self) -> anyhow::Result<()> {
        self.conductor.start().await?;
        self.conductor.connect().await?;
        self.process_conductor_messages();
        Ok(())
    }

    /// Main event loop
    pub async fn run<T: Backend>(&mut self, terminal: &mut Terminal<T>) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();

        self.startup().await?;
        terminal.draw(|frame| self.draw(frame))?;

        while self.running {
            tokio::select! {
                biased;

                // Terminal events - highest priority
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        // Only handle Press events (not Release or Repeat)
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key).await?;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Terminal event error");
                        }
                        None => {
                            tracing::info!("Terminal event stream closed");
                            self.running = false;
                        }
                    }
                }

                // Frame tick
                () = tokio::time::sleep(FRAME) => {}
            }

            self.tick().await;
            terminal.draw(|frame| self.draw(frame))?;
        }

        Ok(())
    }

    /// Settle a finished request and apply pending Conductor messages
    pub async fn tick(&mut self) {
        if let Some(settlement) = self.conductor.poll_settlement().await {
            tracing::debug!(kind = ?settlement.kind, "Settled");
            self.transcript.scroll_to_bottom();
        }
        self.process_conductor_messages();
    }

    /// Process all pending messages from the Conductor
    fn process_conductor_messages(&mut self) {
        for msg in self.conductor.recv_all() {
            if let ConductorMessage::Quit { message } = &msg {
                self.goodbye_message.clone_from(message);
                self.running = false;
            }
            self.display.apply_message(msg);
        }
    }

    /// Handle keyboard input
    pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<()> {
        let Some(action) = map_key(key, &self.display.pending_question) else {
            return Ok(());
        };
        self.display.clear_notification();

        match action {
            Action::Quit => {
                self.conductor.request_quit().await?;
            }
            Action::Submit => {
                // Send is disabled while loading or with blank input
                if self.display.can_send() {
                    self.conductor.submit().await?;
                    self.transcript.scroll_to_bottom();
                }
            }
            Action::Clear => {
                self.conductor.clear().await?;
                self.transcript.scroll_to_bottom();
            }
            Action::ToggleEvidence => {
                self.conductor.toggle_evidence().await?;
            }
            Action::CycleTopK => {
                let top_k = next_top_k(self.display.top_k);
                self.conductor.set_top_k(top_k).await?;
            }
            Action::Edit(text) => {
                self.conductor.input_changed(text).await?;
            }
            Action::Scroll(scroll) => {
                let page = self.transcript.page();
                match scroll {
                    ScrollAction::PageUp => self.transcript.scroll_up(page),
                    ScrollAction::PageDown => self.transcript.scroll_down(page),
                    ScrollAction::Top => self.transcript.scroll_to_top(),
                    ScrollAction::Bottom => self.transcript.scroll_to_bottom(),
                }
            }
        }

        // Keep the input mirror current between frames
        self.process_conductor_messages();
        Ok(())
    }

    /// Render the whole UI into a frame
    pub fn draw(&mut self, frame: &mut Frame) {
        let [conversation, input, status] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(INPUT_HEIGHT),
                Constraint::Length(STATUS_HEIGHT),
            ])
            .areas(frame.area());

        let evidence = self.display.evidence();
        let transcript_area = if evidence.visible {
            let [left, right] = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Percentage(100 - EVIDENCE_WIDTH_PERCENT),
                    Constraint::Percentage(EVIDENCE_WIDTH_PERCENT),
                ])
                .areas(conversation);
            frame.render_widget(EvidenceView::new(&evidence), right);
            left
        } else {
            conversation
        };

        self.render_conversation(frame, transcript_area);
        self.render_input(frame, input);
        self.render_status(frame, status);
    }

    /// Render the transcript
    fn render_conversation(&mut self, frame: &mut Frame, area: Rect) {
        let width = area.width.saturating_sub(1) as usize;
        if width < 10 || area.height < 1 {
            return;
        }
        let lines = transcript_lines(&self.display, width);
        frame.render_stateful_widget(TextBlock::new(&lines), area, &mut self.transcript);
    }

    /// Render the input box
    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let buf = frame.buffer_mut();

        let separator = "-".repeat(area.width as usize);
        buf.set_string(area.x, area.y, &separator, Style::default().fg(DIM_GRAY));

        let text_height = area.height.saturating_sub(1) as usize;
        let text_width = area.width.saturating_sub(1) as usize;
        if text_width < 5 || text_height < 1 {
            return;
        }

        let pending = &self.display.pending_question;
        let (content, style) = if pending.is_empty() {
            (
                format!("You: {INPUT_PLACEHOLDER}"),
                Style::default().fg(DIM_GRAY),
            )
        } else {
            (format!("You: {pending}_"), Style::default().fg(USER_GREEN))
        };

        // Keep the cursor end of long input in view
        let wrapped = wrap_styled(&content, text_width, style);
        let skip = wrapped.len().saturating_sub(text_height);
        for (i, line) in wrapped.iter().skip(skip).enumerate() {
            let y = area.y + 1 + u16::try_from(i).unwrap_or(u16::MAX);
            if y < area.y + area.height {
                buf.set_string(area.x, y, &line.text, line.style);
            }
        }
    }

    /// Render status bar and tip
    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let buf = frame.buffer_mut();

        let (status, style) = match &self.display.notification {
            Some(notification) => (
                format!(" {}", notification.message),
                theme::notify_style(notification.level),
            ),
            None => {
                let scroll_info = if self.transcript.scroll_offset > 0 {
                    format!(" [^{} lines]", self.transcript.scroll_offset)
                } else {
                    String::new()
                };
                let send_hint = if self.display.can_send() {
                    "Enter send"
                } else {
                    "Enter (disabled)"
                };
                (
                    format!(
                        " {} | topk {} | {} | Ctrl+E evidence | Ctrl+T topk | Ctrl+L clear | Esc quit{}",
                        self.display.conductor_state.description(),
                        self.display.top_k,
                        send_hint,
                        scroll_info
                    ),
                    Style::default().fg(DIM_GRAY),
                )
            }
        };

        let width = area.width as usize;
        let status: String = status.chars().take(width).collect();
        buf.set_string(area.x, area.y, &status, style);

        if area.height > 1 {
            let tip: String = format!(" {SENSITIVE_DATA_TIP}").chars().take(width).collect();
            buf.set_string(area.x, area.y + 1, &tip, Style::default().fg(DIM_GRAY));
        }
    }

    /// Current display state
    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Is the app still running?
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Get the goodbye message for display after TUI closes
    pub fn goodbye(&self) -> Option<&str> {
        self.goodbye_message.as_deref()
    }

    /// Wait for the outstanding request to settle, then apply its messages
    pub async fn settle(&mut self) {
        if self.conductor.await_settlement().await.is_some() {
            self.transcript.scroll_to_bottom();
        }
        self.process_conductor_messages();
    }
}
