//! Conductor Client
//!
//! Thin wrapper around the Conductor for TUI integration.
//! This client embeds the Conductor directly (no network between them) and
//! provides a convenient interface for sending events and receiving messages.
//!
//! # Architecture
//!
//! The TUI is a "thin client" - it doesn't contain any conversation logic.
//! The TUI's job is:
//! 1. Convert terminal events to SurfaceEvents
//! 2. Send SurfaceEvents to Conductor
//! 3. Receive ConductorMessages
//! 4. Render display state based on messages

use tokio::sync::mpsc;

use triage_conductor::{
    AskBackend, Conductor, ConductorConfig, ConductorMessage, ConductorState, HttpBackend,
    InteractionLog, Settlement, SurfaceEvent, SurfaceType, TriageConfig,
};

/// Surface channel depth
const CHANNEL_CAPACITY: usize = 256;

/// Client for communicating with the embedded Conductor
pub struct ConductorClient<B: AskBackend + 'static = HttpBackend> {
    /// The embedded Conductor instance
    conductor: Conductor<B>,
    /// Receiver for messages from Conductor
    rx: mpsc::Receiver<ConductorMessage>,
}

impl ConductorClient<HttpBackend> {
    /// Create a client talking HTTP to the configured backend
    pub fn from_config(config: &TriageConfig) -> anyhow::Result<Self> {
        let backend = HttpBackend::with_timeout(&config.base_url, config.request_timeout)?;
        let mut client = Self::with_backend(backend, config.conductor_config());

        if let Some(ref path) = config.audit_log {
            tracing::info!(path = %path.display(), "Recording interactions");
            client.conductor = client.conductor.with_audit_log(InteractionLog::new(path));
        }

        Ok(client)
    }
}

impl<B: AskBackend + 'static> ConductorClient<B> {
    /// Create a client around any backend
    pub fn with_backend(backend: B, config: ConductorConfig) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let conductor = Conductor::new(backend, config, tx);
        Self { conductor, rx }
    }

    /// Start the Conductor
    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.conductor.start().await
    }

    /// Connect this surface to the Conductor
    pub async fn connect(&mut self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::Connected {
            surface_type: SurfaceType::Tui,
        })
        .await
    }

    /// Report the full input text after an edit
    pub async fn input_changed(&mut self, text: String) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::InputChanged { text }).await
    }

    /// Submit the pending question
    pub async fn submit(&mut self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::Submit).await
    }

    /// Empty the transcript
    pub async fn clear(&mut self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::Clear).await
    }

    /// Show or hide the evidence panel
    pub async fn toggle_evidence(&mut self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::ToggleEvidence).await
    }

    /// Pick a retrieval breadth
    pub async fn set_top_k(&mut self, top_k: u32) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::SetTopK { top_k }).await
    }

    /// Notify Conductor that user wants to quit
    pub async fn request_quit(&mut self) -> anyhow::Result<()> {
        self.send_event(SurfaceEvent::QuitRequested).await
    }

    /// Settle a finished request, if any (must be called regularly)
    pub async fn poll_settlement(&mut self) -> Option<Settlement> {
        self.conductor.poll_settlement().await
    }

    /// Wait for the outstanding request, if any
    pub async fn await_settlement(&mut self) -> Option<Settlement> {
        self.conductor.await_settlement().await
    }

    /// Receive all pending messages from the Conductor (non-blocking)
    pub fn recv_all(&mut self) -> Vec<ConductorMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Get the current Conductor state
    pub fn state(&self) -> ConductorState {
        self.conductor.state()
    }

    /// Send raw surface event to Conductor
    pub async fn send_event(&mut self, event: SurfaceEvent) -> anyhow::Result<()> {
        self.conductor.handle_event(event).await
    }
}
