//! Triage Conductor - Headless Conversation Core for the triage client
//!
//! This crate holds the conversation logic for a retrieval-augmented Q&A
//! client, independent of any UI framework. It can drive the TUI or run
//! headless for testing and scripting.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        UI Surfaces                               │
//! │        ┌─────────┐                 ┌─────────────────────┐       │
//! │        │   TUI   │                 │  Headless / Tests   │       │
//! │        │(ratatui)│                 │                     │       │
//! │        └────┬────┘                 └──────────┬──────────┘       │
//! │             └──────────────┬──────────────────┘                  │
//! │                    SurfaceEvent (up)                             │
//! │                  ConductorMessage (down)                         │
//! └────────────────────────────┼─────────────────────────────────────┘
//!                              │
//! ┌────────────────────────────┼─────────────────────────────────────┐
//! │                    CONDUCTOR CORE                                │
//! │  ┌─────────────────────────┴──────────────────────────────────┐  │
//! │  │                      Conductor                              │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐  │  │
//! │  │  │ Conversation │  │   Evidence   │  │     Backend      │  │  │
//! │  │  │    Store     │  │    Panel     │  │  (POST /api/ask) │  │  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────────┘  │  │
//! │  └────────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Conductor`]: Runs the question/answer cycle and owns the conversation
//! - [`ConversationState`]: Ordered transcript plus view state
//! - [`ConductorMessage`]: Messages sent from Conductor to UI surfaces
//! - [`SurfaceEvent`]: Events sent from UI surfaces to Conductor
//! - [`EvidencePanel`]: What the evidence panel shows
//!
//! # Quick Start
//!
//! ```ignore
//! use triage_conductor::{Conductor, ConductorConfig, HttpBackend, SurfaceEvent};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (tx, mut rx) = mpsc::channel(100);
//!
//!     let backend = HttpBackend::new("http://localhost:8000")?;
//!     let mut conductor = Conductor::new(backend, ConductorConfig::default(), tx);
//!     conductor.start().await?;
//!
//!     conductor
//!         .handle_event(SurfaceEvent::SubmitText {
//!             text: "What is the late fee?".to_string(),
//!         })
//!         .await?;
//!     conductor.await_settlement().await;
//!
//!     while let Ok(msg) = rx.try_recv() {
//!         // Render message to UI
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`audit`]: Opt-in JSONL interaction log
//! - [`backend`]: Answer backend abstraction and HTTP implementation
//! - [`conductor`]: Main Conductor struct
//! - [`config`]: TOML / environment / CLI configuration
//! - [`events`]: Events from UI surfaces to Conductor
//! - [`evidence`]: Evidence panel derivation
//! - [`messages`]: Messages from Conductor to UI surfaces
//! - [`session`]: Conversation store
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod audit;
pub mod backend;
pub mod conductor;
pub mod config;
pub mod events;
pub mod evidence;
pub mod messages;
pub mod session;

// Re-exports for convenience
pub use audit::{AuditError, InteractionLog, InteractionRecord};
pub use backend::{
    AskBackend, AskRequest, AskResponse, BackendError, HttpBackend, NO_ANSWER_PLACEHOLDER,
};
pub use conductor::{
    Conductor, ConductorConfig, Settlement, SettlementKind, StaleResponsePolicy, SubmitOutcome,
};
pub use events::{SurfaceEvent, SurfaceType};
pub use evidence::{sources_line, EvidencePanel};
pub use messages::{
    ConductorMessage, ConductorState, MessageId, MessageRole, NotifyLevel, SessionId,
};
pub use session::{
    is_supported_top_k, ConversationMessage, ConversationState, DEFAULT_TOP_K, SUPPORTED_TOP_K,
};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, TriageConfig, TriageToml,
};
