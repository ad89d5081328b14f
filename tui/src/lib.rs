//! Triage TUI - Terminal interface for the triage Q&A client
//!
//! A full-screen terminal client: ask a question, read a grounded answer,
//! check which documents it came from.
//!
//! # Architecture
//!
//! - **App**: event loop and layout
//! - **ConductorClient**: the embedded conversation core
//! - **Display**: state mirrored from ConductorMessages
//! - **Input**: key bindings
//! - **Widgets**: transcript, evidence panel, scrollable text blocks

pub mod app;
pub mod conductor_client;
pub mod display;
pub mod input;
pub mod theme;
pub mod widgets;

pub use app::App;
pub use conductor_client::ConductorClient;
pub use display::DisplayState;
