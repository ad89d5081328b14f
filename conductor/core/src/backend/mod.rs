//! Answer Backend Integration
//!
//! Abstracted access to the retrieval-augmented answer service through a
//! common trait, so the Conductor can run against the real HTTP service or a
//! scripted backend in tests.
//!
//! # Available Backends
//!
//! - **HTTP**: `POST {base_url}/api/ask` (default)
//!
//! # Usage
//!
//! ```ignore
//! use triage_conductor::backend::{AskBackend, AskRequest, HttpBackend};
//!
//! let backend = HttpBackend::new("http://localhost:8000")?;
//! let response = backend.ask(&AskRequest::new("What is the late fee?", 4)).await?;
//! ```

mod http;
mod traits;

pub use http::{HttpBackend, DEFAULT_TIMEOUT};
pub use traits::{AskBackend, AskRequest, AskResponse, BackendError, NO_ANSWER_PLACEHOLDER};
