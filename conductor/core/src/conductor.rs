//! Conductor - The Conversation Orchestrator
//!
//! The Conductor owns the conversation and runs the question/answer cycle:
//! - accepting or rejecting submissions
//! - dispatching exactly one backend request at a time
//! - turning each outcome into exactly one assistant message
//! - keeping surfaces informed through `ConductorMessage`s
//!
//! # Design Philosophy
//!
//! The Conductor is UI-agnostic. A surface sends `SurfaceEvent`s up and
//! renders the `ConductorMessage`s that come down; it never touches the
//! conversation directly.
//!
//! # Request Lifecycle
//!
//! ```text
//!   Idle ── submit(valid) ──▶ Dispatched ── settle ──▶ Idle
//!    │                            │
//!    └─ submit(blank): no-op      └─ submit(*): no-op
//! ```
//!
//! The request runs on a spawned tokio task. Settlement happens on the
//! Conductor's own task, either from [`Conductor::poll_settlement`] (called
//! once per frame by a surface) or [`Conductor::await_settlement`].

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::audit::InteractionLog;
use crate::backend::{AskBackend, AskRequest, AskResponse, BackendError, NO_ANSWER_PLACEHOLDER};
use crate::events::{SurfaceEvent, SurfaceType};
use crate::messages::{
    ConductorMessage, ConductorState, MessageId, MessageRole, NotifyLevel, SessionId,
};
use crate::session::{
    is_supported_top_k, ConversationMessage, ConversationState, DEFAULT_TOP_K, SUPPORTED_TOP_K,
};

/// What to do with a response that arrives after the conversation was cleared
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleResponsePolicy {
    /// Drop it; the cleared conversation stays empty
    #[default]
    Discard,
    /// Append it to whatever conversation exists now
    Append,
}

impl std::str::FromStr for StaleResponsePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "append" => Ok(Self::Append),
            other => Err(format!(
                "unknown stale response policy '{other}' (expected 'discard' or 'append')"
            )),
        }
    }
}

/// Conductor configuration
#[derive(Clone, Debug)]
pub struct ConductorConfig {
    /// Retrieval breadth at session start
    pub default_top_k: u32,
    /// Evidence panel visibility at session start
    pub evidence_visible: bool,
    /// Upper bound on one request, after which it settles as a failure
    pub request_timeout: Duration,
    /// Handling of responses that outlive a clear
    pub stale_responses: StaleResponsePolicy,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            default_top_k: DEFAULT_TOP_K,
            evidence_visible: false,
            request_timeout: Duration::from_secs(60),
            stale_responses: StaleResponsePolicy::Discard,
        }
    }
}

/// Result of a submission attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank after trimming; nothing happened
    Empty,
    /// A request is already outstanding; nothing happened
    Busy,
    /// User message appended and request dispatched
    Dispatched(MessageId),
}

impl SubmitOutcome {
    /// Whether the submission was accepted
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched(_))
    }
}

/// How a request settled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettlementKind {
    /// Backend answered
    Answered,
    /// Backend succeeded without a usable answer; placeholder shown
    Degraded,
    /// Transport or HTTP failure; diagnostic shown
    Failed,
    /// Response outlived a clear and was dropped
    Discarded,
}

/// Outcome of processing one settled request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    /// How the request ended
    pub kind: SettlementKind,
    /// Assistant message appended, if any
    pub message_id: Option<MessageId>,
}

/// What a dispatched request answers
struct Dispatch {
    /// Conversation generation at dispatch
    generation: u64,
    /// User message this request answers
    question_id: MessageId,
    /// Question text as sent
    question: String,
    started: Instant,
}

/// The one outstanding request
struct InFlight {
    dispatch: Dispatch,
    handle: JoinHandle<Result<AskResponse, BackendError>>,
}

/// Holds the conversation while a settlement is processed and clears
/// `loading` when dropped, whichever way processing exits
struct LoadingGuard<'a> {
    conversation: &'a mut ConversationState,
}

impl<'a> LoadingGuard<'a> {
    fn new(conversation: &'a mut ConversationState) -> Self {
        Self { conversation }
    }
}

impl Deref for LoadingGuard<'_> {
    type Target = ConversationState;

    fn deref(&self) -> &Self::Target {
        self.conversation
    }
}

impl DerefMut for LoadingGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conversation
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.conversation.set_loading(false);
    }
}

/// The Conductor - headless conversation orchestrator
pub struct Conductor<B: AskBackend> {
    /// Configuration
    config: ConductorConfig,
    /// Answer backend
    backend: Arc<B>,
    /// Session identifier
    session_id: SessionId,
    /// Conversation store
    conversation: ConversationState,
    /// Current operational state
    state: ConductorState,
    /// Channel to send messages to UI surface
    tx: mpsc::Sender<ConductorMessage>,
    /// Connected surface
    surface_type: Option<SurfaceType>,
    /// Outstanding request, if any
    in_flight: Option<InFlight>,
    /// Interaction log for completed exchanges
    audit: Option<InteractionLog>,
}

impl<B: AskBackend + 'static> Conductor<B> {
    /// Create a new Conductor with the given backend
    pub fn new(backend: B, config: ConductorConfig, tx: mpsc::Sender<ConductorMessage>) -> Self {
        let top_k = if is_supported_top_k(config.default_top_k) {
            config.default_top_k
        } else {
            tracing::warn!(
                top_k = config.default_top_k,
                "Unsupported default breadth, using {}",
                DEFAULT_TOP_K
            );
            DEFAULT_TOP_K
        };

        Self {
            conversation: ConversationState::with_view(top_k, config.evidence_visible),
            config,
            backend: Arc::new(backend),
            session_id: SessionId::new(),
            state: ConductorState::Idle,
            tx,
            surface_type: None,
            in_flight: None,
            audit: None,
        }
    }

    /// Record completed exchanges to the given log
    #[must_use]
    pub fn with_audit_log(mut self, log: InteractionLog) -> Self {
        self.audit = Some(log);
        self
    }

    /// Get the session ID
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Get current state
    pub fn state(&self) -> ConductorState {
        self.state
    }

    /// Read-only view of the conversation
    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    /// Get configuration
    pub fn config(&self) -> &ConductorConfig {
        &self.config
    }

    /// Connected surface, if one has announced itself
    pub fn surface_type(&self) -> Option<SurfaceType> {
        self.surface_type
    }

    /// Whether a request is outstanding
    pub fn is_loading(&self) -> bool {
        self.conversation.is_loading()
    }

    /// Start the Conductor and announce the session
    pub async fn start(&mut self) -> anyhow::Result<()> {
        tracing::info!(
            session = %self.session_id.0,
            backend = self.backend.name(),
            "Conductor started"
        );
        self.send_snapshot().await;
        Ok(())
    }

    /// Handle an event from the UI surface
    pub async fn handle_event(&mut self, event: SurfaceEvent) -> anyhow::Result<()> {
        match event {
            SurfaceEvent::Connected { surface_type } => {
                tracing::debug!(?surface_type, "Surface connected");
                self.surface_type = Some(surface_type);
                self.send_snapshot().await;
            }

            SurfaceEvent::InputChanged { text } => {
                self.input_changed(text).await;
            }

            SurfaceEvent::Submit => {
                let question = self.conversation.pending_question().to_string();
                self.submit(&question).await;
            }

            SurfaceEvent::SubmitText { text } => {
                self.submit(&text).await;
            }

            SurfaceEvent::Clear => {
                self.clear().await;
            }

            SurfaceEvent::ToggleEvidence => {
                self.toggle_evidence().await;
            }

            SurfaceEvent::SetTopK { top_k } => {
                self.set_top_k(top_k).await;
            }

            SurfaceEvent::QuitRequested => {
                self.shutdown().await?;
            }
        }

        Ok(())
    }

    /// Replace the unsent input text
    ///
    /// Allowed at any time, including while a request is outstanding.
    pub async fn input_changed(&mut self, text: impl Into<String>) {
        self.conversation.set_pending_question(text);
        self.send(ConductorMessage::PendingQuestion {
            text: self.conversation.pending_question().to_string(),
        })
        .await;
    }

    /// Submit a question
    ///
    /// Blank questions and submissions while a request is outstanding are
    /// silent no-ops. Otherwise the user message is appended before this
    /// returns and the request runs in the background.
    pub async fn submit(&mut self, question: &str) -> SubmitOutcome {
        let question = question.trim();
        if question.is_empty() {
            tracing::debug!("Ignoring blank submission");
            return SubmitOutcome::Empty;
        }
        if self.conversation.is_loading() {
            tracing::debug!("Ignoring submission while a request is outstanding");
            return SubmitOutcome::Busy;
        }

        let user_msg = self
            .conversation
            .append_message(MessageRole::User, question, None)
            .clone();
        self.conversation.set_pending_question("");
        self.conversation.set_loading(true);

        let request = AskRequest::new(question, self.conversation.top_k());
        tracing::info!(
            message_id = %user_msg.id(),
            topk = request.topk,
            "Dispatching question"
        );

        self.in_flight = Some(InFlight {
            dispatch: Dispatch {
                generation: self.conversation.generation(),
                question_id: user_msg.id().clone(),
                question: request.question.clone(),
                started: Instant::now(),
            },
            handle: self.spawn_request(request),
        });

        let question_id = user_msg.id().clone();
        self.send(ConductorMessage::Message { message: user_msg })
            .await;
        self.send(ConductorMessage::PendingQuestion {
            text: String::new(),
        })
        .await;
        self.set_state(ConductorState::Dispatched).await;

        SubmitOutcome::Dispatched(question_id)
    }

    fn spawn_request(&self, request: AskRequest) -> JoinHandle<Result<AskResponse, BackendError>> {
        let backend = Arc::clone(&self.backend);
        let timeout = self.config.request_timeout;

        tokio::spawn(async move {
            tokio::time::timeout(timeout, backend.ask(&request))
                .await
                .map_err(|_| BackendError::Timeout(timeout))?
        })
    }

    /// Settle the outstanding request if it has finished
    ///
    /// Never waits. Call this regularly (once per frame) from a surface loop.
    /// Returns `None` when nothing settled.
    pub async fn poll_settlement(&mut self) -> Option<Settlement> {
        if !self
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.handle.is_finished())
        {
            return None;
        }

        let InFlight { dispatch, handle } = self.in_flight.take()?;
        let outcome = handle
            .await
            .unwrap_or_else(|e| Err(BackendError::Aborted(e.to_string())));
        Some(self.finish(dispatch, outcome).await)
    }

    /// Wait for the outstanding request to settle and process it
    ///
    /// Returns `None` if nothing is outstanding. Cancel-safe: if this future
    /// is dropped, the request stays outstanding.
    pub async fn await_settlement(&mut self) -> Option<Settlement> {
        let in_flight = self.in_flight.as_mut()?;
        let joined = (&mut in_flight.handle).await;

        let InFlight { dispatch, .. } = self.in_flight.take()?;
        let outcome = joined.unwrap_or_else(|e| Err(BackendError::Aborted(e.to_string())));
        Some(self.finish(dispatch, outcome).await)
    }

    async fn finish(
        &mut self,
        dispatch: Dispatch,
        outcome: Result<AskResponse, BackendError>,
    ) -> Settlement {
        let elapsed_ms = dispatch.started.elapsed().as_millis();
        let question_id = &dispatch.question_id;
        let answered = outcome.as_ref().ok().cloned();
        let (settlement, message) = self.settle(dispatch.generation, outcome);

        match settlement.kind {
            SettlementKind::Failed => tracing::warn!(
                question = %question_id,
                elapsed_ms,
                "Request failed"
            ),
            SettlementKind::Discarded => tracing::info!(
                question = %question_id,
                elapsed_ms,
                "Discarding response for a cleared conversation"
            ),
            kind => tracing::info!(question = %question_id, elapsed_ms, ?kind, "Request settled"),
        }

        if let Some(message) = message {
            self.send(ConductorMessage::Message { message }).await;
        }
        self.set_state(ConductorState::Idle).await;

        // Only exchanges that made it into the transcript are recorded
        if let (Some(log), Some(response)) = (&self.audit, answered) {
            if matches!(
                settlement.kind,
                SettlementKind::Answered | SettlementKind::Degraded
            ) {
                let answer = response.answer.as_deref().unwrap_or(NO_ANSWER_PLACEHOLDER);
                log.record(&dispatch.question, answer, &response).await;
            }
        }

        settlement
    }

    /// Turn an outcome into at most one assistant message
    ///
    /// `loading` is cleared by the guard on every exit from this function.
    fn settle(
        &mut self,
        generation: u64,
        outcome: Result<AskResponse, BackendError>,
    ) -> (Settlement, Option<ConversationMessage>) {
        let mut conversation = LoadingGuard::new(&mut self.conversation);

        if generation != conversation.generation()
            && self.config.stale_responses == StaleResponsePolicy::Discard
        {
            return (
                Settlement {
                    kind: SettlementKind::Discarded,
                    message_id: None,
                },
                None,
            );
        }

        let (kind, text, docs) = match outcome {
            Ok(AskResponse {
                answer: Some(answer),
                retrieved_docs,
            }) => (SettlementKind::Answered, answer, retrieved_docs),
            Ok(AskResponse {
                answer: None,
                retrieved_docs,
            }) => (
                SettlementKind::Degraded,
                NO_ANSWER_PLACEHOLDER.to_string(),
                retrieved_docs,
            ),
            Err(e) => (SettlementKind::Failed, format!("Error: {e}"), Vec::new()),
        };

        let message = conversation
            .append_message(MessageRole::Assistant, text, Some(docs))
            .clone();
        (
            Settlement {
                kind,
                message_id: Some(message.id().clone()),
            },
            Some(message),
        )
    }

    /// Empty the transcript
    ///
    /// An outstanding request keeps running; its response is handled per
    /// [`StaleResponsePolicy`].
    pub async fn clear(&mut self) {
        if self.conversation.is_loading() {
            tracing::debug!("Clearing while a request is outstanding");
        }
        self.conversation.clear();
        self.send(ConductorMessage::Cleared).await;
    }

    /// Flip evidence panel visibility, returning the new value
    pub async fn toggle_evidence(&mut self) -> bool {
        let visible = self.conversation.toggle_evidence_visible();
        self.send(ConductorMessage::EvidenceVisibility { visible })
            .await;
        visible
    }

    /// Change the retrieval breadth for subsequent questions
    ///
    /// Unsupported values are rejected with a warning and change nothing.
    /// Returns whether the value was applied.
    pub async fn set_top_k(&mut self, top_k: u32) -> bool {
        if !is_supported_top_k(top_k) {
            tracing::warn!(top_k, "Rejected unsupported breadth");
            let supported = SUPPORTED_TOP_K
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            self.notify(
                NotifyLevel::Warning,
                &format!("Unsupported topk {top_k} (choose one of {supported})"),
            )
            .await;
            return false;
        }

        self.conversation.set_top_k(top_k);
        self.send(ConductorMessage::TopK { top_k }).await;
        true
    }

    /// Shut down the Conductor
    ///
    /// An outstanding request is aborted without producing a message.
    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        if let Some(in_flight) = self.in_flight.take() {
            tracing::info!(question = %in_flight.dispatch.question_id, "Aborting outstanding request");
            in_flight.handle.abort();
            self.conversation.set_loading(false);
        }
        self.set_state(ConductorState::ShuttingDown).await;

        self.send(ConductorMessage::Quit {
            message: Some("Goodbye!".to_string()),
        })
        .await;

        Ok(())
    }

    /// Send everything a freshly connected surface needs
    async fn send_snapshot(&self) {
        self.send(ConductorMessage::SessionInfo {
            session_id: self.session_id.clone(),
            backend: self.backend.name().to_string(),
        })
        .await;
        self.send(ConductorMessage::State { state: self.state })
            .await;
        self.send(ConductorMessage::TopK {
            top_k: self.conversation.top_k(),
        })
        .await;
        self.send(ConductorMessage::EvidenceVisibility {
            visible: self.conversation.evidence_visible(),
        })
        .await;
        for message in self.conversation.messages() {
            self.send(ConductorMessage::Message {
                message: message.clone(),
            })
            .await;
        }
        self.send(ConductorMessage::PendingQuestion {
            text: self.conversation.pending_question().to_string(),
        })
        .await;
    }

    /// Set state and notify UI
    async fn set_state(&mut self, state: ConductorState) {
        self.state = state;
        self.send(ConductorMessage::State { state }).await;
    }

    /// Send notification
    async fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(ConductorMessage::Notify {
            level,
            message: message.to_string(),
        })
        .await;
    }

    /// Send a message to the UI surface
    async fn send(&self, msg: ConductorMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}
