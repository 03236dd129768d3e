//! The per-chat session controller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use botbuddy_common::ChatId;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::token_tracker::TokenTracker;
use crate::{AiError, AiReply, ChatService, Message, TokenUsage};

use super::events::{EventBus, SessionEvent};
use super::guard::{lock, InitGuard, PendingGuard};
use super::handle::SessionHandle;
use super::state::{
    SessionError, SessionState, SessionStatus, SubmitOutcome, NOT_INITIALIZED_NOTICE,
    SEND_FAILURE_NOTICE,
};

/// Mediates between user input and a `ChatService` for one chat.
///
/// All operations take `&self`. Exchanges are serialized through a FIFO
/// gate: [`submit`](Self::submit) waits its turn, while
/// [`try_submit`](Self::try_submit) refuses with [`SessionError::Busy`].
pub struct SessionController<S: ChatService + ?Sized> {
    chat: ChatId,
    service: Arc<S>,
    state: Mutex<SessionState>,
    /// Held for the whole of one exchange.
    turn: tokio::sync::Mutex<()>,
    /// Bumped on every initialization; only the latest attempt may store its result.
    init_generation: AtomicU64,
    tracker: Mutex<TokenTracker>,
    request_timeout: Option<Duration>,
    events: EventBus,
}

impl<S: ChatService + ?Sized> std::fmt::Debug for SessionController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("chat", &self.chat)
            .finish_non_exhaustive()
    }
}

impl<S: ChatService + ?Sized> SessionController<S> {
    pub fn new(chat: ChatId, service: Arc<S>) -> Self {
        Self {
            chat,
            service,
            state: Mutex::new(SessionState::default()),
            turn: tokio::sync::Mutex::new(()),
            init_generation: AtomicU64::new(0),
            tracker: Mutex::new(TokenTracker::new()),
            request_timeout: None,
            events: EventBus::default(),
        }
    }

    /// Bound each remote send. `None` waits as long as the service does.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn chat(&self) -> ChatId {
        self.chat
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// A copy of the current state for rendering.
    pub fn snapshot(&self) -> SessionState {
        lock(&self.state).clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        lock(&self.state).messages.clone()
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.state).pending
    }

    pub fn last_error(&self) -> Option<SessionError> {
        lock(&self.state).last_error.clone()
    }

    pub fn status(&self) -> SessionStatus {
        lock(&self.state).status
    }

    /// Token usage accumulated over successful replies.
    pub fn usage(&self) -> TokenUsage {
        self.tracker
            .lock()
            .map(|t| t.total())
            .unwrap_or_default()
    }

    /// Request a new session handle, replacing any existing one.
    ///
    /// Never touches `pending`. On failure the handle is left absent and
    /// `last_error` reads "Failed to initialize chat". If the call is
    /// cancelled, the status falls back to what the current handle allows.
    pub async fn initialize_session(&self) -> Result<(), SessionError> {
        let generation = self.init_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_status(SessionStatus::Initializing);
        let guard = InitGuard::arm(&self.state, &self.events, &self.init_generation, generation);

        let result = self.service.create_session(self.chat).await;

        if !guard.complete() {
            debug!(chat = %self.chat, "superseded initialization result discarded");
            return Ok(());
        }

        match result {
            Ok(handle) => {
                info!(chat = %self.chat, session = %handle.id(), "chat session ready");
                {
                    let mut state = lock(&self.state);
                    state.handle = Some(handle);
                    state.status = SessionStatus::Ready;
                    if matches!(state.last_error, Some(SessionError::Initialization { .. })) {
                        state.last_error = None;
                    }
                }
                self.events
                    .publish(SessionEvent::StatusChanged(SessionStatus::Ready));
                Ok(())
            }
            Err(e) => {
                warn!(chat = %self.chat, error = %e, "chat initialization failed");
                let error = SessionError::Initialization {
                    cause: e.to_string(),
                };
                {
                    let mut state = lock(&self.state);
                    state.handle = None;
                    state.status = SessionStatus::Uninitialized;
                    state.last_error = Some(error.clone());
                }
                self.events
                    .publish(SessionEvent::StatusChanged(SessionStatus::Uninitialized));
                self.events.publish(SessionEvent::ErrorRaised(error.clone()));
                Err(error)
            }
        }
    }

    /// Submit user text, waiting behind any exchange already in flight.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome, SessionError> {
        let Some(text) = normalize(text) else {
            return Ok(SubmitOutcome::Skipped);
        };
        let _turn = self.turn.lock().await;
        self.exchange(text).await
    }

    /// Submit user text, or fail with [`SessionError::Busy`] if an exchange
    /// is in flight. A busy refusal leaves the transcript untouched.
    pub async fn try_submit(&self, text: &str) -> Result<SubmitOutcome, SessionError> {
        let Some(text) = normalize(text) else {
            return Ok(SubmitOutcome::Skipped);
        };
        let Ok(_turn) = self.turn.try_lock() else {
            debug!(chat = %self.chat, "submit refused while a reply is pending");
            return Err(SessionError::Busy);
        };
        self.exchange(text).await
    }

    /// Discard the transcript, the last error and usage counters. The
    /// handle is kept, but its replay context starts over.
    pub fn reset(&self) -> Result<(), SessionError> {
        let Ok(_turn) = self.turn.try_lock() else {
            return Err(SessionError::Busy);
        };
        {
            let mut state = lock(&self.state);
            state.messages.clear();
            state.last_error = None;
            let fresh = state
                .handle
                .as_ref()
                .map(|h| SessionHandle::new(h.chat(), h.model()));
            state.handle = fresh;
        }
        if let Ok(mut tracker) = self.tracker.lock() {
            tracker.reset();
        }
        self.events.publish(SessionEvent::Cleared);
        Ok(())
    }

    /// One user turn and its single assistant reply. Caller holds `turn`.
    async fn exchange(&self, text: String) -> Result<SubmitOutcome, SessionError> {
        let handle = {
            let mut state = lock(&self.state);
            state.messages.push(Message::user(text.as_str()));
            state.handle.clone()
        };
        self.events
            .publish(SessionEvent::MessageAppended(Message::user(text.as_str())));

        let Some(handle) = handle else {
            warn!(chat = %self.chat, "submit before the chat session was initialized");
            let notice = Message::assistant(NOT_INITIALIZED_NOTICE);
            {
                let mut state = lock(&self.state);
                state.messages.push(notice.clone());
                state.last_error = Some(SessionError::NotInitialized);
            }
            self.events.publish(SessionEvent::MessageAppended(notice));
            self.events
                .publish(SessionEvent::ErrorRaised(SessionError::NotInitialized));
            return Err(SessionError::NotInitialized);
        };

        let mut pending = PendingGuard::engage(&self.state, &self.events);

        match self.call_remote(&handle, &text).await {
            Ok(reply) => {
                if let Ok(mut tracker) = self.tracker.lock() {
                    tracker.record(&reply.usage);
                }
                {
                    let mut state = lock(&self.state);
                    if let Some(current) = state.handle.as_mut() {
                        // A re-initialization while waiting replaced the handle.
                        if current.id() == handle.id() {
                            current.record_exchange(&text, &reply.content);
                        }
                    }
                }
                pending.settle(Message::assistant(reply.content.as_str()), None);
                Ok(SubmitOutcome::Replied(reply.content))
            }
            Err(e) => {
                warn!(chat = %self.chat, session = %handle.id(), error = %e, "send failed");
                let error = SessionError::Send {
                    cause: e.to_string(),
                };
                pending.settle(Message::assistant(SEND_FAILURE_NOTICE), Some(error.clone()));
                Err(error)
            }
        }
    }

    async fn call_remote(&self, handle: &SessionHandle, text: &str) -> Result<AiReply, AiError> {
        let send = self.service.send_message(handle, text);
        match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, send)
                .await
                .map_err(|_| AiError::Timeout)?,
            None => send.await,
        }
    }

    fn set_status(&self, status: SessionStatus) {
        lock(&self.state).status = status;
        self.events.publish(SessionEvent::StatusChanged(status));
    }
}

/// Trimmed input, or `None` when there is nothing to send.
fn normalize(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
