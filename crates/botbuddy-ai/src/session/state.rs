//! Session state, status, errors and the fixed user-facing notices.

use crate::Message;

use super::handle::SessionHandle;

/// Assistant notice appended when a send fails.
pub const SEND_FAILURE_NOTICE: &str = "Sorry, I encountered an error. Please try again.";

/// Assistant notice appended when a message is submitted before a handle exists.
pub const NOT_INITIALIZED_NOTICE: &str = "Chat not initialized. Please try again.";

/// Lifecycle of the remote session handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
}

/// Recoverable session failures. `Display` is the text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The remote service could not create a session handle.
    #[error("Failed to initialize chat")]
    Initialization { cause: String },

    /// A send failed after a handle existed.
    #[error("Failed to generate response. Please try again.")]
    Send { cause: String },

    /// A message was submitted while no handle exists.
    #[error("Chat not initialized. Please try again.")]
    NotInitialized,

    /// Another exchange is still pending.
    #[error("Still waiting for the previous reply.")]
    Busy,
}

impl SessionError {
    /// Underlying cause, for logs and status output.
    pub fn cause(&self) -> Option<&str> {
        match self {
            SessionError::Initialization { cause } | SessionError::Send { cause } => Some(cause),
            SessionError::NotInitialized | SessionError::Busy => None,
        }
    }
}

/// What a submit did when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input was blank after trimming; nothing happened.
    Skipped,
    /// The assistant replied with this text.
    Replied(String),
}

/// Everything a presentation layer needs to render one chat.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub(crate) messages: Vec<Message>,
    pub(crate) pending: bool,
    pub(crate) last_error: Option<SessionError>,
    pub(crate) status: SessionStatus,
    pub(crate) handle: Option<SessionHandle>,
}

impl SessionState {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn handle(&self) -> Option<&SessionHandle> {
        self.handle.as_ref()
    }
}
