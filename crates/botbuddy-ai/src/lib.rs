//! Chat engine for BotBuddy.
//!
//! Provides:
//! - the `ChatService` seam to a hosted generative-language API
//! - a Gemini implementation of that seam
//! - the per-chat `SessionController` that owns the transcript, the
//!   pending flag and the last error
//! - token usage tracking

pub mod gemini;
pub mod session;
pub mod token_tracker;

use async_trait::async_trait;
use botbuddy_common::ChatId;

pub use gemini::{GeminiClient, GeminiConfig};
pub use session::{
    SessionController, SessionError, SessionEvent, SessionHandle, SessionState, SessionStatus,
    SubmitOutcome,
};
pub use token_tracker::TokenTracker;

/// The remote side of a chat: creates session handles and answers messages.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Open a new remote session for `chat`.
    async fn create_session(&self, chat: ChatId) -> Result<SessionHandle, AiError>;

    /// Send `text` within `handle`'s session. The handle carries the prior
    /// context, so implementations replay it before the new turn.
    async fn send_message(&self, handle: &SessionHandle, text: &str) -> Result<AiReply, AiError>;
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiReply {
    pub content: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout")]
    Timeout,
    #[error("Not configured: {0}")]
    NotConfigured(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hey")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hey"}"#);
    }

    #[test]
    fn total_tokens_saturates() {
        let usage = TokenUsage {
            input_tokens: u64::MAX,
            output_tokens: 5,
        };
        assert_eq!(usage.total_tokens(), u64::MAX);
    }

    #[test]
    fn ai_error_display() {
        assert_eq!(AiError::RateLimited.to_string(), "Rate limited");
        assert_eq!(
            AiError::NetworkError("connection refused".into()).to_string(),
            "Network error: connection refused"
        );
        assert_eq!(
            AiError::NotConfigured("GEMINI_API_KEY is not set".into()).to_string(),
            "Not configured: GEMINI_API_KEY is not set"
        );
    }
}
