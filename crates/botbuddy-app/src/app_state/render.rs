//! Plain-text rendering of session state for the terminal.

use botbuddy_ai::{
    Message, Role, SessionError, SessionEvent, SessionState, SessionStatus, TokenUsage,
};
use botbuddy_common::ChatId;
use botbuddy_config::ChatEntry;

pub const PENDING_LINE: &str = "Generating response...";

pub fn render_message(message: &Message) -> String {
    match message.role {
        Role::User => format!("you> {}", message.content),
        Role::Assistant => format!("bot> {}", message.content),
    }
}

/// The line to print for an event, if any. User messages are not echoed
/// since the user just typed them.
pub fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::MessageAppended(m) if m.role == Role::Assistant => Some(render_message(m)),
        SessionEvent::MessageAppended(_) => None,
        SessionEvent::PendingChanged(true) => Some(PENDING_LINE.to_string()),
        SessionEvent::PendingChanged(false) => None,
        // Activation prints its own summary.
        SessionEvent::StatusChanged(_) => None,
        SessionEvent::ErrorRaised(SessionError::Initialization { .. }) => None,
        // Already shown as the assistant's notice.
        SessionEvent::ErrorRaised(SessionError::NotInitialized) => None,
        SessionEvent::ErrorRaised(e) => Some(format!("error: {e}")),
        SessionEvent::Cleared => Some("(conversation cleared)".to_string()),
    }
}

pub fn render_chats(chats: &[ChatEntry], active: Option<ChatId>) -> String {
    chats
        .iter()
        .map(|chat| {
            let marker = if Some(chat.id) == active { '*' } else { ' ' };
            format!("{marker} {:>3}  {}  ({})", chat.id.0, chat.title, chat.date)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summary printed after opening or re-opening a chat.
pub fn render_activation(chat: &ChatEntry, state: &SessionState) -> String {
    match state.last_error() {
        Some(error @ SessionError::Initialization { .. }) => format!(
            "Opened chat {}: {}\nerror: {error} ({})",
            chat.id,
            chat.title,
            error.cause().unwrap_or_default()
        ),
        _ => format!("Opened chat {}: {} (connected)", chat.id, chat.title),
    }
}

pub fn render_status(chat: &ChatEntry, state: &SessionState, usage: TokenUsage) -> String {
    let status = match state.status() {
        SessionStatus::Uninitialized => "not connected",
        SessionStatus::Initializing => "connecting",
        SessionStatus::Ready => "connected",
    };
    let mut lines = vec![
        format!("chat:     {} ({})", chat.title, chat.id),
        format!("session:  {status}"),
        format!("messages: {}", state.messages().len()),
        format!("pending:  {}", if state.is_pending() { "yes" } else { "no" }),
        format!(
            "tokens:   {} in / {} out",
            usage.input_tokens, usage.output_tokens
        ),
    ];
    if let Some(error) = state.last_error() {
        match error.cause() {
            Some(cause) => lines.push(format!("error:    {error} ({cause})")),
            None => lines.push(format!("error:    {error}")),
        }
    }
    lines.join("\n")
}
