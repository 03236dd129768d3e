//! Remote session handle.

use botbuddy_common::{ChatId, SessionId};

use crate::Message;

/// Opaque reference to a remote conversation.
///
/// Holds the context replayed to the service on every send: only turns that
/// completed successfully, so locally synthesized notices never reach the
/// model.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    chat: ChatId,
    model: String,
    context: Vec<Message>,
}

impl SessionHandle {
    pub fn new(chat: ChatId, model: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            chat,
            model: model.into(),
            context: Vec::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn chat(&self) -> ChatId {
        self.chat
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Successful turns so far, oldest first.
    pub fn context(&self) -> &[Message] {
        &self.context
    }

    pub(crate) fn record_exchange(&mut self, user: &str, reply: &str) {
        self.context.push(Message::user(user));
        self.context.push(Message::assistant(reply));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn new_handle_is_empty_and_unique() {
        let a = SessionHandle::new(ChatId(1), "gemini-2.0-flash");
        let b = SessionHandle::new(ChatId(1), "gemini-2.0-flash");
        assert!(a.context().is_empty());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.chat(), ChatId(1));
        assert_eq!(a.model(), "gemini-2.0-flash");
    }

    #[test]
    fn record_exchange_appends_pair() {
        let mut handle = SessionHandle::new(ChatId(2), "m");
        handle.record_exchange("Hi", "Hello!");
        assert_eq!(handle.context().len(), 2);
        assert_eq!(handle.context()[0].role, Role::User);
        assert_eq!(handle.context()[1].content, "Hello!");
    }
}
