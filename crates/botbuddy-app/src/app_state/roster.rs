//! Chat roster: the sidebar list and the lifetime of the active chat's session.

use std::sync::Arc;
use std::time::Duration;

use botbuddy_ai::{ChatService, SessionController};
use botbuddy_common::{BotBuddyError, ChatId};
use botbuddy_config::ChatEntry;
use tracing::info;

pub type ActiveSession = Arc<SessionController<dyn ChatService>>;

/// Owns the controller of the active chat. Switching chats drops the old
/// controller, so no handle or transcript carries over between chats.
pub struct ChatRoster {
    chats: Vec<ChatEntry>,
    service: Arc<dyn ChatService>,
    request_timeout: Option<Duration>,
    active: Option<ActiveSession>,
}

impl ChatRoster {
    pub fn new(
        chats: Vec<ChatEntry>,
        service: Arc<dyn ChatService>,
        request_timeout: Option<Duration>,
    ) -> Self {
        Self {
            chats,
            service,
            request_timeout,
            active: None,
        }
    }

    pub fn chats(&self) -> &[ChatEntry] {
        &self.chats
    }

    pub fn find(&self, id: ChatId) -> Option<&ChatEntry> {
        self.chats.iter().find(|c| c.id == id)
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    pub fn active_id(&self) -> Option<ChatId> {
        self.active.as_ref().map(|s| s.chat())
    }

    /// Make `id` the active chat and initialize its session.
    ///
    /// A different chat starts from an empty state; the current chat is
    /// re-initialized in place. An initialization failure is recorded in
    /// the session state, not returned.
    pub async fn activate(&mut self, id: ChatId) -> Result<ActiveSession, BotBuddyError> {
        if self.find(id).is_none() {
            return Err(BotBuddyError::UnknownChat(id.to_string()));
        }

        let session = match self.active.as_ref() {
            Some(current) if current.chat() == id => Arc::clone(current),
            _ => {
                info!(chat = %id, "activating chat");
                let session: ActiveSession = Arc::new(
                    SessionController::new(id, Arc::clone(&self.service))
                        .with_request_timeout(self.request_timeout),
                );
                self.active = Some(Arc::clone(&session));
                session
            }
        };

        // Failure is visible through `last_error`.
        let _ = session.initialize_session().await;
        Ok(session)
    }

    /// Drop the active chat's session.
    pub fn deactivate(&mut self) {
        if let Some(session) = self.active.take() {
            info!(chat = %session.chat(), "chat deactivated");
        }
    }
}
