//! Shared context for flow handlers
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use chrono::FixedOffset;
use std::sync::Arc;

use crate::conversation::SessionStore;
use crate::database::{Authorizer, ChatStore, NotificationStore, ParticipantStore};
use crate::features::assistant::AssistantService;
use crate::messaging::Messenger;

/// Services shared by every flow handler
///
/// Stores and the messenger are trait objects; the conversation layer
/// never knows which backend is wired in. The assistant is optional;
/// without it the `/ask` flow answers with a fixed notice.
#[derive(Clone)]
pub struct CommandContext {
    pub chats: Arc<dyn ChatStore>,
    pub participants: Arc<dyn ParticipantStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub authorizer: Arc<dyn Authorizer>,
    pub messenger: Arc<dyn Messenger>,
    pub sessions: SessionStore,
    pub assistant: Option<AssistantService>,
    pub timezone: FixedOffset,
}

impl CommandContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chats: Arc<dyn ChatStore>,
        participants: Arc<dyn ParticipantStore>,
        notifications: Arc<dyn NotificationStore>,
        authorizer: Arc<dyn Authorizer>,
        messenger: Arc<dyn Messenger>,
        sessions: SessionStore,
        assistant: Option<AssistantService>,
        timezone: FixedOffset,
    ) -> Self {
        CommandContext {
            chats,
            participants,
            notifications,
            authorizer,
            messenger,
            sessions,
            assistant,
            timezone,
        }
    }

    pub async fn is_admin(&self, user_id: i64) -> bool {
        self.authorizer.is_administrator(user_id).await
    }
}
