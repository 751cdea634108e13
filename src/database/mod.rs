//! Persistence gateway
//!
//! Store traits for the three entity kinds plus the administrator
//! predicate, with a SQLite-backed production implementation and a
//! DashMap-backed in-memory one for tests and embedding. Reads are
//! strongly consistent with writes within the process.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

pub mod memory;
pub mod sqlite;

pub use memory::MemoryDatabase;
pub use sqlite::SqliteDatabase;

use anyhow::Result;
use async_trait::async_trait;

use crate::features::recurrence::Notification;
use crate::features::roster::Participant;

/// Role value that marks a chat row as an administrator's private chat
pub const ADMIN_ROLE: &str = "admin";

/// A registered chat
///
/// `id` is the platform chat id (negative for group chats, equal to the
/// user id for private chats). `role` is free-form; only [`ADMIN_ROLE`]
/// carries meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: i64,
    pub name: String,
    pub role: String,
}

impl Chat {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case(ADMIN_ROLE)
    }
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Insert or replace the chat row.
    async fn save(&self, chat: Chat) -> Result<()>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Chat>>;
    async fn find_all(&self) -> Result<Vec<Chat>>;
    async fn delete_by_id(&self, id: i64) -> Result<()>;
    async fn exists_by_id(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait ParticipantStore: Send + Sync {
    /// Insert (`id == 0`) or update; returns the row with its id set.
    async fn save(&self, participant: Participant) -> Result<Participant>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Participant>>;
    async fn find_by_chat(&self, chat_id: i64) -> Result<Vec<Participant>>;
    async fn delete_by_id(&self, id: i64) -> Result<()>;
    /// Clear the `has_won` flag for every participant of the chat.
    async fn reset_winners(&self, chat_id: i64) -> Result<()>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert (`id == 0`) or update; returns the row with its id set.
    async fn save(&self, notification: Notification) -> Result<Notification>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Notification>>;
    async fn find_by_chat(&self, chat_id: i64) -> Result<Vec<Notification>>;
    async fn find_all(&self) -> Result<Vec<Notification>>;
    async fn delete_by_id(&self, id: i64) -> Result<()>;
}

/// Externally supplied administrator predicate
///
/// The conversation layer trusts this and implements no identity logic
/// of its own. Both store implementations answer it from the chats
/// table: the user is an administrator when their private-chat row
/// carries [`ADMIN_ROLE`].
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn is_administrator(&self, user_id: i64) -> bool;
}
