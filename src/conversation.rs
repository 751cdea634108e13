//! Per-user conversation state
//!
//! Every multi-step flow parks exactly one `PendingAction` per user in a
//! shared table and consumes it with the next qualifying message. The
//! consume is a single `DashMap::remove`, so "read current state and
//! clear it" is one atomic unit; two users never interfere.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0
//! - **Toggleable**: false

use dashmap::DashMap;
use std::sync::Arc;

/// Which multi-step input flow is awaiting a user's next message
///
/// A new action replaces any prior one (no stack, no queue). Entries are
/// in-memory only; a restart forgets all in-flight flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    AddingUsers,
    DeletingUsers,
    EditingUsers,
    AddingNotification,
    DeletingNotifications,
    EditingNotification,
    AddingChats,
    DeletingChats,
    EditingChats,
    AwaitingQuery,
    /// Administrator redirect: capture a target chat id, then show that
    /// chat's roster with the edit menu.
    SelectChatForUserEdit,
    /// Administrator redirect for the notification edit menu.
    SelectChatForNotificationEdit,
    /// Administrator redirect: first line of the next message is the
    /// target chat id, the rest is the roster payload.
    SelectChatForUserAdd,
    /// Administrator redirect variant of [`PendingAction::AddingNotification`].
    SelectChatForNotificationAdd,
}

/// Shared user-id -> [`PendingAction`] table
///
/// Cloning is cheap and shares the underlying table.
#[derive(Clone, Default)]
pub struct SessionStore {
    states: Arc<DashMap<i64, PendingAction>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new pending action for a user, replacing any prior one.
    pub fn begin(&self, user_id: i64, action: PendingAction) {
        self.states.insert(user_id, action);
    }

    /// Atomically read and clear the user's pending action.
    ///
    /// This is the only way a flow consumes its state; callers that need
    /// to re-prompt (admin redirect with a malformed chat id) put the
    /// same action back via [`SessionStore::begin`].
    pub fn take(&self, user_id: i64) -> Option<PendingAction> {
        self.states.remove(&user_id).map(|(_, action)| action)
    }

    /// Current pending action without consuming it.
    pub fn current(&self, user_id: i64) -> Option<PendingAction> {
        self.states.get(&user_id).map(|entry| *entry.value())
    }
}
