//! Typed callback-token boundary
//!
//! The nine fixed menu tokens, resolved once at the edge. Outbound
//! menus are built from the same variants, so a token always
//! round-trips through its button.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use crate::core::response::Button;

/// Menu button identity delivered back through `on_callback`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    AddUsers,
    DeleteUsers,
    EditUsers,
    AddNotification,
    DeleteNotifications,
    EditNotification,
    AddChats,
    DeleteChats,
    EditChats,
    Unrecognized,
}

impl CallbackAction {
    pub fn parse(token: &str) -> CallbackAction {
        match token {
            "add_users" => CallbackAction::AddUsers,
            "delete_users" => CallbackAction::DeleteUsers,
            "edit_users" => CallbackAction::EditUsers,
            "add_notification" => CallbackAction::AddNotification,
            "delete_notifications" => CallbackAction::DeleteNotifications,
            "edit_notification" => CallbackAction::EditNotification,
            "add_chats" => CallbackAction::AddChats,
            "delete_chats" => CallbackAction::DeleteChats,
            "edit_chats" => CallbackAction::EditChats,
            _ => CallbackAction::Unrecognized,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            CallbackAction::AddUsers => "add_users",
            CallbackAction::DeleteUsers => "delete_users",
            CallbackAction::EditUsers => "edit_users",
            CallbackAction::AddNotification => "add_notification",
            CallbackAction::DeleteNotifications => "delete_notifications",
            CallbackAction::EditNotification => "edit_notification",
            CallbackAction::AddChats => "add_chats",
            CallbackAction::DeleteChats => "delete_chats",
            CallbackAction::EditChats => "edit_chats",
            CallbackAction::Unrecognized => "unrecognized",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CallbackAction::AddUsers => "Add users",
            CallbackAction::DeleteUsers => "Delete users",
            CallbackAction::EditUsers => "Edit users",
            CallbackAction::AddNotification => "Add notification",
            CallbackAction::DeleteNotifications => "Delete notifications",
            CallbackAction::EditNotification => "Edit notification",
            CallbackAction::AddChats => "Add chats",
            CallbackAction::DeleteChats => "Delete chats",
            CallbackAction::EditChats => "Edit chats",
            CallbackAction::Unrecognized => "?",
        }
    }

    fn button(&self) -> Button {
        Button {
            label: self.label(),
            token: self.token(),
        }
    }
}

/// Menu attached to the roster edit views
pub fn user_menu() -> Vec<Button> {
    vec![
        CallbackAction::AddUsers.button(),
        CallbackAction::DeleteUsers.button(),
        CallbackAction::EditUsers.button(),
    ]
}

/// Menu attached to the notification edit views
pub fn notification_menu() -> Vec<Button> {
    vec![
        CallbackAction::AddNotification.button(),
        CallbackAction::DeleteNotifications.button(),
        CallbackAction::EditNotification.button(),
    ]
}

/// Menu attached to the chat registry view
pub fn chat_menu() -> Vec<Button> {
    vec![
        CallbackAction::AddChats.button(),
        CallbackAction::DeleteChats.button(),
        CallbackAction::EditChats.button(),
    ]
}
