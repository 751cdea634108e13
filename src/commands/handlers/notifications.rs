//! Notification flow handlers
//!
//! Handles: /shownotifications, /editnotifications and the
//! add/delete/edit notification flows, including the administrator
//! redirect.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use anyhow::Result;
use log::debug;
use std::fmt::Write as _;

use crate::commands::callback::notification_menu;
use crate::commands::context::CommandContext;
use crate::commands::handlers::users::CHAT_ID_FORMAT_ERROR;
use crate::conversation::PendingAction;
use crate::core::response::Reply;
use crate::features::recurrence::template::{self, ParseError};
use crate::features::recurrence::Notification;
use crate::features::roster::parse_id_lines;

const TEMPLATE_EXAMPLE: &str = "Notification text: Everything is on daily, today it's fumbling @name, @username!
Date and time: 2023-04-06T14:00
Frequency: {once|minutely|hourly|daily|weekly|monthly|yearly}
Exceptions:
  - Exclude Sat and Sun
  - Exclude days:
    * 2023-04-12 (every 7 days)
    * 2023-04-24 (every 21 days)
    * 2023-04-07 (every 7 days)";

const DELETE_PROMPT: &str = "Please send the IDs of the notifications you want to delete, each ID on a new line. For example:

10
11
12";

/// `/shownotifications` - list without ids
pub async fn show(ctx: &CommandContext, chat_id: i64) -> Result<Reply> {
    let notifications = ctx.notifications.find_by_chat(chat_id).await?;
    Ok(Reply::text(render_list(ctx, &notifications, false)))
}

/// `/editnotifications` - either the edit menu or the administrator redirect
pub async fn menu_or_redirect(
    ctx: &CommandContext,
    sender_id: i64,
    chat_id: i64,
    is_private: bool,
) -> Result<Reply> {
    if is_private && ctx.is_admin(sender_id).await {
        ctx.sessions
            .begin(sender_id, PendingAction::SelectChatForNotificationEdit);
        return Ok(Reply::text("Enter chat ID to edit notifications:"));
    }
    edit_menu(ctx, chat_id).await
}

async fn edit_menu(ctx: &CommandContext, chat_id: i64) -> Result<Reply> {
    let notifications = ctx.notifications.find_by_chat(chat_id).await?;
    let text = format!(
        "{}\nChoose an action:",
        render_list(ctx, &notifications, true)
    );
    Ok(Reply::with_buttons(text, notification_menu()))
}

/// Callback `add_notification`
pub async fn begin_add(ctx: &CommandContext, sender_id: i64, is_private: bool) -> Result<Reply> {
    if is_private && ctx.is_admin(sender_id).await {
        ctx.sessions
            .begin(sender_id, PendingAction::SelectChatForNotificationAdd);
        Ok(Reply::text(format!(
            "In the first line, send the ID of the chat to which you want to add the notification. \
             Next, send a notification according to the following template. For convenience, the \
             template can be copied, pasted and edited.\n\n-1234567890\n{TEMPLATE_EXAMPLE}"
        )))
    } else {
        ctx.sessions
            .begin(sender_id, PendingAction::AddingNotification);
        Ok(Reply::text(format!(
            "Please send a notification according to the following template. For convenience, the \
             template can be copied, pasted and edited.\n\n{TEMPLATE_EXAMPLE}"
        )))
    }
}

/// Callback `delete_notifications`
pub fn begin_delete(ctx: &CommandContext, sender_id: i64) -> Reply {
    ctx.sessions
        .begin(sender_id, PendingAction::DeletingNotifications);
    Reply::text(DELETE_PROMPT)
}

/// Callback `edit_notification`
pub fn begin_edit(ctx: &CommandContext, sender_id: i64) -> Reply {
    ctx.sessions
        .begin(sender_id, PendingAction::EditingNotification);
    Reply::text(format!(
        "Please send the amended notification according to the following template. For \
         convenience, copy the previous version of the notification and change it.\n\n\
         ID: 11\n{TEMPLATE_EXAMPLE}"
    ))
}

/// Consume an add submission for `chat_id`
///
/// A parse failure ends the flow with the literal reason; nothing is
/// partially applied.
pub async fn apply_add(ctx: &CommandContext, chat_id: i64, text: &str) -> Result<Reply> {
    match template::parse(text, ctx.timezone) {
        Ok(parsed) => {
            ctx.notifications
                .save(parsed.into_notification(chat_id))
                .await?;
            Ok(Reply::text("Notification added successfully"))
        }
        Err(reason) => Ok(Reply::text(format!("Error adding notification. {reason}"))),
    }
}

/// Consume a delete batch; unknown ids are skipped silently
pub async fn apply_delete(
    ctx: &CommandContext,
    sender_id: i64,
    chat_id: i64,
    text: &str,
) -> Result<Reply> {
    let is_admin = ctx.is_admin(sender_id).await;
    for id in parse_id_lines(text) {
        match ctx.notifications.find_by_id(id).await? {
            Some(notification) if is_admin || notification.chat_id == chat_id => {
                ctx.notifications.delete_by_id(id).await?;
            }
            Some(_) | None => debug!("skipping notification {id} in delete batch"),
        }
    }
    Ok(Reply::text("Notifications successfully deleted"))
}

/// Consume an edit submission; the template must carry an `ID:` line
pub async fn apply_edit(
    ctx: &CommandContext,
    sender_id: i64,
    chat_id: i64,
    text: &str,
) -> Result<Reply> {
    let parsed = match template::parse(text, ctx.timezone) {
        Ok(parsed) => parsed,
        Err(reason) => {
            return Ok(Reply::text(format!("Error editing notification. {reason}")))
        }
    };
    let Some(id) = parsed.id else {
        return Ok(Reply::text(format!(
            "Error editing notification. {}",
            ParseError::MissingId
        )));
    };

    if let Some(current) = ctx.notifications.find_by_id(id).await? {
        if ctx.is_admin(sender_id).await || current.chat_id == chat_id {
            ctx.notifications
                .save(Notification {
                    id: current.id,
                    chat_id: current.chat_id,
                    text: parsed.text,
                    datetime: parsed.datetime,
                    repetition: parsed.repetition,
                    excluded: parsed.excluded,
                })
                .await?;
        }
    }
    Ok(Reply::text("Notification successfully edited"))
}

/// Consume the target chat id for the administrator edit redirect
pub async fn admin_select_for_edit(
    ctx: &CommandContext,
    sender_id: i64,
    text: &str,
) -> Result<Reply> {
    match text.trim().parse::<i64>() {
        Ok(target_chat_id) => edit_menu(ctx, target_chat_id).await,
        Err(_) => {
            ctx.sessions
                .begin(sender_id, PendingAction::SelectChatForNotificationEdit);
            Ok(Reply::text(CHAT_ID_FORMAT_ERROR))
        }
    }
}

/// Consume the administrator add payload: first line target chat id,
/// remaining lines the template
pub async fn admin_add(ctx: &CommandContext, sender_id: i64, text: &str) -> Result<Reply> {
    let (first_line, payload) = match text.split_once('\n') {
        Some(parts) => parts,
        None => (text, ""),
    };

    match first_line.trim().parse::<i64>() {
        Ok(target_chat_id) if !payload.trim().is_empty() => {
            apply_add(ctx, target_chat_id, payload).await
        }
        _ => {
            ctx.sessions
                .begin(sender_id, PendingAction::SelectChatForNotificationAdd);
            Ok(Reply::text(CHAT_ID_FORMAT_ERROR))
        }
    }
}

/// Plain-text notification list view, in canonical template form
fn render_list(ctx: &CommandContext, notifications: &[Notification], show_ids: bool) -> String {
    if notifications.is_empty() {
        return "There are no notifications for this chat".to_string();
    }

    let mut out = String::from("Notifications for this chat:\n\n");
    for notification in notifications {
        let rendered = if show_ids {
            template::render_with_id(notification, ctx.timezone)
        } else {
            template::render(notification, ctx.timezone)
        };
        let _ = writeln!(out, "{rendered}");
    }
    out
}
