//! Chat registry flow handlers
//!
//! Handles: /editchats and the add/delete/edit chat flows. The registry
//! is only editable by an administrator from a private chat.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use anyhow::Result;
use log::debug;
use std::fmt::Write as _;

use crate::commands::callback::chat_menu;
use crate::commands::context::CommandContext;
use crate::conversation::PendingAction;
use crate::core::response::Reply;
use crate::database::Chat;
use crate::features::roster::parse_id_lines;

const ADD_PROMPT: &str = "Please send, separated by commas: ID, chat name, role. For example:

12345678, Team chat1, admin
12345678, Team chat2, user
12345678, John Doe, admin";

const DELETE_PROMPT: &str = "Please send the IDs of the chats you want to delete, each ID on a new line. For example:

10
11
12";

const EDIT_PROMPT: &str = "Please send, separated by commas: ID of the chat you want to change, name, role. For example:

10,Scrum Team1,
11,Petya,admin
12,Scrum Team2,";

/// `/editchats` - registry view with the edit menu
///
/// Only available to administrators, and only from a private chat.
pub async fn menu_entry(
    ctx: &CommandContext,
    sender_id: i64,
    is_private: bool,
) -> Result<Reply> {
    if !is_private {
        return Ok(Reply::text(
            "The /editchats command is only available in private chats.",
        ));
    }
    if !ctx.is_admin(sender_id).await {
        return Ok(Reply::text(
            "You do not have administrator rights to edit chats!",
        ));
    }

    let chats = ctx.chats.find_all().await?;
    Ok(Reply::with_buttons(render_registry(&chats), chat_menu()))
}

/// Callback `add_chats`
pub fn begin_add(ctx: &CommandContext, sender_id: i64) -> Reply {
    ctx.sessions.begin(sender_id, PendingAction::AddingChats);
    Reply::text(ADD_PROMPT)
}

/// Callback `delete_chats`
pub fn begin_delete(ctx: &CommandContext, sender_id: i64) -> Reply {
    ctx.sessions.begin(sender_id, PendingAction::DeletingChats);
    Reply::text(DELETE_PROMPT)
}

/// Callback `edit_chats`
pub fn begin_edit(ctx: &CommandContext, sender_id: i64) -> Reply {
    ctx.sessions.begin(sender_id, PendingAction::EditingChats);
    Reply::text(EDIT_PROMPT)
}

/// Consume an add batch: `id, name, role` per line, role optional
pub async fn apply_add(ctx: &CommandContext, text: &str) -> Result<Reply> {
    for chat in parse_chat_lines(text) {
        ctx.chats.save(chat).await?;
    }
    Ok(Reply::text("Chats added successfully"))
}

/// Consume a delete batch; unknown ids are skipped silently
pub async fn apply_delete(ctx: &CommandContext, text: &str) -> Result<Reply> {
    for id in parse_id_lines(text) {
        ctx.chats.delete_by_id(id).await?;
    }
    Ok(Reply::text("Chats successfully deleted"))
}

/// Consume an edit batch; unknown ids are skipped silently
pub async fn apply_edit(ctx: &CommandContext, text: &str) -> Result<Reply> {
    for edit in parse_chat_lines(text) {
        match ctx.chats.find_by_id(edit.id).await? {
            Some(mut chat) => {
                chat.name = edit.name;
                chat.role = edit.role;
                ctx.chats.save(chat).await?;
            }
            None => debug!("skipping chat {} in edit batch", edit.id),
        }
    }
    Ok(Reply::text("Chats successfully edited"))
}

/// Parse `id, name, role` lines; the role field may be empty or absent
fn parse_chat_lines(text: &str) -> Vec<Chat> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.splitn(3, ',');
            let id = fields.next()?.trim().parse::<i64>().ok()?;
            let name = fields.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let role = fields.next().unwrap_or("").trim();
            Some(Chat {
                id,
                name: name.to_string(),
                role: role.to_string(),
            })
        })
        .collect()
}

fn render_registry(chats: &[Chat]) -> String {
    if chats.is_empty() {
        return "There are no registered chats.\nChoose an action:".to_string();
    }

    let mut out = String::from("Registered chats:\n\n");
    for chat in chats {
        let _ = writeln!(out, "ID: {}", chat.id);
        let _ = writeln!(out, "Name: {}", chat.name);
        if !chat.role.is_empty() {
            let _ = writeln!(out, "Role: {}", chat.role);
        }
        out.push('\n');
    }
    out.push_str("Choose an action:");
    out
}
