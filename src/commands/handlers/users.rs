//! Roster flow handlers
//!
//! Handles: /next, /resetwinners, /showusers, /editusers and the
//! add/delete/edit roster flows, including the administrator redirect.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use anyhow::Result;
use log::debug;

use crate::commands::callback::user_menu;
use crate::commands::context::CommandContext;
use crate::conversation::PendingAction;
use crate::core::response::Reply;
use crate::features::roster::{
    draw_winner, parse_add_lines, parse_edit_lines, parse_id_lines, render_roster, Participant,
};

pub const CHAT_ID_FORMAT_ERROR: &str = "Chat ID format is incorrect. Enter the correct chat ID:";

const ADD_PROMPT: &str = "Please send, separated by commas: name, @username. For example:

Vasya,@vasyatelegram
Petya,@evilusername
Evelina,@evacool";

const ADMIN_ADD_PROMPT: &str = "In the first line, send the ID of the chat to which you want to add participants. Next, send from new lines, separated by commas: name, @username. For example:

-123456789
Vasya,@vasyatelegram
Petya,@evilusername
Evelina,@evacool";

const DELETE_PROMPT: &str = "Please send the IDs of the members you want to remove, each ID on a new line. For example:

10
11
12";

const EDIT_PROMPT: &str = "Please send, separated by commas: ID of the participant you want to change, name, username. For example:

10,Vasya,vasyatelegram
11,Petya,evilusername
12,Evelina,evacool";

/// `/next` - draw a winner and mark it as having won
pub async fn next_winner(ctx: &CommandContext, chat_id: i64) -> Result<Reply> {
    let roster = ctx.participants.find_by_chat(chat_id).await?;
    if roster.is_empty() {
        return Ok(Reply::text(
            "There are no participants for the drawing in this chat",
        ));
    }

    match draw_winner(&roster).cloned() {
        Some(winner) => {
            let text = format!("Entrant {}, @{} won!", winner.name, winner.username);
            let mut won = winner;
            won.has_won = true;
            ctx.participants.save(won).await?;
            Ok(Reply::text(text))
        }
        None => Ok(Reply::text(
            "Everyone has already won. Use /resetwinners to start a new round",
        )),
    }
}

/// `/resetwinners`
pub async fn reset_winners(ctx: &CommandContext, chat_id: i64) -> Result<Reply> {
    ctx.participants.reset_winners(chat_id).await?;
    Ok(Reply::text("Winners reset!"))
}

/// `/showusers` - roster list without ids
pub async fn show(ctx: &CommandContext, chat_id: i64) -> Result<Reply> {
    let roster = ctx.participants.find_by_chat(chat_id).await?;
    Ok(Reply::text(render_roster(&roster, false)))
}

/// `/editusers` - either the edit menu or the administrator redirect
pub async fn menu_or_redirect(
    ctx: &CommandContext,
    sender_id: i64,
    chat_id: i64,
    is_private: bool,
) -> Result<Reply> {
    if is_private && ctx.is_admin(sender_id).await {
        ctx.sessions
            .begin(sender_id, PendingAction::SelectChatForUserEdit);
        return Ok(Reply::text("Enter chat ID to edit users:"));
    }
    edit_menu(ctx, chat_id).await
}

async fn edit_menu(ctx: &CommandContext, chat_id: i64) -> Result<Reply> {
    let roster = ctx.participants.find_by_chat(chat_id).await?;
    let text = format!("{}\nChoose an action:", render_roster(&roster, true));
    Ok(Reply::with_buttons(text, user_menu()))
}

/// Callback `add_users`
pub async fn begin_add(ctx: &CommandContext, sender_id: i64, is_private: bool) -> Result<Reply> {
    if is_private && ctx.is_admin(sender_id).await {
        ctx.sessions
            .begin(sender_id, PendingAction::SelectChatForUserAdd);
        Ok(Reply::text(ADMIN_ADD_PROMPT))
    } else {
        ctx.sessions.begin(sender_id, PendingAction::AddingUsers);
        Ok(Reply::text(ADD_PROMPT))
    }
}

/// Callback `delete_users`
pub fn begin_delete(ctx: &CommandContext, sender_id: i64) -> Reply {
    ctx.sessions.begin(sender_id, PendingAction::DeletingUsers);
    Reply::text(DELETE_PROMPT)
}

/// Callback `edit_users`
pub fn begin_edit(ctx: &CommandContext, sender_id: i64) -> Reply {
    ctx.sessions.begin(sender_id, PendingAction::EditingUsers);
    Reply::text(EDIT_PROMPT)
}

/// Consume an add batch for `chat_id`
pub async fn apply_add(ctx: &CommandContext, chat_id: i64, text: &str) -> Result<Reply> {
    for (name, username) in parse_add_lines(text) {
        ctx.participants
            .save(Participant {
                id: 0,
                chat_id,
                name,
                username,
                has_won: false,
            })
            .await?;
    }
    Ok(Reply::text("Participants added successfully"))
}

/// Consume a delete batch; unknown ids are skipped silently
///
/// Deleting a participant of another chat requires the administrator
/// predicate.
pub async fn apply_delete(
    ctx: &CommandContext,
    sender_id: i64,
    chat_id: i64,
    text: &str,
) -> Result<Reply> {
    let is_admin = ctx.is_admin(sender_id).await;
    for id in parse_id_lines(text) {
        match ctx.participants.find_by_id(id).await? {
            Some(participant) if is_admin || participant.chat_id == chat_id => {
                ctx.participants.delete_by_id(id).await?;
            }
            Some(_) | None => debug!("skipping participant {id} in delete batch"),
        }
    }
    Ok(Reply::text("Members successfully deleted"))
}

/// Consume an edit batch; unknown ids are skipped silently
pub async fn apply_edit(
    ctx: &CommandContext,
    sender_id: i64,
    chat_id: i64,
    text: &str,
) -> Result<Reply> {
    let is_admin = ctx.is_admin(sender_id).await;
    for (id, name, username) in parse_edit_lines(text) {
        match ctx.participants.find_by_id(id).await? {
            Some(mut participant) if is_admin || participant.chat_id == chat_id => {
                participant.name = name;
                participant.username = username;
                ctx.participants.save(participant).await?;
            }
            Some(_) | None => debug!("skipping participant {id} in edit batch"),
        }
    }
    Ok(Reply::text("Members successfully edited"))
}

/// Consume the target chat id for the administrator edit redirect
///
/// A non-integer id re-prompts and puts the redirect state back; a valid
/// id answers with the target chat's edit menu in the same turn.
pub async fn admin_select_for_edit(
    ctx: &CommandContext,
    sender_id: i64,
    text: &str,
) -> Result<Reply> {
    match text.trim().parse::<i64>() {
        Ok(target_chat_id) => edit_menu(ctx, target_chat_id).await,
        Err(_) => {
            ctx.sessions
                .begin(sender_id, PendingAction::SelectChatForUserEdit);
            Ok(Reply::text(CHAT_ID_FORMAT_ERROR))
        }
    }
}

/// Consume the administrator add payload: first line target chat id,
/// remaining lines the roster batch
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
                .begin(sender_id, PendingAction::SelectChatForUserAdd);
            Ok(Reply::text(CHAT_ID_FORMAT_ERROR))
        }
    }
}
