//! Conversation controller
//!
//! The single entry point for inbound events. Commands and callback
//! tokens are resolved to typed variants at this boundary and matched
//! exhaustively; free text is routed by the sender's pending action,
//! which is consumed atomically no matter how the handler fares.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use log::{error, warn};
use std::sync::Arc;

use crate::commands::handlers::{chats, notifications, users};
use crate::commands::{CallbackAction, Command, CommandContext};
use crate::conversation::PendingAction;
use crate::core::response::Reply;

const WELCOME: &str = "🎉 Welcome to AdminNotifier Bot! 🤖

🚀 What we can do together:
1️⃣ User lottery: draw winners and add new participants 🏆
2️⃣ Personalized notifications: create and edit reminders 🔔
3️⃣ Smart answers: ask the assistant and get detailed answers 🧠💬

Enjoy using it! Together we will make your chat more productive and fun! 🎯";

const NOT_AUTHORIZED: &str = "You are not authorized to use this bot.";
const SELECT_OPTION_FIRST: &str = "First, select an option from the menu.";
const UNKNOWN_COMMAND: &str = "Unknown command. Please use /start or /getchatid to get started.";
const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";

/// Routes inbound events through the per-user state machine
pub struct CommandHandler {
    ctx: Arc<CommandContext>,
}

impl CommandHandler {
    pub fn new(ctx: CommandContext) -> Self {
        CommandHandler { ctx: Arc::new(ctx) }
    }

    pub fn context(&self) -> &CommandContext {
        &self.ctx
    }

    /// Handle a command message (`/...`)
    pub async fn on_command(&self, sender_id: i64, chat_id: i64, raw: &str) -> Option<Reply> {
        let command = Command::parse(raw);

        if command.requires_registered_chat() {
            match self.ctx.chats.exists_by_id(chat_id).await {
                Ok(true) => {}
                Ok(false) => return Some(Reply::text(NOT_AUTHORIZED)),
                Err(err) => {
                    error!("chat registry lookup failed for {chat_id}: {err:#}");
                    return Some(Reply::text(GENERIC_FAILURE));
                }
            }
        }

        let is_private = is_private(sender_id, chat_id);
        let ctx = &self.ctx;
        match command {
            Command::Start => Some(Reply::text(WELCOME)),
            Command::GetChatId => Some(Reply::text(format!("Your chat ID: {chat_id}"))),
            Command::NextWinner => or_failure(users::next_winner(ctx, chat_id).await),
            Command::ResetWinners => or_failure(users::reset_winners(ctx, chat_id).await),
            Command::ShowUsers => or_failure(users::show(ctx, chat_id).await),
            Command::ShowNotifications => or_failure(notifications::show(ctx, chat_id).await),
            Command::EditUsers => {
                or_failure(users::menu_or_redirect(ctx, sender_id, chat_id, is_private).await)
            }
            Command::EditNotifications => or_failure(
                notifications::menu_or_redirect(ctx, sender_id, chat_id, is_private).await,
            ),
            Command::EditChats => or_failure(chats::menu_entry(ctx, sender_id, is_private).await),
            Command::Ask => Some(self.begin_query(sender_id)),
            Command::Unrecognized => Some(Reply::text(UNKNOWN_COMMAND)),
        }
    }

    /// Handle a menu button press
    pub async fn on_callback(&self, sender_id: i64, chat_id: i64, token: &str) -> Option<Reply> {
        let is_private = is_private(sender_id, chat_id);
        let ctx = &self.ctx;
        match CallbackAction::parse(token) {
            CallbackAction::AddUsers => {
                or_failure(users::begin_add(ctx, sender_id, is_private).await)
            }
            CallbackAction::DeleteUsers => Some(users::begin_delete(ctx, sender_id)),
            CallbackAction::EditUsers => Some(users::begin_edit(ctx, sender_id)),
            CallbackAction::AddNotification => {
                or_failure(notifications::begin_add(ctx, sender_id, is_private).await)
            }
            CallbackAction::DeleteNotifications => {
                Some(notifications::begin_delete(ctx, sender_id))
            }
            CallbackAction::EditNotification => Some(notifications::begin_edit(ctx, sender_id)),
            CallbackAction::AddChats => Some(chats::begin_add(ctx, sender_id)),
            CallbackAction::DeleteChats => Some(chats::begin_delete(ctx, sender_id)),
            CallbackAction::EditChats => Some(chats::begin_edit(ctx, sender_id)),
            CallbackAction::Unrecognized => {
                warn!("dropping unrecognized callback token from user {sender_id}: {token}");
                None
            }
        }
    }

    /// Handle a non-command text message
    ///
    /// The sender's pending action is taken (read and cleared in one
    /// step) before dispatch; handlers that need to re-prompt put it
    /// back themselves.
    pub async fn on_text_message(&self, sender_id: i64, chat_id: i64, text: &str) -> Option<Reply> {
        let Some(action) = self.ctx.sessions.take(sender_id) else {
            warn!("text from user {sender_id} with no pending action");
            return Some(Reply::text(SELECT_OPTION_FIRST));
        };

        let ctx = &self.ctx;
        match action {
            PendingAction::AddingUsers => or_failure(users::apply_add(ctx, chat_id, text).await),
            PendingAction::DeletingUsers => {
                or_failure(users::apply_delete(ctx, sender_id, chat_id, text).await)
            }
            PendingAction::EditingUsers => {
                or_failure(users::apply_edit(ctx, sender_id, chat_id, text).await)
            }
            PendingAction::AddingNotification => {
                or_failure(notifications::apply_add(ctx, chat_id, text).await)
            }
            PendingAction::DeletingNotifications => {
                or_failure(notifications::apply_delete(ctx, sender_id, chat_id, text).await)
            }
            PendingAction::EditingNotification => {
                or_failure(notifications::apply_edit(ctx, sender_id, chat_id, text).await)
            }
            PendingAction::AddingChats => or_failure(chats::apply_add(ctx, text).await),
            PendingAction::DeletingChats => or_failure(chats::apply_delete(ctx, text).await),
            PendingAction::EditingChats => or_failure(chats::apply_edit(ctx, text).await),
            PendingAction::AwaitingQuery => Some(self.dispatch_query(chat_id, text)),
            PendingAction::SelectChatForUserEdit => {
                or_failure(users::admin_select_for_edit(ctx, sender_id, text).await)
            }
            PendingAction::SelectChatForNotificationEdit => {
                or_failure(notifications::admin_select_for_edit(ctx, sender_id, text).await)
            }
            PendingAction::SelectChatForUserAdd => {
                or_failure(users::admin_add(ctx, sender_id, text).await)
            }
            PendingAction::SelectChatForNotificationAdd => {
                or_failure(notifications::admin_add(ctx, sender_id, text).await)
            }
        }
    }

    fn begin_query(&self, sender_id: i64) -> Reply {
        if self.ctx.assistant.is_none() {
            return Reply::text("The assistant is not configured.");
        }
        self.ctx
            .sessions
            .begin(sender_id, PendingAction::AwaitingQuery);
        Reply::text("Write your question to the assistant")
    }

    /// Acknowledge immediately and answer through the gateway when done
    fn dispatch_query(&self, chat_id: i64, question: &str) -> Reply {
        let Some(assistant) = self.ctx.assistant.clone() else {
            return Reply::text("The assistant is not configured.");
        };

        let messenger = self.ctx.messenger.clone();
        let question = question.to_string();
        tokio::spawn(async move {
            let reply = match assistant.ask(&question).await {
                Ok(answer) if !answer.is_empty() => Reply::text(answer),
                Ok(_) => Reply::text("The assistant returned an empty answer."),
                Err(err) => {
                    error!("assistant query failed: {err:#}");
                    Reply::text("The assistant could not answer. Please try again later.")
                }
            };
            messenger.send(chat_id, reply).await;
        });

        Reply::text("Please wait, the assistant is processing your query...")
    }
}

/// Direct chats carry the sender's own id as the chat id
fn is_private(sender_id: i64, chat_id: i64) -> bool {
    sender_id == chat_id
}

fn or_failure(result: anyhow::Result<Reply>) -> Option<Reply> {
    match result {
        Ok(reply) => Some(reply),
        Err(err) => {
            error!("flow handler failed: {err:#}");
            Some(Reply::text(GENERIC_FAILURE))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    use crate::conversation::SessionStore;
    use crate::database::{Chat, ChatStore, MemoryDatabase, NotificationStore, ParticipantStore};
    use crate::features::roster::Participant;
    use crate::messaging::NullMessenger;

    const GROUP: i64 = -100;
    const OTHER_GROUP: i64 = -200;
    const ADMIN: i64 = 7;
    const MEMBER: i64 = 42;
    const PLAIN_USER: i64 = 5;

    fn zone() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    async fn fixture() -> (CommandHandler, MemoryDatabase) {
        let db = MemoryDatabase::new();
        for (id, name, role) in [
            (GROUP, "Team chat", ""),
            (OTHER_GROUP, "Other chat", ""),
            (ADMIN, "John Doe", "admin"),
            (PLAIN_USER, "Plain user", ""),
        ] {
            ChatStore::save(
                &db,
                Chat {
                    id,
                    name: name.to_string(),
                    role: role.to_string(),
                },
            )
            .await
            .unwrap();
        }

        let handler = CommandHandler::new(CommandContext::new(
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            Arc::new(NullMessenger),
            SessionStore::new(),
            None,
            zone(),
        ));
        (handler, db)
    }

    async fn seed_participant(db: &MemoryDatabase, chat_id: i64, name: &str) -> Participant {
        ParticipantStore::save(
            db,
            Participant {
                id: 0,
                chat_id,
                name: name.to_string(),
                username: name.to_lowercase(),
                has_won: false,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_unregistered_chat_is_rejected() {
        let (handler, _) = fixture().await;
        let reply = handler.on_command(MEMBER, -999, "/showusers").await.unwrap();
        assert_eq!(reply.text, NOT_AUTHORIZED);
    }

    #[tokio::test]
    async fn test_bootstrap_pair_skips_the_gate() {
        let (handler, _) = fixture().await;
        let start = handler.on_command(MEMBER, -999, "/start").await.unwrap();
        assert!(start.text.contains("Welcome"));

        let chat_id = handler.on_command(MEMBER, -999, "/getchatid").await.unwrap();
        assert_eq!(chat_id.text, "Your chat ID: -999");
    }

    #[tokio::test]
    async fn test_unknown_command_notice() {
        let (handler, _) = fixture().await;
        let reply = handler.on_command(MEMBER, GROUP, "/frobnicate").await.unwrap();
        assert_eq!(reply.text, UNKNOWN_COMMAND);
    }

    #[tokio::test]
    async fn test_text_without_pending_action() {
        let (handler, _) = fixture().await;
        let reply = handler.on_text_message(MEMBER, GROUP, "hello").await.unwrap();
        assert_eq!(reply.text, SELECT_OPTION_FIRST);
        assert_eq!(handler.context().sessions.current(MEMBER), None);
    }

    #[tokio::test]
    async fn test_add_users_flow_applies_and_clears_state() {
        let (handler, db) = fixture().await;

        let prompt = handler.on_callback(MEMBER, GROUP, "add_users").await.unwrap();
        assert!(prompt.text.contains("name, @username"));
        assert_eq!(
            handler.context().sessions.current(MEMBER),
            Some(PendingAction::AddingUsers)
        );

        let reply = handler
            .on_text_message(MEMBER, GROUP, "Vasya,@vasyatelegram\nPetya,@evilusername")
            .await
            .unwrap();
        assert_eq!(reply.text, "Participants added successfully");
        assert_eq!(handler.context().sessions.current(MEMBER), None);

        let roster = ParticipantStore::find_by_chat(&db, GROUP).await.unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].username, "vasyatelegram");
    }

    #[tokio::test]
    async fn test_failed_parse_still_ends_the_flow() {
        let (handler, db) = fixture().await;
        handler
            .context()
            .sessions
            .begin(MEMBER, PendingAction::AddingNotification);

        let reply = handler
            .on_text_message(
                MEMBER,
                GROUP,
                "Notification text: x\nDate and time: 2023-04-06T14:00\nFrequency: sometimes",
            )
            .await
            .unwrap();
        assert!(reply.text.starts_with("Error adding notification."));
        assert_eq!(handler.context().sessions.current(MEMBER), None);
        assert!(NotificationStore::find_all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_redirect_reprompts_on_bad_chat_id() {
        let (handler, _) = fixture().await;

        let prompt = handler.on_command(ADMIN, ADMIN, "/editusers").await.unwrap();
        assert_eq!(prompt.text, "Enter chat ID to edit users:");
        assert_eq!(
            handler.context().sessions.current(ADMIN),
            Some(PendingAction::SelectChatForUserEdit)
        );

        let reply = handler.on_text_message(ADMIN, ADMIN, "not-a-number").await.unwrap();
        assert_eq!(reply.text, users::CHAT_ID_FORMAT_ERROR);
        assert_eq!(
            handler.context().sessions.current(ADMIN),
            Some(PendingAction::SelectChatForUserEdit)
        );
    }

    #[tokio::test]
    async fn test_admin_redirect_shows_target_menu_in_same_turn() {
        let (handler, db) = fixture().await;
        seed_participant(&db, GROUP, "Vasya").await;

        handler.on_command(ADMIN, ADMIN, "/editusers").await;
        let reply = handler
            .on_text_message(ADMIN, ADMIN, &GROUP.to_string())
            .await
            .unwrap();

        assert!(reply.text.contains("Name: Vasya"));
        assert!(reply.has_buttons());
        assert_eq!(handler.context().sessions.current(ADMIN), None);
    }

    #[tokio::test]
    async fn test_non_admin_edit_users_shows_menu_directly() {
        let (handler, _) = fixture().await;
        let reply = handler.on_command(MEMBER, GROUP, "/editusers").await.unwrap();
        assert!(reply.has_buttons());
        assert_eq!(handler.context().sessions.current(MEMBER), None);
    }

    #[tokio::test]
    async fn test_delete_notifications_is_lenient_and_ownership_checked() {
        let (handler, db) = fixture().await;
        handler
            .context()
            .sessions
            .begin(MEMBER, PendingAction::AddingNotification);
        handler
            .on_text_message(
                MEMBER,
                GROUP,
                "Notification text: ours\nDate and time: 2023-04-06T14:00\nFrequency: daily",
            )
            .await;
        handler
            .context()
            .sessions
            .begin(MEMBER, PendingAction::AddingNotification);
        handler
            .on_text_message(
                MEMBER,
                OTHER_GROUP,
                "Notification text: theirs\nDate and time: 2023-04-06T14:00\nFrequency: daily",
            )
            .await;

        let all = NotificationStore::find_all(&db).await.unwrap();
        assert_eq!(all.len(), 2);
        let (ours, theirs) = (all[0].id, all[1].id);

        handler
            .context()
            .sessions
            .begin(MEMBER, PendingAction::DeletingNotifications);
        let reply = handler
            .on_text_message(MEMBER, GROUP, &format!("{ours}\n{theirs}\n9999"))
            .await
            .unwrap();
        assert_eq!(reply.text, "Notifications successfully deleted");

        let remaining = NotificationStore::find_all(&db).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, theirs);
    }

    #[tokio::test]
    async fn test_admin_deletes_across_chats() {
        let (handler, db) = fixture().await;
        handler
            .context()
            .sessions
            .begin(ADMIN, PendingAction::AddingNotification);
        handler
            .on_text_message(
                ADMIN,
                OTHER_GROUP,
                "Notification text: theirs\nDate and time: 2023-04-06T14:00\nFrequency: daily",
            )
            .await;
        let id = NotificationStore::find_all(&db).await.unwrap()[0].id;

        handler
            .context()
            .sessions
            .begin(ADMIN, PendingAction::DeletingNotifications);
        handler
            .on_text_message(ADMIN, ADMIN, &id.to_string())
            .await;

        assert!(NotificationStore::find_all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_add_notification_targets_other_chat() {
        let (handler, db) = fixture().await;

        let prompt = handler
            .on_callback(ADMIN, ADMIN, "add_notification")
            .await
            .unwrap();
        assert!(prompt.text.contains("-1234567890"));
        assert_eq!(
            handler.context().sessions.current(ADMIN),
            Some(PendingAction::SelectChatForNotificationAdd)
        );

        let reply = handler
            .on_text_message(
                ADMIN,
                ADMIN,
                &format!(
                    "{GROUP}\nNotification text: standup\nDate and time: 2023-04-06T14:00\nFrequency: weekly"
                ),
            )
            .await
            .unwrap();
        assert_eq!(reply.text, "Notification added successfully");

        let stored = NotificationStore::find_by_chat(&db, GROUP).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].text, "standup");
    }

    #[tokio::test]
    async fn test_next_winner_lifecycle() {
        let (handler, db) = fixture().await;

        let empty = handler.on_command(MEMBER, GROUP, "/next").await.unwrap();
        assert_eq!(
            empty.text,
            "There are no participants for the drawing in this chat"
        );

        seed_participant(&db, GROUP, "Vasya").await;
        let won = handler.on_command(MEMBER, GROUP, "/next").await.unwrap();
        assert_eq!(won.text, "Entrant Vasya, @vasya won!");

        let exhausted = handler.on_command(MEMBER, GROUP, "/next").await.unwrap();
        assert!(exhausted.text.contains("/resetwinners"));

        handler.on_command(MEMBER, GROUP, "/resetwinners").await;
        let again = handler.on_command(MEMBER, GROUP, "/next").await.unwrap();
        assert_eq!(again.text, "Entrant Vasya, @vasya won!");
    }

    #[tokio::test]
    async fn test_show_notifications_renders_canonical_template() {
        let (handler, _) = fixture().await;
        handler
            .context()
            .sessions
            .begin(MEMBER, PendingAction::AddingNotification);
        handler
            .on_text_message(
                MEMBER,
                GROUP,
                "Notification text: standup\nDate and time: 2023-04-06T14:00\nFrequency: weekly\nExceptions:\n  - Exclude Sat and Sun",
            )
            .await;

        let listing = handler
            .on_command(MEMBER, GROUP, "/shownotifications")
            .await
            .unwrap();
        assert!(listing.text.contains("Notification text: standup"));
        assert!(listing.text.contains("Frequency: weekly"));
        assert!(listing.text.contains("Exclude Sat and Sun"));
    }

    #[tokio::test]
    async fn test_edit_chats_is_private_and_admin_only() {
        let (handler, _) = fixture().await;

        let in_group = handler.on_command(ADMIN, GROUP, "/editchats").await.unwrap();
        assert!(in_group.text.contains("only available in private chats"));

        let non_admin = handler
            .on_command(PLAIN_USER, PLAIN_USER, "/editchats")
            .await
            .unwrap();
        assert!(non_admin.text.contains("administrator rights"));

        let admin = handler.on_command(ADMIN, ADMIN, "/editchats").await.unwrap();
        assert!(admin.has_buttons());
    }

    #[tokio::test]
    async fn test_unrecognized_callback_is_dropped() {
        let (handler, _) = fixture().await;
        assert!(handler
            .on_callback(MEMBER, GROUP, "launch_missiles")
            .await
            .is_none());
        assert_eq!(handler.context().sessions.current(MEMBER), None);
    }

    #[tokio::test]
    async fn test_ask_without_assistant_is_a_fixed_notice() {
        let (handler, _) = fixture().await;
        let reply = handler.on_command(MEMBER, GROUP, "/ask").await.unwrap();
        assert_eq!(reply.text, "The assistant is not configured.");
        assert_eq!(handler.context().sessions.current(MEMBER), None);
    }
}
