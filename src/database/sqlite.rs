//! SQLite-backed store
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use log::warn;
use sqlite::{Connection, State};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Authorizer, Chat, ChatStore, NotificationStore, ParticipantStore};
use crate::features::recurrence::{ExclusionRule, Frequency, Notification};
use crate::features::roster::Participant;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS chats (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT ''
);
CREATE TABLE IF NOT EXISTS participants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    username TEXT NOT NULL,
    has_won INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS notifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id INTEGER NOT NULL,
    text TEXT NOT NULL,
    datetime TEXT NOT NULL,
    repetition TEXT NOT NULL,
    excluded TEXT NOT NULL
);
";

/// File-backed store; one serialized connection shared across handlers
///
/// Statements are short and never held across an await point.
#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = sqlite::open(path.as_ref())
            .with_context(|| format!("opening database at {}", path.as_ref().display()))?;
        conn.execute(SCHEMA).context("applying database schema")?;
        Ok(SqliteDatabase {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn last_insert_id(conn: &Connection) -> Result<i64> {
        let mut stmt = conn.prepare("SELECT last_insert_rowid()")?;
        match stmt.next()? {
            State::Row => Ok(stmt.read::<i64, _>(0)?),
            State::Done => Err(anyhow!("last_insert_rowid returned no row")),
        }
    }

    fn read_notification(stmt: &sqlite::Statement<'_>) -> Result<Notification> {
        let datetime_raw = stmt.read::<String, _>("datetime")?;
        let repetition_raw = stmt.read::<String, _>("repetition")?;
        let excluded_raw = stmt.read::<String, _>("excluded")?;

        Ok(Notification {
            id: stmt.read::<i64, _>("id")?,
            chat_id: stmt.read::<i64, _>("chat_id")?,
            text: stmt.read::<String, _>("text")?,
            datetime: DateTime::parse_from_rfc3339(&datetime_raw)
                .with_context(|| format!("stored datetime is not RFC 3339: {datetime_raw}"))?,
            repetition: Frequency::parse(&repetition_raw)
                .ok_or_else(|| anyhow!("stored repetition is not recognized: {repetition_raw}"))?,
            excluded: serde_json::from_str::<ExclusionRule>(&excluded_raw)
                .with_context(|| format!("stored exclusion rule is not valid JSON: {excluded_raw}"))?,
        })
    }

    fn read_participant(stmt: &sqlite::Statement<'_>) -> Result<Participant> {
        Ok(Participant {
            id: stmt.read::<i64, _>("id")?,
            chat_id: stmt.read::<i64, _>("chat_id")?,
            name: stmt.read::<String, _>("name")?,
            username: stmt.read::<String, _>("username")?,
            has_won: stmt.read::<i64, _>("has_won")? != 0,
        })
    }

    fn read_chat(stmt: &sqlite::Statement<'_>) -> Result<Chat> {
        Ok(Chat {
            id: stmt.read::<i64, _>("id")?,
            name: stmt.read::<String, _>("name")?,
            role: stmt.read::<String, _>("role")?,
        })
    }
}

#[async_trait]
impl ChatStore for SqliteDatabase {
    async fn save(&self, chat: Chat) -> Result<()> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("INSERT OR REPLACE INTO chats (id, name, role) VALUES (?, ?, ?)")?;
        stmt.bind((1, chat.id))?;
        stmt.bind((2, chat.name.as_str()))?;
        stmt.bind((3, chat.role.as_str()))?;
        while stmt.next()? != State::Done {}
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Chat>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, role FROM chats WHERE id = ?")?;
        stmt.bind((1, id))?;
        match stmt.next()? {
            State::Row => Ok(Some(Self::read_chat(&stmt)?)),
            State::Done => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Chat>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, role FROM chats ORDER BY id")?;
        let mut chats = Vec::new();
        while stmt.next()? == State::Row {
            chats.push(Self::read_chat(&stmt)?);
        }
        Ok(chats)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let conn = self.conn();
        let mut stmt = conn.prepare("DELETE FROM chats WHERE id = ?")?;
        stmt.bind((1, id))?;
        while stmt.next()? != State::Done {}
        Ok(())
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        Ok(ChatStore::find_by_id(self, id).await?.is_some())
    }
}

#[async_trait]
impl ParticipantStore for SqliteDatabase {
    async fn save(&self, participant: Participant) -> Result<Participant> {
        let conn = self.conn();
        if participant.id == 0 {
            let mut stmt = conn.prepare(
                "INSERT INTO participants (chat_id, name, username, has_won) VALUES (?, ?, ?, ?)",
            )?;
            stmt.bind((1, participant.chat_id))?;
            stmt.bind((2, participant.name.as_str()))?;
            stmt.bind((3, participant.username.as_str()))?;
            stmt.bind((4, i64::from(participant.has_won)))?;
            while stmt.next()? != State::Done {}
            let id = Self::last_insert_id(&conn)?;
            Ok(Participant { id, ..participant })
        } else {
            let mut stmt = conn.prepare(
                "UPDATE participants SET chat_id = ?, name = ?, username = ?, has_won = ? WHERE id = ?",
            )?;
            stmt.bind((1, participant.chat_id))?;
            stmt.bind((2, participant.name.as_str()))?;
            stmt.bind((3, participant.username.as_str()))?;
            stmt.bind((4, i64::from(participant.has_won)))?;
            stmt.bind((5, participant.id))?;
            while stmt.next()? != State::Done {}
            Ok(participant)
        }
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Participant>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, chat_id, name, username, has_won FROM participants WHERE id = ?",
        )?;
        stmt.bind((1, id))?;
        match stmt.next()? {
            State::Row => Ok(Some(Self::read_participant(&stmt)?)),
            State::Done => Ok(None),
        }
    }

    async fn find_by_chat(&self, chat_id: i64) -> Result<Vec<Participant>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, chat_id, name, username, has_won FROM participants WHERE chat_id = ? ORDER BY id",
        )?;
        stmt.bind((1, chat_id))?;
        let mut participants = Vec::new();
        while stmt.next()? == State::Row {
            participants.push(Self::read_participant(&stmt)?);
        }
        Ok(participants)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let conn = self.conn();
        let mut stmt = conn.prepare("DELETE FROM participants WHERE id = ?")?;
        stmt.bind((1, id))?;
        while stmt.next()? != State::Done {}
        Ok(())
    }

    async fn reset_winners(&self, chat_id: i64) -> Result<()> {
        let conn = self.conn();
        let mut stmt = conn.prepare("UPDATE participants SET has_won = 0 WHERE chat_id = ?")?;
        stmt.bind((1, chat_id))?;
        while stmt.next()? != State::Done {}
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for SqliteDatabase {
    async fn save(&self, notification: Notification) -> Result<Notification> {
        let datetime = notification.datetime.to_rfc3339();
        let excluded = serde_json::to_string(&notification.excluded)?;
        let conn = self.conn();
        if notification.id == 0 {
            let mut stmt = conn.prepare(
                "INSERT INTO notifications (chat_id, text, datetime, repetition, excluded) VALUES (?, ?, ?, ?, ?)",
            )?;
            stmt.bind((1, notification.chat_id))?;
            stmt.bind((2, notification.text.as_str()))?;
            stmt.bind((3, datetime.as_str()))?;
            stmt.bind((4, notification.repetition.as_str()))?;
            stmt.bind((5, excluded.as_str()))?;
            while stmt.next()? != State::Done {}
            let id = Self::last_insert_id(&conn)?;
            Ok(Notification { id, ..notification })
        } else {
            let mut stmt = conn.prepare(
                "UPDATE notifications SET text = ?, datetime = ?, repetition = ?, excluded = ? WHERE id = ?",
            )?;
            stmt.bind((1, notification.text.as_str()))?;
            stmt.bind((2, datetime.as_str()))?;
            stmt.bind((3, notification.repetition.as_str()))?;
            stmt.bind((4, excluded.as_str()))?;
            stmt.bind((5, notification.id))?;
            while stmt.next()? != State::Done {}
            Ok(notification)
        }
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Notification>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, chat_id, text, datetime, repetition, excluded FROM notifications WHERE id = ?",
        )?;
        stmt.bind((1, id))?;
        match stmt.next()? {
            State::Row => Ok(Some(Self::read_notification(&stmt)?)),
            State::Done => Ok(None),
        }
    }

    async fn find_by_chat(&self, chat_id: i64) -> Result<Vec<Notification>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, chat_id, text, datetime, repetition, excluded FROM notifications WHERE chat_id = ? ORDER BY id",
        )?;
        stmt.bind((1, chat_id))?;
        let mut notifications = Vec::new();
        while stmt.next()? == State::Row {
            notifications.push(Self::read_notification(&stmt)?);
        }
        Ok(notifications)
    }

    async fn find_all(&self) -> Result<Vec<Notification>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, chat_id, text, datetime, repetition, excluded FROM notifications ORDER BY id",
        )?;
        let mut notifications = Vec::new();
        while stmt.next()? == State::Row {
            notifications.push(Self::read_notification(&stmt)?);
        }
        Ok(notifications)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let conn = self.conn();
        let mut stmt = conn.prepare("DELETE FROM notifications WHERE id = ?")?;
        stmt.bind((1, id))?;
        while stmt.next()? != State::Done {}
        Ok(())
    }
}

#[async_trait]
impl Authorizer for SqliteDatabase {
    async fn is_administrator(&self, user_id: i64) -> bool {
        match ChatStore::find_by_id(self, user_id).await {
            Ok(chat) => chat.map(|c| c.is_admin()).unwrap_or(false),
            Err(err) => {
                warn!("administrator lookup failed for user {user_id}: {err:#}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn open_temp() -> SqliteDatabase {
        SqliteDatabase::open(":memory:").unwrap()
    }

    fn sample_notification(chat_id: i64) -> Notification {
        let zone = FixedOffset::east_opt(3 * 3600).unwrap();
        let parsed = crate::features::recurrence::template::parse(
            "Notification text: standup\nDate and time: 2023-04-06T14:00\nFrequency: weekly\nExceptions:\n  - Exclude Sat and Sun",
            zone,
        )
        .unwrap();
        parsed.into_notification(chat_id)
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let db = open_temp();
        ChatStore::save(
            &db,
            Chat {
                id: -100,
                name: "Team chat".to_string(),
                role: String::new(),
            },
        )
        .await
        .unwrap();

        assert!(db.exists_by_id(-100).await.unwrap());
        let chat = ChatStore::find_by_id(&db, -100).await.unwrap().unwrap();
        assert_eq!(chat.name, "Team chat");

        ChatStore::delete_by_id(&db, -100).await.unwrap();
        assert!(!db.exists_by_id(-100).await.unwrap());
    }

    #[tokio::test]
    async fn test_participant_insert_update_reset() {
        let db = open_temp();
        let saved = ParticipantStore::save(
            &db,
            Participant {
                id: 0,
                chat_id: -100,
                name: "Vasya".to_string(),
                username: "vasyatelegram".to_string(),
                has_won: false,
            },
        )
        .await
        .unwrap();
        assert!(saved.id > 0);

        let mut won = saved.clone();
        won.has_won = true;
        ParticipantStore::save(&db, won).await.unwrap();
        let row = ParticipantStore::find_by_id(&db, saved.id)
            .await
            .unwrap()
            .unwrap();
        assert!(row.has_won);

        db.reset_winners(-100).await.unwrap();
        let roster = ParticipantStore::find_by_chat(&db, -100).await.unwrap();
        assert!(roster.iter().all(|p| !p.has_won));
    }

    #[tokio::test]
    async fn test_notification_round_trip_preserves_rule() {
        let db = open_temp();
        let saved = NotificationStore::save(&db, sample_notification(-100))
            .await
            .unwrap();
        assert!(saved.id > 0);

        let row = NotificationStore::find_by_id(&db, saved.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.datetime, saved.datetime);
        assert_eq!(row.repetition, saved.repetition);
        assert_eq!(row.excluded, saved.excluded);
    }

    #[tokio::test]
    async fn test_administrator_predicate_reads_role() {
        let db = open_temp();
        ChatStore::save(
            &db,
            Chat {
                id: 7,
                name: "John Doe".to_string(),
                role: "admin".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(db.is_administrator(7).await);
        assert!(!db.is_administrator(8).await);
    }
}
