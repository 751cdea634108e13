//! In-memory store for tests and embedding
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use super::{Authorizer, Chat, ChatStore, NotificationStore, ParticipantStore};
use crate::features::recurrence::Notification;
use crate::features::roster::Participant;

/// DashMap-backed implementation of every store trait
///
/// Cloning shares the underlying tables. Listings come back ordered by
/// id so list views are stable.
#[derive(Clone)]
pub struct MemoryDatabase {
    chats: Arc<DashMap<i64, Chat>>,
    participants: Arc<DashMap<i64, Participant>>,
    notifications: Arc<DashMap<i64, Notification>>,
    next_participant_id: Arc<AtomicI64>,
    next_notification_id: Arc<AtomicI64>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        MemoryDatabase {
            chats: Arc::default(),
            participants: Arc::default(),
            notifications: Arc::default(),
            // ids start at 1; 0 is the unsaved sentinel
            next_participant_id: Arc::new(AtomicI64::new(1)),
            next_notification_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatStore for MemoryDatabase {
    async fn save(&self, chat: Chat) -> Result<()> {
        self.chats.insert(chat.id, chat);
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Chat>> {
        Ok(self.chats.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_all(&self) -> Result<Vec<Chat>> {
        let mut chats: Vec<Chat> = self.chats.iter().map(|e| e.value().clone()).collect();
        chats.sort_by_key(|c| c.id);
        Ok(chats)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.chats.remove(&id);
        Ok(())
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        Ok(self.chats.contains_key(&id))
    }
}

#[async_trait]
impl ParticipantStore for MemoryDatabase {
    async fn save(&self, mut participant: Participant) -> Result<Participant> {
        if participant.id == 0 {
            participant.id = self.next_participant_id.fetch_add(1, Ordering::Relaxed);
        }
        self.participants.insert(participant.id, participant.clone());
        Ok(participant)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Participant>> {
        Ok(self
            .participants
            .get(&id)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_chat(&self, chat_id: i64) -> Result<Vec<Participant>> {
        let mut roster: Vec<Participant> = self
            .participants
            .iter()
            .filter(|e| e.value().chat_id == chat_id)
            .map(|e| e.value().clone())
            .collect();
        roster.sort_by_key(|p| p.id);
        Ok(roster)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.participants.remove(&id);
        Ok(())
    }

    async fn reset_winners(&self, chat_id: i64) -> Result<()> {
        for mut entry in self.participants.iter_mut() {
            if entry.value().chat_id == chat_id {
                entry.value_mut().has_won = false;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for MemoryDatabase {
    async fn save(&self, mut notification: Notification) -> Result<Notification> {
        if notification.id == 0 {
            notification.id = self.next_notification_id.fetch_add(1, Ordering::Relaxed);
        }
        self.notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Notification>> {
        Ok(self
            .notifications
            .get(&id)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_chat(&self, chat_id: i64) -> Result<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|e| e.value().chat_id == chat_id)
            .map(|e| e.value().clone())
            .collect();
        notifications.sort_by_key(|n| n.id);
        Ok(notifications)
    }

    async fn find_all(&self) -> Result<Vec<Notification>> {
        let mut notifications: Vec<Notification> =
            self.notifications.iter().map(|e| e.value().clone()).collect();
        notifications.sort_by_key(|n| n.id);
        Ok(notifications)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.notifications.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl Authorizer for MemoryDatabase {
    async fn is_administrator(&self, user_id: i64) -> bool {
        self.chats
            .get(&user_id)
            .map(|entry| entry.value().is_admin())
            .unwrap_or(false)
    }
}
