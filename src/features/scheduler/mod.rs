//! # Delivery Scheduler
//!
//! Minute tick that matches stored notifications against the current
//! instant, applies the exclusion rule, resolves winner placeholders,
//! and hands the text to the messaging gateway.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0
//! - **Toggleable**: true

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use log::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::core::response::Reply;
use crate::database::{NotificationStore, ParticipantStore};
use crate::features::recurrence::{is_excluded, Frequency, Notification};
use crate::features::roster::draw_winner;
use crate::messaging::Messenger;

const NAME_PLACEHOLDER: &str = "@name";
const USERNAME_PLACEHOLDER: &str = "@username";

/// Whether `notification` fires at the minute containing `now`
///
/// Matching is at minute precision against the base instant, compared in
/// the base instant's zone; nothing fires before the base instant. Pure
/// and reentrant, like the exclusion evaluator it is paired with.
pub fn is_due(notification: &Notification, now: DateTime<FixedOffset>) -> bool {
    let base = notification.datetime;
    let now = now.with_timezone(&base.timezone());

    if now < base {
        return false;
    }

    let same_minute = now.minute() == base.minute();
    let same_time = same_minute && now.hour() == base.hour();

    match notification.repetition {
        Frequency::Once => now.date_naive() == base.date_naive() && same_time,
        Frequency::Minutely => true,
        Frequency::Hourly => same_minute,
        Frequency::Daily => same_time,
        Frequency::Weekly => same_time && now.weekday() == base.weekday(),
        Frequency::Monthly => same_time && now.day() == base.day(),
        Frequency::Yearly => {
            same_time && now.day() == base.day() && now.month() == base.month()
        }
    }
}

/// Background delivery loop
pub struct DeliveryScheduler {
    notifications: Arc<dyn NotificationStore>,
    participants: Arc<dyn ParticipantStore>,
    messenger: Arc<dyn Messenger>,
    timezone: FixedOffset,
}

impl DeliveryScheduler {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        participants: Arc<dyn ParticipantStore>,
        messenger: Arc<dyn Messenger>,
        timezone: FixedOffset,
    ) -> Self {
        DeliveryScheduler {
            notifications,
            participants,
            messenger,
            timezone,
        }
    }

    /// Spawn the minute tick on the runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("delivery scheduler started");
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                self.tick(Utc::now().with_timezone(&self.timezone)).await;
            }
        })
    }

    /// Run one delivery pass for the minute containing `now`.
    pub async fn tick(&self, now: DateTime<FixedOffset>) {
        let notifications = match self.notifications.find_all().await {
            Ok(notifications) => notifications,
            Err(err) => {
                error!("loading notifications for delivery failed: {err:#}");
                return;
            }
        };

        for notification in notifications {
            if !is_due(&notification, now) {
                continue;
            }
            if is_excluded(&notification.excluded, now.date_naive()) {
                debug!(
                    "notification {} suppressed by exclusion rule on {}",
                    notification.id,
                    now.date_naive()
                );
                continue;
            }
            let text = self.resolve_placeholders(&notification).await;
            info!("delivering notification {} to chat {}", notification.id, notification.chat_id);
            self.messenger
                .send(notification.chat_id, Reply::text(text))
                .await;
        }
    }

    /// Substitute `@name` / `@username` by drawing a lottery winner
    ///
    /// The winner is marked as having won. With no eligible participant
    /// the text goes out unresolved so a misconfigured roster stays
    /// visible in the chat.
    async fn resolve_placeholders(&self, notification: &Notification) -> String {
        if !notification.text.contains(NAME_PLACEHOLDER)
            && !notification.text.contains(USERNAME_PLACEHOLDER)
        {
            return notification.text.clone();
        }

        let roster = match self.participants.find_by_chat(notification.chat_id).await {
            Ok(roster) => roster,
            Err(err) => {
                error!(
                    "loading roster for chat {} failed: {err:#}",
                    notification.chat_id
                );
                return notification.text.clone();
            }
        };

        let Some(winner) = draw_winner(&roster).cloned() else {
            return notification.text.clone();
        };

        let text = notification
            .text
            // order matters: "@username" contains "@name"
            .replace(USERNAME_PLACEHOLDER, &format!("@{}", winner.username))
            .replace(NAME_PLACEHOLDER, &winner.name);

        let mut won = winner;
        won.has_won = true;
        if let Err(err) = self.participants.save(won).await {
            error!("marking winner failed: {err:#}");
        }

        text
    }
}
