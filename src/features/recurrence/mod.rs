//! # Recurrence Feature
//!
//! Reminder timing model: a base instant in a fixed zone, a repeat
//! frequency, and a calendar exception rule, plus the template parser
//! users submit reminders through.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0
//! - **Toggleable**: false

pub mod exclusion;
pub mod template;

pub use exclusion::is_excluded;
pub use template::{render, render_with_id, ParseError, ParsedTemplate};

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Repeat cadence of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Once,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub const ALL: [Frequency; 7] = [
        Frequency::Once,
        Frequency::Minutely,
        Frequency::Hourly,
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Yearly,
    ];

    pub fn parse(token: &str) -> Option<Frequency> {
        match token.trim().to_lowercase().as_str() {
            "once" => Some(Frequency::Once),
            "minutely" => Some(Frequency::Minutely),
            "hourly" => Some(Frequency::Hourly),
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "monthly" => Some(Frequency::Monthly),
            "yearly" => Some(Frequency::Yearly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Once => "once",
            Frequency::Minutely => "minutely",
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One periodic skip entry: `day`, `day ± frequency`, `day ± 2·frequency`, ...
///
/// The anchor need not precede the notification's base date. Serde field
/// names match the stored JSON payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipDay {
    pub day: NaiveDate,
    /// Interval in whole days; always >= 1 for parsed rules.
    pub frequency: u32,
}

/// Calendar exceptions suppressing otherwise-due occurrences
///
/// An empty rule (`weekends == false`, no skip days) matches nothing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExclusionRule {
    #[serde(default)]
    pub weekends: bool,
    #[serde(default)]
    pub skip_days: Vec<SkipDay>,
}

impl ExclusionRule {
    pub fn is_empty(&self) -> bool {
        !self.weekends && self.skip_days.is_empty()
    }
}

/// A stored reminder
///
/// `text` may contain `@name` / `@username` placeholders; they are
/// resolved at delivery time, not here. `datetime` is normalized to the
/// configured process zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// 0 until persisted.
    pub id: i64,
    pub chat_id: i64,
    pub text: String,
    pub datetime: DateTime<FixedOffset>,
    pub repetition: Frequency,
    pub excluded: ExclusionRule,
}
