//! Free-text notification template parsing and rendering
//!
//! Users submit reminders as a line-oriented template:
//!
//! ```text
//! ID: 11
//! Notification text: Everything is on daily, today it's fumbling @name, @username!
//! Date and time: 2023-04-06T14:00
//! Frequency: weekly
//! Exceptions:
//!   - Exclude Sat and Sun
//!   - Exclude days:
//!     * 2023-04-12 (every 7 days)
//! ```
//!
//! The ID line is only present when editing. Parsing is pure and
//! all-or-nothing per submission; any malformed line fails the whole
//! request with a [`ParseError`] naming the problem. [`render`] produces
//! the canonical form, which parses back to an equivalent model.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::fmt::Write as _;
use std::sync::OnceLock;
use thiserror::Error;

use super::{ExclusionRule, Frequency, Notification, SkipDay};

const TEXT_LABEL: &str = "Notification text:";
const DATETIME_LABEL: &str = "Date and time:";
const FREQUENCY_LABEL: &str = "Frequency:";
const EXCEPTIONS_LABEL: &str = "Exceptions:";
const WEEKENDS_MARKER: &str = "Exclude Sat and Sun";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation failure; the message text is what the user sees
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Cannot locate the notification ID. Copy the template and keep the ID line")]
    MissingId,
    #[error("Cannot locate the '{TEXT_LABEL}' line")]
    MissingText,
    #[error("Cannot locate the '{DATETIME_LABEL}' line")]
    MissingDateTime,
    #[error("Date and time '{0}' does not match the expected format yyyy-MM-ddTHH:mm")]
    BadDateTime(String),
    #[error(
        "Frequency '{0}' is not recognized. Valid values: once, minutely, hourly, daily, weekly, monthly, yearly"
    )]
    BadFrequency(String),
    #[error("Cannot locate the '{FREQUENCY_LABEL}' line")]
    MissingFrequency,
    #[error("Cannot parse exception line '{0}'. Expected: * yyyy-MM-dd (every N days)")]
    BadSkipDay(String),
}

/// Successful parse of a submitted template
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTemplate {
    /// Present when the submission carried an `ID:` line (edit flows).
    pub id: Option<i64>,
    pub text: String,
    pub datetime: DateTime<FixedOffset>,
    pub repetition: Frequency,
    pub excluded: ExclusionRule,
}

impl ParsedTemplate {
    /// Build an unsaved notification owned by `chat_id`.
    pub fn into_notification(self, chat_id: i64) -> Notification {
        Notification {
            id: 0,
            chat_id,
            text: self.text,
            datetime: self.datetime,
            repetition: self.repetition,
            excluded: self.excluded,
        }
    }
}

fn id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"ID:\s*(\d+)").expect("valid regex"))
}

fn skip_day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2})\s*\(every\s+(\d+)\s+days?\)$").expect("valid regex")
    })
}

/// Parse a submitted template, attaching `zone` to the zone-naive
/// date-time line
///
/// Pure; persistence is the caller's business. Returns the first error
/// encountered; nothing is partially applied.
pub fn parse(raw: &str, zone: FixedOffset) -> Result<ParsedTemplate, ParseError> {
    let id = id_re()
        .captures(raw)
        .and_then(|captures| captures[1].parse::<i64>().ok());

    let mut text = None;
    let mut datetime_raw = None;
    let mut frequency_raw = None;
    let mut in_exceptions = false;
    let mut excluded = ExclusionRule::default();

    for line in raw.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(TEXT_LABEL) {
            text = Some(rest.trim().to_string());
            in_exceptions = false;
        } else if let Some(rest) = line.strip_prefix(DATETIME_LABEL) {
            datetime_raw = Some(rest.trim().to_string());
            in_exceptions = false;
        } else if let Some(rest) = line.strip_prefix(FREQUENCY_LABEL) {
            frequency_raw = Some(rest.trim().to_string());
            in_exceptions = false;
        } else if line.starts_with(EXCEPTIONS_LABEL) {
            in_exceptions = true;
        } else if in_exceptions {
            if let Some(bullet) = line.strip_prefix('*') {
                excluded.skip_days.push(parse_skip_day(bullet.trim())?);
            } else if line.contains(WEEKENDS_MARKER) {
                excluded.weekends = true;
            }
            // other lines inside the section ("- Exclude days:") are markers
        }
    }

    let text = text.ok_or(ParseError::MissingText)?;
    let datetime_raw = datetime_raw.ok_or(ParseError::MissingDateTime)?;
    let frequency_raw = frequency_raw.ok_or(ParseError::MissingFrequency)?;

    let naive = NaiveDateTime::parse_from_str(&datetime_raw, DATETIME_FORMAT)
        .map_err(|_| ParseError::BadDateTime(datetime_raw.clone()))?;
    let datetime = naive
        .and_local_timezone(zone)
        .single()
        .ok_or_else(|| ParseError::BadDateTime(datetime_raw.clone()))?;

    let repetition =
        Frequency::parse(&frequency_raw).ok_or(ParseError::BadFrequency(frequency_raw))?;

    Ok(ParsedTemplate {
        id,
        text,
        datetime,
        repetition,
        excluded,
    })
}

fn parse_skip_day(bullet: &str) -> Result<SkipDay, ParseError> {
    let captures = skip_day_re()
        .captures(bullet)
        .ok_or_else(|| ParseError::BadSkipDay(bullet.to_string()))?;

    let day = NaiveDate::parse_from_str(&captures[1], DATE_FORMAT)
        .map_err(|_| ParseError::BadSkipDay(bullet.to_string()))?;
    let frequency: u32 = captures[2]
        .parse()
        .map_err(|_| ParseError::BadSkipDay(bullet.to_string()))?;
    if frequency == 0 {
        return Err(ParseError::BadSkipDay(bullet.to_string()));
    }

    Ok(SkipDay { day, frequency })
}

/// Canonical template rendering of a stored notification
///
/// This is both the list-view body and the copy-paste-edit starting
/// point; [`parse`] applied to it reproduces an equivalent model.
pub fn render(notification: &Notification, zone: FixedOffset) -> String {
    let mut out = String::new();
    let local = notification.datetime.with_timezone(&zone);

    let _ = writeln!(out, "{TEXT_LABEL} {}", notification.text);
    let _ = writeln!(out, "{DATETIME_LABEL} {}", local.format(DATETIME_FORMAT));
    let _ = writeln!(out, "{FREQUENCY_LABEL} {}", notification.repetition);

    if !notification.excluded.is_empty() {
        let _ = writeln!(out, "{EXCEPTIONS_LABEL}");
        if notification.excluded.weekends {
            let _ = writeln!(out, "  - {WEEKENDS_MARKER}");
        }
        if !notification.excluded.skip_days.is_empty() {
            let _ = writeln!(out, "  - Exclude days:");
            for skip in &notification.excluded.skip_days {
                let _ = writeln!(
                    out,
                    "    * {} (every {} days)",
                    skip.day.format(DATE_FORMAT),
                    skip.frequency
                );
            }
        }
    }

    out
}

/// Canonical rendering with the leading `ID:` line (edit templates)
pub fn render_with_id(notification: &Notification, zone: FixedOffset) -> String {
    format!("ID: {}\n{}", notification.id, render(notification, zone))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    const FULL_TEMPLATE: &str = "\
Notification text: Everything is on daily, today it's fumbling @name, @username!
Date and time: 2023-04-06T14:00
Frequency: weekly
Exceptions:
  - Exclude Sat and Sun
  - Exclude days:
    * 2023-04-12 (every 7 days)
    * 2023-04-24 (every 21 days)";

    #[test]
    fn test_parse_full_template() {
        let parsed = parse(FULL_TEMPLATE, zone()).unwrap();

        assert_eq!(parsed.id, None);
        assert_eq!(
            parsed.text,
            "Everything is on daily, today it's fumbling @name, @username!"
        );
        assert_eq!(parsed.repetition, Frequency::Weekly);
        assert_eq!(parsed.datetime.offset().local_minus_utc(), 3 * 3600);
        assert_eq!(
            parsed.datetime.naive_local(),
            NaiveDateTime::parse_from_str("2023-04-06T14:00", DATETIME_FORMAT).unwrap()
        );
        assert!(parsed.excluded.weekends);
        assert_eq!(parsed.excluded.skip_days.len(), 2);
        assert_eq!(parsed.excluded.skip_days[1].frequency, 21);
    }

    #[test]
    fn test_parse_captures_id_line() {
        let raw = format!("ID: 11\n{FULL_TEMPLATE}");
        let parsed = parse(&raw, zone()).unwrap();
        assert_eq!(parsed.id, Some(11));
    }

    #[test]
    fn test_missing_exceptions_section_means_no_exclusions() {
        let raw = "Notification text: standup\nDate and time: 2023-04-06T14:00\nFrequency: daily";
        let parsed = parse(raw, zone()).unwrap();
        assert!(parsed.excluded.is_empty());
    }

    #[test]
    fn test_malformed_frequency_fails_whole_parse() {
        let raw =
            "Notification text: standup\nDate and time: 2023-04-06T14:00\nFrequency: sometimes";
        assert_eq!(
            parse(raw, zone()),
            Err(ParseError::BadFrequency("sometimes".to_string()))
        );
    }

    #[test]
    fn test_malformed_datetime_names_expected_format() {
        let raw = "Notification text: standup\nDate and time: 06.04.2023 14:00\nFrequency: daily";
        let err = parse(raw, zone()).unwrap_err();
        assert!(matches!(err, ParseError::BadDateTime(_)));
        assert!(err.to_string().contains("yyyy-MM-ddTHH:mm"));
    }

    #[test]
    fn test_malformed_skip_day_aborts_everything() {
        let raw = "\
Notification text: standup
Date and time: 2023-04-06T14:00
Frequency: daily
Exceptions:
  - Exclude days:
    * 2023-04-12 (every 7 days)
    * next tuesday";
        let err = parse(raw, zone()).unwrap_err();
        assert_eq!(err, ParseError::BadSkipDay("next tuesday".to_string()));
    }

    #[test]
    fn test_zero_day_interval_is_rejected() {
        let raw = "\
Notification text: standup
Date and time: 2023-04-06T14:00
Frequency: daily
Exceptions:
  - Exclude days:
    * 2023-04-12 (every 0 days)";
        assert!(matches!(
            parse(raw, zone()),
            Err(ParseError::BadSkipDay(_))
        ));
    }

    #[test]
    fn test_impossible_calendar_date_is_rejected() {
        let raw = "\
Notification text: standup
Date and time: 2023-04-06T14:00
Frequency: daily
Exceptions:
  - Exclude days:
    * 2023-13-40 (every 7 days)";
        assert!(matches!(
            parse(raw, zone()),
            Err(ParseError::BadSkipDay(_))
        ));
    }

    #[test]
    fn test_missing_text_line() {
        let raw = "Date and time: 2023-04-06T14:00\nFrequency: daily";
        assert_eq!(parse(raw, zone()), Err(ParseError::MissingText));
    }

    #[test]
    fn test_render_parse_round_trip() {
        let parsed = parse(FULL_TEMPLATE, zone()).unwrap();
        let notification = parsed.clone().into_notification(-100);

        let rendered = render(&notification, zone());
        let reparsed = parse(&rendered, zone()).unwrap();

        assert_eq!(reparsed.text, parsed.text);
        assert_eq!(reparsed.datetime, parsed.datetime);
        assert_eq!(reparsed.repetition, parsed.repetition);
        assert_eq!(reparsed.excluded, parsed.excluded);
    }

    #[test]
    fn test_render_with_id_round_trips_the_id() {
        let mut notification = parse(FULL_TEMPLATE, zone()).unwrap().into_notification(-100);
        notification.id = 42;

        let reparsed = parse(&render_with_id(&notification, zone()), zone()).unwrap();
        assert_eq!(reparsed.id, Some(42));
    }

    #[test]
    fn test_render_omits_empty_exceptions() {
        let raw = "Notification text: standup\nDate and time: 2023-04-06T14:00\nFrequency: daily";
        let notification = parse(raw, zone()).unwrap().into_notification(-100);
        assert!(!render(&notification, zone()).contains(EXCEPTIONS_LABEL));
    }
}
