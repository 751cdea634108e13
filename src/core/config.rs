//! Process configuration loaded from the environment
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use anyhow::{Context, Result};
use chrono::FixedOffset;
use std::env;

/// Default SQLite database file
const DEFAULT_DATABASE_PATH: &str = "admin_notifier.db";
/// Default model for the assistant flow
const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Runtime configuration, read once at startup
///
/// All values come from environment variables (a `.env` file is honored
/// by the binary via dotenvy):
/// - `BOT_TIMEZONE` - fixed UTC offset such as `+03:00` (default `+00:00`)
/// - `DATABASE_PATH` - SQLite file path
/// - `OPENAI_KEY` / `OPENAI_MODEL` - assistant flow; the flow is disabled
///   when no key is configured
#[derive(Debug, Clone)]
pub struct Config {
    /// Zone attached to zone-naive date-times submitted by users and used
    /// when rendering stored instants back to them.
    pub timezone: FixedOffset,
    pub database_path: String,
    pub openai_model: String,
    pub openai_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let timezone = match env::var("BOT_TIMEZONE") {
            Ok(raw) => raw
                .parse::<FixedOffset>()
                .with_context(|| format!("BOT_TIMEZONE is not a valid UTC offset: {raw}"))?,
            Err(_) => FixedOffset::east_opt(0).expect("zero offset is valid"),
        };

        Ok(Config {
            timezone,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string()),
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),
            openai_key: env::var("OPENAI_KEY").ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_parses() {
        let offset: FixedOffset = "+03:00".parse().unwrap();
        assert_eq!(offset.local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn test_negative_offset_parses() {
        let offset: FixedOffset = "-05:00".parse().unwrap();
        assert_eq!(offset.local_minus_utc(), -5 * 3600);
    }
}
