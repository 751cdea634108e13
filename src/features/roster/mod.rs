//! # Roster Feature
//!
//! Per-chat participant roster: batch text formats for add/edit, the
//! list view, and the winner lottery.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0
//! - **Toggleable**: false

use rand::seq::IndexedRandom;
use std::fmt::Write as _;

/// A lottery participant registered in a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// 0 until persisted.
    pub id: i64,
    pub chat_id: i64,
    pub name: String,
    /// Stored without the leading '@'.
    pub username: String,
    pub has_won: bool,
}

/// Parse roster-add lines: `Name,@username`, one per line
///
/// Malformed lines are skipped; batch text input is lenient throughout.
pub fn parse_add_lines(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let (name, username) = line.split_once(',')?;
            let name = name.trim();
            let username = username.trim().trim_start_matches('@');
            if name.is_empty() || username.is_empty() {
                return None;
            }
            Some((name.to_string(), username.to_string()))
        })
        .collect()
}

/// Parse roster-edit lines: `id,name,username`, one per line
pub fn parse_edit_lines(text: &str) -> Vec<(i64, String, String)> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.splitn(3, ',');
            let id = fields.next()?.trim().parse::<i64>().ok()?;
            let name = fields.next()?.trim();
            let username = fields.next()?.trim().trim_start_matches('@');
            if name.is_empty() || username.is_empty() {
                return None;
            }
            Some((id, name.to_string(), username.to_string()))
        })
        .collect()
}

/// Parse deletion batches: one integer id per line, non-integers skipped
pub fn parse_id_lines(text: &str) -> Vec<i64> {
    text.lines()
        .filter_map(|line| line.trim().parse::<i64>().ok())
        .collect()
}

/// Uniform pick among participants that have not won yet
pub fn draw_winner(participants: &[Participant]) -> Option<&Participant> {
    let eligible: Vec<&Participant> = participants.iter().filter(|p| !p.has_won).collect();
    eligible.choose(&mut rand::rng()).copied()
}

/// Plain-text roster list view
///
/// `show_ids` is on for the edit flows, off for `/showusers`.
pub fn render_roster(participants: &[Participant], show_ids: bool) -> String {
    if participants.is_empty() {
        return "There are no participants in this chat".to_string();
    }

    let mut out = String::from("Participants in this chat:\n\n");
    for participant in participants {
        if show_ids {
            let _ = writeln!(out, "ID: {}", participant.id);
        }
        let _ = writeln!(out, "Name: {}", participant.name);
        let _ = writeln!(out, "Username: @{}", participant.username);
        let _ = writeln!(
            out,
            "Won: {}",
            if participant.has_won { "yes" } else { "no" }
        );
        out.push('\n');
    }
    out
}
