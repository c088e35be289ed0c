//! Utility functions for the ladder

use crate::types::{GameId, GameOutcome, Komi, PlayerColor};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

/// Generate a new unique game ID
pub fn generate_game_id() -> GameId {
    Uuid::new_v4()
}

/// Generate a new unique player ID
pub fn generate_player_id() -> String {
    Uuid::new_v4().to_string()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

fn script_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid script pattern")
    })
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"))
}

/// Strip script blocks and markup from free-text game notes
///
/// The result is trimmed and cut to at most `max_chars` characters. Returns
/// `None` when nothing is left.
pub fn sanitize_notes(notes: &str, max_chars: usize) -> Option<String> {
    let without_scripts = script_pattern().replace_all(notes, "");
    let without_tags = tag_pattern().replace_all(&without_scripts, "");
    let trimmed: String = without_tags.trim().chars().take(max_chars).collect();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Hint shown under a reverse komi, e.g. "Black gets 5.5 points"
pub fn reverse_komi_hint(komi: Komi) -> Option<String> {
    komi.is_reverse()
        .then(|| format!("Black gets {} points", komi.value().abs()))
}

/// Human-readable result line such as "Won as black"
pub fn format_game_result(result: GameOutcome, color: PlayerColor) -> String {
    match result {
        GameOutcome::Draw => "Draw".to_string(),
        GameOutcome::Win => format!("Won as {}", color),
        GameOutcome::Loss => format!("Lost as {}", color),
    }
}
