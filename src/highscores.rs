//! High score leaderboard
//!
//! Tracks the top 10 runs. Storage is the host's business; the board only
//! imports and exports JSON.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Longest name kept on the board (in characters)
pub const MAX_NAME_LEN: usize = 12;

/// Name used when the player leaves it blank
pub const DEFAULT_NAME: &str = "Player";

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub name: String,
    pub score: u64,
    /// Height reached, in units
    pub height: u32,
}

impl HighScoreEntry {
    pub fn new(name: &str, score: u64, height: u32) -> Self {
        Self {
            name: normalize_name(name),
            score,
            height,
        }
    }

    /// Board order: higher score first, then higher climb
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then(other.height.cmp(&self.height))
    }
}

/// Trim, default when blank, cap the length
pub fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return DEFAULT_NAME.to_string();
    }
    trimmed.chars().take(MAX_NAME_LEN).collect()
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Import a board, repairing whatever can be repaired
    ///
    /// Rows that aren't objects are dropped, missing or malformed fields
    /// fall back to defaults, and the result is re-sorted and truncated.
    /// Unparseable input gives an empty board.
    pub fn from_json(json: &str) -> Self {
        let value: Value = match serde_json::from_str(json) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Ignoring unreadable high scores: {}", e);
                return Self::new();
            }
        };
        // Accept both a bare array and `{ "entries": [...] }`
        let rows = match value {
            Value::Array(rows) => rows,
            Value::Object(mut map) => match map.remove("entries") {
                Some(Value::Array(rows)) => rows,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        let mut entries: Vec<HighScoreEntry> = rows.iter().filter_map(entry_from_value).collect();
        entries.sort_by(HighScoreEntry::rank_cmp);
        entries.truncate(MAX_HIGH_SCORES);
        log::info!("Loaded {} high scores", entries.len());
        Self { entries }
    }

    pub fn to_json(&self) -> String {
        // A Vec of plain structs always serializes
        serde_json::to_string(&self.entries).unwrap_or_else(|_| "[]".to_string())
    }

    /// Check if a run qualifies for the leaderboard
    pub fn qualifies(&self, score: u64, height: u32) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        let candidate = HighScoreEntry::new("", score, height);
        self.entries
            .last()
            .is_none_or(|last| candidate.rank_cmp(last) == Ordering::Less)
    }

    /// Get the rank a run would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64, height: u32) -> Option<usize> {
        if !self.qualifies(score, height) {
            return None;
        }
        Some(self.insertion_point(&HighScoreEntry::new("", score, height)) + 1)
    }

    /// Add a run to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, name: &str, score: u64, height: u32) -> Option<usize> {
        if !self.qualifies(score, height) {
            return None;
        }

        let entry = HighScoreEntry::new(name, score, height);
        let pos = self.insertion_point(&entry);
        log::info!("New high score #{}: {} ({})", pos + 1, entry.score, entry.name);
        self.entries.insert(pos, entry);
        self.entries.truncate(MAX_HIGH_SCORES);

        Some(pos + 1)
    }

    /// Ties go after existing entries
    fn insertion_point(&self, entry: &HighScoreEntry) -> usize {
        self.entries
            .iter()
            .position(|e| entry.rank_cmp(e) == Ordering::Less)
            .unwrap_or(self.entries.len())
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

fn entry_from_value(value: &Value) -> Option<HighScoreEntry> {
    let row = value.as_object()?;
    let name = row.get("name").and_then(Value::as_str).unwrap_or("");
    let score = row.get("score").map_or(0, lenient_u64);
    let height = row
        .get("height")
        .map_or(0, lenient_u64)
        .min(u32::MAX as u64) as u32;
    Some(HighScoreEntry::new(name, score, height))
}

/// Non-negative integer from a number or numeric string; 0 otherwise
fn lenient_u64(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f.floor() as u64))
            .unwrap_or(0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .map_or(0, |f| lenient_u64(&Value::from(f))),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_board() -> HighScores {
        let mut board = HighScores::new();
        for i in 1..=10u64 {
            board.add_score("bear", i * 100, i as u32);
        }
        board
    }

    #[test]
    fn test_name_normalization() {
        assert_eq!(normalize_name("  Honey  "), "Honey");
        assert_eq!(normalize_name("   "), "Player");
        assert_eq!(normalize_name("ABCDEFGHIJKLMNOP"), "ABCDEFGHIJKL");
    }

    #[test]
    fn test_sorted_by_score_then_height() {
        let mut board = HighScores::new();
        assert_eq!(board.add_score("a", 500, 10), Some(1));
        assert_eq!(board.add_score("b", 500, 30), Some(1));
        assert_eq!(board.add_score("c", 900, 5), Some(1));
        assert_eq!(board.add_score("d", 500, 30), Some(3));
        let names: Vec<_> = board.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn test_qualification_on_full_board() {
        let mut board = full_board();
        assert!(!board.qualifies(0, 99));
        assert!(!board.qualifies(100, 1));
        assert!(board.qualifies(100, 2));
        assert_eq!(board.potential_rank(1000, 11), Some(1));
        assert_eq!(board.potential_rank(50, 50), None);

        assert_eq!(board.add_score("new", 550, 0), Some(6));
        assert_eq!(board.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(board.entries.last().map(|e| e.score), Some(200));
        assert_eq!(board.top_score(), Some(1000));
    }

    #[test]
    fn test_tolerant_import() {
        let json = r#"[
            {"name": "  Pooh  ", "score": 300, "height": 12},
            {"name": "", "score": "450", "height": -3},
            {"score": 120.7},
            "garbage",
            {"name": "ThisNameIsWayTooLong", "score": null}
        ]"#;
        let board = HighScores::from_json(json);
        assert_eq!(board.entries.len(), 4);
        assert_eq!(board.entries[0], HighScoreEntry::new("Player", 450, 0));
        assert_eq!(board.entries[1].name, "Pooh");
        assert_eq!(board.entries[2].score, 120);
        assert_eq!(board.entries[3].name, "ThisNameIsWa");
    }

    #[test]
    fn test_import_wrapped_and_broken() {
        let wrapped = r#"{"entries": [{"name": "x", "score": 5, "height": 1}]}"#;
        let board = HighScores::from_json(wrapped);
        assert_eq!(board.entries.len(), 1);
        assert!(HighScores::from_json("{not json").is_empty());
        assert!(HighScores::from_json("42").is_empty());
    }

    #[test]
    fn test_export_round_trip() {
        let board = full_board();
        assert_eq!(HighScores::from_json(&board.to_json()), board);
    }
}
