//! High score persistence with Top 10 leaderboard.
//!
//! Scores are saved to a local JSON file in the user's data directory and
//! recorded automatically whenever a round ends.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use super::state::RoundOver;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<HighScores>();

    app.add_systems(Startup, load_high_scores);
    // Not gated on the gameplay screen: the round-over message is written in
    // the same frame the screen transitions away.
    app.add_systems(Update, record_round_score);
}

/// Maximum number of high scores to keep.
const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub score: u32,
    pub cleared_the_board: bool,
}

impl ScoreEntry {
    pub fn new(score: u32, cleared_the_board: bool) -> Self {
        Self {
            score,
            cleared_the_board,
        }
    }
}

/// Resource holding the top 10 high scores.
#[derive(Resource, Debug, Default, Serialize, Deserialize)]
pub struct HighScores {
    pub entries: Vec<ScoreEntry>,
}

impl HighScores {
    /// Check if a score would make it into the top 10.
    pub fn is_high_score(&self, score: u32) -> bool {
        score > 0
            && (self.entries.len() < MAX_HIGH_SCORES
                || self.entries.last().is_none_or(|lowest| score > lowest.score))
    }

    /// Add a new score to the leaderboard (if it qualifies).
    /// Returns true if the score was added.
    pub fn add_score(&mut self, entry: ScoreEntry) -> bool {
        if entry.score == 0 {
            return false;
        }

        // Entries are kept sorted descending; ties rank below existing
        // entries of the same score.
        let pos = self.entries.partition_point(|e| e.score >= entry.score);
        if pos >= MAX_HIGH_SCORES {
            return false;
        }

        self.entries.insert(pos, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        true
    }

    /// Get the file path for storing high scores.
    fn file_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("fruitburst").join("highscores.json"))
    }

    /// Load high scores from disk. Anything unreadable starts a fresh table.
    pub fn load() -> Self {
        let Some(path) = Self::file_path() else {
            warn!("Could not determine data directory for high scores");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }

        fs::read_to_string(&path)
            .map_err(|e| warn!("Failed to read high scores file: {e}"))
            .ok()
            .and_then(|contents| {
                serde_json::from_str(&contents)
                    .map_err(|e| warn!("Failed to parse high scores: {e}"))
                    .ok()
            })
            .unwrap_or_default()
    }

    /// Save high scores to disk. Failures are logged, never fatal.
    pub fn save(&self) {
        let Some(path) = Self::file_path() else {
            warn!("Could not determine data directory for saving high scores");
            return;
        };
        if let Some(parent) = path.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warn!("Failed to create high scores directory: {e}");
            return;
        }

        // Serializing a plain Vec of numbers and bools cannot fail.
        let json = match serde_json::to_string_pretty(self) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize high scores: {e}");
                return;
            }
        };
        if let Err(e) = fs::write(&path, json) {
            warn!("Failed to write high scores: {e}");
        }
    }
}

/// Load high scores on startup.
fn load_high_scores(mut high_scores: ResMut<HighScores>) {
    *high_scores = HighScores::load();
}

/// Record every finished round that qualifies for the table.
fn record_round_score(
    mut round_over: MessageReader<RoundOver>,
    mut high_scores: ResMut<HighScores>,
) {
    for message in round_over.read() {
        let entry = ScoreEntry::new(message.outcome.score(), message.outcome.is_victory());
        if high_scores.add_score(entry) {
            high_scores.save();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_scores_never_qualify() {
        let mut scores = HighScores::default();
        assert!(!scores.is_high_score(0));
        assert!(!scores.add_score(ScoreEntry::new(0, true)));
    }

    #[test]
    fn entries_stay_sorted_and_capped() {
        let mut scores = HighScores::default();
        for score in [30, 10, 20, 50, 40, 90, 60, 80, 70, 100] {
            assert!(scores.add_score(ScoreEntry::new(score, false)));
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries[0].score, 100);

        // Beats the lowest entry, pushing it out.
        assert!(scores.is_high_score(55));
        assert!(scores.add_score(ScoreEntry::new(55, true)));
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert!(scores.entries.iter().all(|e| e.score != 10));

        // Below the whole table once it is full.
        assert!(!scores.is_high_score(5));
        assert!(!scores.add_score(ScoreEntry::new(5, false)));
    }
}
