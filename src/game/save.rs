//! Mid-round persistence for adventure rounds.
//!
//! Leaving an undecided adventure round writes a snapshot of the board and
//! the remaining launch queue to the user's data directory. The next entry
//! into adventure mode resumes from the snapshot instead of the level file.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use super::{
    grid::BubbleGrid,
    level::{GameMode, LaunchQueue},
    state::RoundPhase,
};
use crate::screens::Screen;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnExit(Screen::Gameplay), save_on_exit);
}

/// Everything needed to resume a round: which adventure level it belongs
/// to, cell color ids per row, and the colors still waiting to be launched,
/// in order. A snapshot only resumes the level it was saved from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSnapshot {
    /// Missing in files from before the field existed; `0` matches no level,
    /// so those saves are ignored.
    #[serde(default)]
    pub level: u32,
    pub board: Vec<Vec<u8>>,
    pub bubbles_to_launch: Vec<u8>,
}

fn file_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("fruitburst").join("saved_round.json"))
}

/// Load the saved round, if one exists and parses.
pub fn load_round() -> Option<RoundSnapshot> {
    let path = file_path()?;
    if !path.exists() {
        return None;
    }
    match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Failed to parse saved round: {}", e);
                None
            }
        },
        Err(e) => {
            warn!("Failed to read saved round file: {}", e);
            None
        }
    }
}

/// Write a snapshot, replacing any previous one.
pub fn save_round(snapshot: &RoundSnapshot) {
    let Some(path) = file_path() else {
        warn!("Could not determine data directory for the saved round");
        return;
    };

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create save directory: {}", e);
        return;
    }

    match serde_json::to_string_pretty(snapshot) {
        Ok(json) => match fs::write(&path, json) {
            Ok(()) => info!("Saved round to {:?}", path),
            Err(e) => warn!("Failed to write saved round: {}", e),
        },
        Err(e) => warn!("Failed to serialize saved round: {}", e),
    }
}

/// Delete the saved round. A resumed or finished round must not resurrect.
pub fn clear_saved_round() {
    let Some(path) = file_path() else {
        return;
    };
    if path.exists()
        && let Err(e) = fs::remove_file(&path)
    {
        warn!("Failed to remove saved round file: {}", e);
    }
}

/// Snapshot an undecided adventure round when the player leaves gameplay.
/// Decided rounds clear the save instead.
fn save_on_exit(
    mode: Res<GameMode>,
    phase: Res<RoundPhase>,
    grid: Res<BubbleGrid>,
    queue: Res<LaunchQueue>,
) {
    let GameMode::Adventure { level } = *mode else {
        return;
    };
    if phase.is_over() {
        clear_saved_round();
        return;
    }
    save_round(&RoundSnapshot {
        level,
        board: grid.export_snapshot(),
        bubbles_to_launch: queue.remaining_ids(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_round_trips_through_json() {
        let snapshot = RoundSnapshot {
            level: 2,
            board: vec![vec![1, 2, 0], vec![0, 5, 3]],
            bubbles_to_launch: vec![4, 4, 1],
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("bubblesToLaunch"));
        assert!(json.contains("\"level\":2"));
        let back: RoundSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.level, 2);
        assert_eq!(back.board, snapshot.board);
        assert_eq!(back.bubbles_to_launch, snapshot.bubbles_to_launch);
    }

    #[test]
    fn snapshot_without_a_level_matches_no_level() {
        let json = r#"{"board": [[1]], "bubblesToLaunch": [3]}"#;
        let back: RoundSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(back.level, 0);
    }
}
