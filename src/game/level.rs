//! Level scripts and round setup.
//!
//! Adventure levels are JSON files shipped under `assets/levels/`: an ordered
//! list of color ids to launch plus an optional starting board. Anything that
//! fails to load degrades to quick-play style random generation; a broken
//! level file never kills the round.

use bevy::prelude::*;
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use super::{
    bubble::{BubbleColor, spawn_bubble},
    grid::BubbleGrid,
    lattice::{GridCoord, columns_in_row},
    save,
};
use crate::screens::Screen;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<GameMode>();
    app.init_resource::<LaunchQueue>();

    app.add_systems(OnEnter(Screen::Gameplay), setup_round);
}

/// Rows pre-filled with random bubbles in a quick-play round.
const INITIAL_ROWS: i32 = 5;

/// How the current round was started. Set by the title screen before
/// entering gameplay.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameMode {
    /// Endless random board and launch colors.
    #[default]
    QuickPlay,
    /// Scripted level: prescribed board and a finite launch sequence.
    Adventure { level: u32 },
}

/// On-disk shape of a level file. Field names match the original level
/// format so existing level packs keep working.
#[derive(Debug, Deserialize)]
pub struct LevelScript {
    #[serde(rename = "bubblesToLaunch")]
    pub bubbles_to_launch: Vec<u8>,
    #[serde(rename = "initialBoard", default)]
    pub initial_board: Option<Vec<Vec<u8>>>,
}

/// Where the `assets/` directory lives at runtime: the Bevy asset-root
/// override if set, the manifest directory under cargo, otherwise next to
/// the deployed executable.
fn assets_root() -> PathBuf {
    if let Ok(root) = std::env::var("BEVY_ASSET_ROOT") {
        return PathBuf::from(root);
    }
    if let Ok(manifest) = std::env::var("CARGO_MANIFEST_DIR") {
        return PathBuf::from(manifest);
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn level_path(level: u32) -> PathBuf {
    assets_root()
        .join("assets/levels")
        .join(format!("level{level}.json"))
}

/// Load a level script, or `None` when the file is missing or malformed.
pub fn load_level(level: u32) -> Option<LevelScript> {
    let path = level_path(level);
    let json = match std::fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) => {
            warn!("could not read level file {path:?}: {e}");
            return None;
        }
    };
    match serde_json::from_str(&json) {
        Ok(script) => Some(script),
        Err(e) => {
            warn!("could not parse level file {path:?}: {e}");
            None
        }
    }
}

/// The source of launch colors for the round.
///
/// Scripted rounds consume a finite queue front to back; quick-play rounds
/// pre-roll one color of lookahead so the next bubble can be previewed.
/// Either way [`LaunchQueue::consume`] is called exactly once per settled
/// projectile: a projectile that times out or leaves the playfield is
/// relaunched with the same color.
#[derive(Resource, Debug)]
pub enum LaunchQueue {
    Scripted(VecDeque<BubbleColor>),
    Random {
        current: BubbleColor,
        next: BubbleColor,
    },
}

impl Default for LaunchQueue {
    fn default() -> Self {
        Self::random()
    }
}

impl LaunchQueue {
    pub fn scripted(colors: impl IntoIterator<Item = BubbleColor>) -> Self {
        Self::Scripted(colors.into_iter().collect())
    }

    pub fn random() -> Self {
        Self::Random {
            current: BubbleColor::random(),
            next: BubbleColor::random(),
        }
    }

    /// Color of the bubble currently loaded in the shooter. `None` once a
    /// scripted queue is exhausted.
    pub fn current(&self) -> Option<BubbleColor> {
        match self {
            Self::Scripted(queue) => queue.front().copied(),
            Self::Random { current, .. } => Some(*current),
        }
    }

    /// Color that will be loaded after the current one settles.
    pub fn preview(&self) -> Option<BubbleColor> {
        match self {
            Self::Scripted(queue) => queue.get(1).copied(),
            Self::Random { next, .. } => Some(*next),
        }
    }

    /// Advance past the current color. Called when a projectile settles.
    pub fn consume(&mut self) {
        match self {
            Self::Scripted(queue) => {
                queue.pop_front();
            }
            Self::Random { current, next } => {
                *current = *next;
                *next = BubbleColor::random();
            }
        }
    }

    /// A scripted queue with nothing left to launch.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Scripted(queue) if queue.is_empty())
    }

    /// Remaining colors as level-file ids, for the persistence collaborator.
    pub fn remaining_ids(&self) -> Vec<u8> {
        match self {
            Self::Scripted(queue) => queue.iter().map(|c| c.id()).collect(),
            Self::Random { .. } => Vec::new(),
        }
    }
}

/// Build the board and launch queue for a fresh round.
///
/// Adventure prefers a saved in-progress round, then the level file, then
/// degrades to quick-play generation.
fn setup_round(
    mut commands: Commands,
    mut grid: ResMut<BubbleGrid>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mode: Res<GameMode>,
) {
    grid.reset();

    let queue = match *mode {
        GameMode::Adventure { level } => {
            // A saved round only resumes the level it was saved from.
            if let Some(snapshot) = save::load_round().filter(|s| s.level == level) {
                info!("resuming saved round for level {level}");
                save::clear_saved_round();
                grid.import_snapshot(&snapshot.board);
                LaunchQueue::scripted(
                    snapshot
                        .bubbles_to_launch
                        .iter()
                        .filter_map(|&id| BubbleColor::from_id(id)),
                )
            } else if let Some(script) = load_level(level) {
                info!("starting adventure level {level}");
                if let Some(board) = &script.initial_board {
                    grid.import_snapshot(board);
                }
                let colors: Vec<BubbleColor> = script
                    .bubbles_to_launch
                    .iter()
                    .filter_map(|&id| BubbleColor::from_id(id))
                    .collect();
                if colors.is_empty() {
                    warn!("level {level} has no launchable colors, using random generation");
                    LaunchQueue::random()
                } else {
                    LaunchQueue::scripted(colors)
                }
            } else {
                warn!("level {level} unavailable, falling back to quick play");
                fill_random_rows(&mut grid);
                LaunchQueue::random()
            }
        }
        GameMode::QuickPlay => {
            info!("starting quick play round");
            fill_random_rows(&mut grid);
            LaunchQueue::random()
        }
    };
    commands.insert_resource(queue);

    // Spawn the visual bodies for whatever the board ended up holding.
    let colored: Vec<GridCoord> = grid.colored_coords().collect();
    for coord in colored {
        let Some(color) = grid.color(coord) else {
            continue;
        };
        let entity = spawn_bubble(&mut commands, &mut meshes, &mut materials, coord, color);
        grid.set_entity(coord, entity);
    }
    info!("round starts with {} bubbles", grid.colored_count());
}

/// Fill the top rows with random colors, quick-play style.
fn fill_random_rows(grid: &mut BubbleGrid) {
    for row in 0..INITIAL_ROWS {
        for col in 0..columns_in_row(row) {
            grid.set_color(GridCoord::new(row, col), BubbleColor::random());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_queue_consumes_front_to_back() {
        let mut queue =
            LaunchQueue::scripted([BubbleColor::Red, BubbleColor::Blue, BubbleColor::Gray]);
        assert_eq!(queue.current(), Some(BubbleColor::Red));
        assert_eq!(queue.preview(), Some(BubbleColor::Blue));

        queue.consume();
        assert_eq!(queue.current(), Some(BubbleColor::Blue));
        assert_eq!(queue.preview(), Some(BubbleColor::Gray));

        queue.consume();
        queue.consume();
        assert_eq!(queue.current(), None);
        assert!(queue.is_exhausted());
    }

    #[test]
    fn random_queue_never_runs_dry() {
        let mut queue = LaunchQueue::random();
        for _ in 0..100 {
            assert!(queue.current().is_some());
            assert!(queue.preview().is_some());
            queue.consume();
        }
        assert!(!queue.is_exhausted());
    }

    #[test]
    fn random_queue_promotes_the_preview() {
        let mut queue = LaunchQueue::random();
        let previewed = queue.preview().unwrap();
        queue.consume();
        assert_eq!(queue.current(), Some(previewed));
    }

    #[test]
    fn level_script_parses_the_original_format() {
        let json = r#"{
            "bubblesToLaunch": [1, 2, 3, 4, 5, 1],
            "initialBoard": [[1, 1, 0], [0, 2, 0]]
        }"#;
        let script: LevelScript = serde_json::from_str(json).unwrap();
        assert_eq!(script.bubbles_to_launch.len(), 6);
        assert_eq!(script.initial_board.as_ref().unwrap()[1][1], 2);
    }

    #[test]
    fn level_script_board_is_optional() {
        let script: LevelScript = serde_json::from_str(r#"{"bubblesToLaunch": [3]}"#).unwrap();
        assert!(script.initial_board.is_none());
    }

    #[test]
    fn missing_level_degrades_to_none() {
        assert!(load_level(9999).is_none());
    }

    #[test]
    fn shipped_level_resolves_at_runtime() {
        // `level_path` consults the environment at runtime, not compile
        // time, so a deployed binary can find its levels too. Under cargo
        // that resolves to the source tree's assets.
        let script = load_level(1).expect("level1.json should ship with the game");
        assert!(!script.bubbles_to_launch.is_empty());
        assert!(script.initial_board.is_some());
    }
}
