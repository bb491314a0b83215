//! Match resolution and the ceiling-connectivity sweep.
//!
//! Both walks are iterative flood fills over the lattice neighbor relation
//! with an explicit queue and visited set, so the recursion depth never
//! depends on grid size.

use bevy::prelude::*;
use std::collections::{HashSet, VecDeque};

use super::{
    bubble::BubbleColor,
    grid::BubbleGrid,
    lattice::GridCoord,
    projectile::{BubbleLanded, ProjectileSystems},
};
use crate::{PausableSystems, audio::sound_effect, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    app.add_message::<GroupCleared>();
    app.add_message::<AttachedWithoutMatch>();
    app.add_message::<FloatersDropped>();

    // Resolution reads the landing the projectile systems produced this tick.
    app.configure_sets(Update, ClusterSystems.after(ProjectileSystems));

    app.add_systems(
        Update,
        (resolve_match, sweep_floaters)
            .chain()
            .in_set(PausableSystems)
            .in_set(ClusterSystems)
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// System set for match/sweep resolution.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterSystems;

/// Minimum connected same-color group that clears.
const MIN_GROUP_SIZE: usize = 3;

/// A same-color group of three or more was cleared.
#[derive(Message, Debug, Clone)]
pub struct GroupCleared {
    pub color: BubbleColor,
    pub count: usize,
}

/// A projectile settled without forming a group. Only consumed as an audio
/// cue, but part of the attach contract.
#[derive(Message, Debug, Clone)]
pub struct AttachedWithoutMatch {
    pub coord: GridCoord,
}

/// Bubbles with no colored path to row 0 were dropped by the sweep.
#[derive(Message, Debug, Clone)]
pub struct FloatersDropped {
    pub count: usize,
}

/// The connected group of `color` cells containing `start`.
///
/// `start` itself is always included (the caller just settled it there and
/// knows its color); the walk then spreads through same-colored neighbors
/// only. Empty cells and other colors are never entered, and the visited set
/// guarantees each cell is inspected at most once.
pub fn find_group(grid: &BubbleGrid, start: GridCoord, color: BubbleColor) -> Vec<GridCoord> {
    let mut group = vec![start];
    let mut visited: HashSet<GridCoord> = HashSet::from([start]);
    let mut queue: VecDeque<GridCoord> = start.neighbors().collect();
    visited.extend(queue.iter().copied());

    while let Some(coord) = queue.pop_front() {
        if grid.color(coord) != Some(color) {
            continue;
        }
        group.push(coord);
        for neighbor in coord.neighbors() {
            if visited.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }
    }

    group
}

/// All colored cells reachable from the colored cells of row 0.
///
/// A single seed-and-mark pass is enough: the lattice does not change while
/// the sweep runs.
pub fn anchored_cells(grid: &BubbleGrid) -> HashSet<GridCoord> {
    let mut anchored: HashSet<GridCoord> = HashSet::new();
    let mut queue: VecDeque<GridCoord> = VecDeque::new();

    for coord in grid.top_row_colored() {
        anchored.insert(coord);
        queue.push_back(coord);
    }

    while let Some(coord) = queue.pop_front() {
        for neighbor in coord.neighbors() {
            if grid.is_colored(neighbor) && anchored.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }
    }

    anchored
}

/// Colored cells the sweep would drop, in row-major order.
pub fn floating_cells(grid: &BubbleGrid) -> Vec<GridCoord> {
    let anchored = anchored_cells(grid);
    grid.colored_coords()
        .filter(|coord| !anchored.contains(coord))
        .collect()
}

/// Pop the group around each freshly settled bubble.
fn resolve_match(
    mut commands: Commands,
    mut grid: ResMut<BubbleGrid>,
    asset_server: Res<AssetServer>,
    mut landed: MessageReader<BubbleLanded>,
    mut cleared: MessageWriter<GroupCleared>,
    mut no_match: MessageWriter<AttachedWithoutMatch>,
) {
    for landing in landed.read() {
        let group = find_group(&grid, landing.coord, landing.color);

        if group.len() >= MIN_GROUP_SIZE {
            info!(
                "cleared {} {:?} bubbles around {}",
                group.len(),
                landing.color,
                landing.coord
            );
            for &coord in &group {
                if let Some(entity) = grid.clear_cell(coord) {
                    commands.entity(entity).despawn();
                }
            }
            cleared.write(GroupCleared {
                color: landing.color,
                count: group.len(),
            });
            commands.spawn(sound_effect(asset_server.load("audio/sound_effects/match.ogg")));
        } else {
            no_match.write(AttachedWithoutMatch {
                coord: landing.coord,
            });
            commands.spawn(sound_effect(asset_server.load("audio/sound_effects/attach.ogg")));
        }
    }
}

/// Drop everything that lost its path to the ceiling.
///
/// Runs after every landing, not only after a pop: a settle can also be the
/// moment a save-file board with pre-floating bubbles gets tidied up.
fn sweep_floaters(
    mut commands: Commands,
    mut grid: ResMut<BubbleGrid>,
    mut landed: MessageReader<BubbleLanded>,
    mut dropped: MessageWriter<FloatersDropped>,
) {
    let mut settled_this_tick = false;
    for _ in landed.read() {
        settled_this_tick = true;
    }
    if !settled_this_tick {
        return;
    }

    let floating = floating_cells(&grid);
    if floating.is_empty() {
        return;
    }

    info!("dropping {} floating bubbles", floating.len());
    for &coord in &floating {
        if let Some(entity) = grid.clear_cell(coord) {
            commands.entity(entity).despawn();
        }
    }
    dropped.write(FloatersDropped {
        count: floating.len(),
    });
}
