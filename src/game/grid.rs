//! Fixed-size bubble storage for one round.
//!
//! Every lattice cell exists for the whole round; an empty cell is a cell
//! whose color is `None`, not a missing slot. Addressing a cell that is not
//! on the lattice is a bug in the caller and panics instead of clamping,
//! because a clamped index would silently corrupt the lattice.

use bevy::prelude::*;
use std::collections::HashMap;

use super::bubble::BubbleColor;
use super::lattice::{COLUMNS, GridCoord, TOTAL_ROWS, all_coords, columns_in_row};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<BubbleGrid>();
}

/// One lattice slot. The highlight flag is cosmetic (hex outline overlay)
/// and never read by game logic.
#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    color: Option<BubbleColor>,
    highlighted: bool,
}

/// The lattice contents plus the entity bodies that mirror them.
///
/// Colors are authoritative here; the entity map only exists so that clearing
/// a cell can also despawn its visual body.
#[derive(Resource)]
pub struct BubbleGrid {
    cells: [[Cell; COLUMNS as usize]; TOTAL_ROWS as usize],
    entities: HashMap<GridCoord, Entity>,
}

impl Default for BubbleGrid {
    fn default() -> Self {
        Self {
            cells: [[Cell::default(); COLUMNS as usize]; TOTAL_ROWS as usize],
            entities: HashMap::new(),
        }
    }
}

impl BubbleGrid {
    fn cell(&self, coord: GridCoord) -> &Cell {
        assert!(coord.in_bounds(), "lattice access out of range: {coord}");
        &self.cells[coord.row as usize][coord.col as usize]
    }

    fn cell_mut(&mut self, coord: GridCoord) -> &mut Cell {
        assert!(coord.in_bounds(), "lattice access out of range: {coord}");
        &mut self.cells[coord.row as usize][coord.col as usize]
    }

    pub fn color(&self, coord: GridCoord) -> Option<BubbleColor> {
        self.cell(coord).color
    }

    pub fn is_colored(&self, coord: GridCoord) -> bool {
        self.color(coord).is_some()
    }

    pub fn set_color(&mut self, coord: GridCoord, color: BubbleColor) {
        self.cell_mut(coord).color = Some(color);
    }

    /// Empty a cell, returning the entity body that was tracking it (if any)
    /// so the caller can despawn it.
    pub fn clear_cell(&mut self, coord: GridCoord) -> Option<Entity> {
        self.cell_mut(coord).color = None;
        self.entities.remove(&coord)
    }

    pub fn set_entity(&mut self, coord: GridCoord, entity: Entity) {
        self.entities.insert(coord, entity);
    }

    pub fn is_highlighted(&self, coord: GridCoord) -> bool {
        self.cell(coord).highlighted
    }

    /// Flip the cosmetic highlight flag on every cell.
    pub fn set_highlight_all(&mut self, highlighted: bool) {
        for coord in all_coords() {
            self.cell_mut(coord).highlighted = highlighted;
        }
    }

    /// Reset to an empty lattice. Entity bodies are despawned separately via
    /// `DespawnOnExit`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// All colored cells in row-major order. The collision scan relies on
    /// this order for its first-hit tie-break.
    pub fn colored_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        all_coords().filter(|&coord| self.is_colored(coord))
    }

    pub fn colored_count(&self) -> usize {
        self.colored_coords().count()
    }

    /// Colored cells of row 0. These anchor the ceiling-connectivity sweep,
    /// and the round is won once this is empty.
    pub fn top_row_colored(&self) -> Vec<GridCoord> {
        (0..columns_in_row(0))
            .map(|col| GridCoord::new(0, col))
            .filter(|&coord| self.is_colored(coord))
            .collect()
    }

    /// The empty in-bounds cell nearest to a world position.
    ///
    /// Starts at the cell under the position and widens ring by ring over the
    /// neighbor relation. The lattice is finite, so the search always
    /// terminates.
    pub fn closest_empty_cell(&self, world_pos: Vec2) -> Option<GridCoord> {
        let target = Self::clamp_to_lattice(GridCoord::from_pixel(world_pos));
        if !self.is_colored(target) {
            return Some(target);
        }

        let mut checked = std::collections::HashSet::new();
        let mut ring = vec![target];
        checked.insert(target);

        while !ring.is_empty() {
            let mut next_ring = Vec::new();
            for coord in ring {
                if !self.is_colored(coord) {
                    return Some(coord);
                }
                for neighbor in coord.neighbors() {
                    if checked.insert(neighbor) {
                        next_ring.push(neighbor);
                    }
                }
            }
            ring = next_ring;
        }

        None
    }

    /// The empty row-0 cell nearest to a horizontal position. Used when a
    /// projectile reaches the ceiling without touching any bubble.
    pub fn nearest_empty_top_cell(&self, x: f32) -> Option<GridCoord> {
        let ideal = Self::clamp_to_lattice(GridCoord::from_pixel(Vec2::new(
            x,
            super::lattice::GRID_ORIGIN_Y,
        )));
        (0..columns_in_row(0))
            .map(|col| GridCoord::new(0, col))
            .filter(|&coord| !self.is_colored(coord))
            .min_by_key(|coord| (coord.col - ideal.col).abs())
    }

    fn clamp_to_lattice(coord: GridCoord) -> GridCoord {
        let row = coord.row.clamp(0, TOTAL_ROWS - 1);
        let col = coord.col.clamp(0, columns_in_row(row) - 1);
        GridCoord::new(row, col)
    }

    /// Export the lattice as the integer grid the persistence collaborator
    /// expects: one entry per array slot, `0` for empty.
    pub fn export_snapshot(&self) -> Vec<Vec<u8>> {
        (0..TOTAL_ROWS)
            .map(|row| {
                (0..COLUMNS)
                    .map(|col| {
                        let coord = GridCoord::new(row, col);
                        if !coord.in_bounds() {
                            return 0;
                        }
                        self.color(coord).map_or(0, BubbleColor::id)
                    })
                    .collect()
            })
            .collect()
    }

    /// Rebuild lattice colors from an integer grid. Oversized boards and
    /// unknown color identifiers are data errors and degrade to empty cells
    /// with a warning rather than failing the round.
    pub fn import_snapshot(&mut self, board: &[Vec<u8>]) {
        self.reset();
        if board.len() > TOTAL_ROWS as usize {
            warn!(
                "board snapshot has {} rows, keeping the first {TOTAL_ROWS}",
                board.len()
            );
        }
        for (row, ids) in board.iter().take(TOTAL_ROWS as usize).enumerate() {
            for (col, &id) in ids.iter().take(COLUMNS as usize).enumerate() {
                if id == 0 {
                    continue;
                }
                let coord = GridCoord::new(row as i32, col as i32);
                if !coord.in_bounds() {
                    warn!("board snapshot colors unusable slot {coord}, ignoring");
                    continue;
                }
                match BubbleColor::from_id(id) {
                    Some(color) => self.set_color(coord, color),
                    None => warn!("board snapshot has unknown color id {id} at {coord}, ignoring"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cell_is_a_slot_not_a_hole() {
        let mut grid = BubbleGrid::default();
        let coord = GridCoord::new(3, 3);
        assert_eq!(grid.color(coord), None);
        grid.set_color(coord, BubbleColor::Red);
        grid.clear_cell(coord);
        // The slot is still addressable after clearing.
        assert_eq!(grid.color(coord), None);
    }

    #[test]
    #[should_panic(expected = "lattice access out of range")]
    fn out_of_range_access_is_fatal() {
        let grid = BubbleGrid::default();
        grid.color(GridCoord::new(TOTAL_ROWS, 0));
    }

    #[test]
    #[should_panic(expected = "lattice access out of range")]
    fn odd_row_last_column_is_not_addressable() {
        let grid = BubbleGrid::default();
        grid.color(GridCoord::new(1, COLUMNS - 1));
    }

    #[test]
    fn snapshot_roundtrip() {
        let mut grid = BubbleGrid::default();
        grid.set_color(GridCoord::new(0, 0), BubbleColor::Red);
        grid.set_color(GridCoord::new(1, 4), BubbleColor::Gray);
        grid.set_color(GridCoord::new(20, 9), BubbleColor::Blue);

        let snapshot = grid.export_snapshot();
        assert_eq!(snapshot.len(), TOTAL_ROWS as usize);
        assert!(snapshot.iter().all(|row| row.len() == COLUMNS as usize));
        assert_eq!(snapshot[0][0], BubbleColor::Red.id());
        assert_eq!(snapshot[1][4], BubbleColor::Gray.id());
        assert_eq!(snapshot[0][1], 0);

        let mut reloaded = BubbleGrid::default();
        reloaded.import_snapshot(&snapshot);
        assert_eq!(reloaded.export_snapshot(), snapshot);
    }

    #[test]
    fn import_ignores_unknown_ids() {
        let mut grid = BubbleGrid::default();
        grid.import_snapshot(&[vec![9, 1]]);
        assert_eq!(grid.color(GridCoord::new(0, 0)), None);
        assert_eq!(grid.color(GridCoord::new(0, 1)), Some(BubbleColor::Red));
    }

    #[test]
    fn closest_empty_cell_skips_occupied_target() {
        let mut grid = BubbleGrid::default();
        let target = GridCoord::new(0, 5);
        grid.set_color(target, BubbleColor::Green);

        let snapped = grid.closest_empty_cell(target.to_pixel()).unwrap();
        assert_ne!(snapped, target);
        assert!(target.neighbors().any(|n| n == snapped));
    }

    #[test]
    fn nearest_empty_top_cell_prefers_the_column_under_x() {
        let mut grid = BubbleGrid::default();
        let free = GridCoord::new(0, 3);
        assert_eq!(grid.nearest_empty_top_cell(free.to_pixel().x), Some(free));

        grid.set_color(free, BubbleColor::Red);
        let snapped = grid.nearest_empty_top_cell(free.to_pixel().x).unwrap();
        assert_eq!((snapped.col - free.col).abs(), 1);
    }
}
