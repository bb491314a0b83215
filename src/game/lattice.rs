//! The hexagonal lattice the bubbles sit on.
//!
//! This is an offset layout rather than a true axial hex grid: every row is a
//! straight run of circles, and odd rows are pushed right by one bubble radius
//! so their circles nest into the gaps of the rows above and below. Rows are
//! packed slightly tighter than a full diameter, which is what makes the
//! nesting read as hexagonal on screen.
//!
//! A cell's pixel position is always derived from its `(row, col)` indices.
//! It is never stored separately, so lattice indices are the single source of
//! truth for where a bubble is.

use bevy::prelude::*;

/// Radius of every bubble, in world units.
pub const BUBBLE_RADIUS: f32 = 22.0;

/// Total rows in the lattice, playable or not.
pub const TOTAL_ROWS: i32 = 21;

/// Columns per even row. Odd rows are offset by one radius and fit one less.
pub const COLUMNS: i32 = 10;

/// First row at which a settled bubble loses the round.
pub const MAX_ALLOWED_ROW: i32 = 18;

/// Vertical distance between row centers. Rows overlap by a few units so the
/// circles pack like hexagons instead of stacking in a square grid.
pub const ROW_PITCH: f32 = BUBBLE_RADIUS * 2.0 - 6.0;

/// World X of the left playfield wall.
pub const LEFT_WALL: f32 = -(COLUMNS as f32) * BUBBLE_RADIUS;

/// World X of the right playfield wall.
pub const RIGHT_WALL: f32 = COLUMNS as f32 * BUBBLE_RADIUS;

/// World Y of the centers of row 0.
pub const GRID_ORIGIN_Y: f32 = 460.0;

/// World Y of the ceiling a projectile can snap to.
pub const TOP_WALL: f32 = GRID_ORIGIN_Y + BUBBLE_RADIUS;

/// World Y of the lose line. A colored cell whose circle reaches this line
/// ends the round, which by construction happens exactly at `MAX_ALLOWED_ROW`.
pub const LOSE_LINE_Y: f32 = GRID_ORIGIN_Y - MAX_ALLOWED_ROW as f32 * ROW_PITCH;

/// Number of usable columns in the given row.
pub const fn columns_in_row(row: i32) -> i32 {
    if row % 2 == 0 { COLUMNS } else { COLUMNS - 1 }
}

/// A lattice cell address.
///
/// `row` increases downward, `col` to the right. Valid rows are
/// `0..TOTAL_ROWS`; valid columns depend on row parity (odd rows hold one
/// bubble less because of the half-bubble shift).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Component, Reflect)]
#[reflect(Component)]
pub struct GridCoord {
    pub row: i32,
    pub col: i32,
}

impl GridCoord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Whether this address denotes a real cell.
    pub const fn in_bounds(&self) -> bool {
        self.row >= 0
            && self.row < TOTAL_ROWS
            && self.col >= 0
            && self.col < columns_in_row(self.row)
    }

    /// The up-to-six adjacent cells.
    ///
    /// Left/right and straight up/down are parity independent. The remaining
    /// two diagonals lean left (`col - 1`) on even rows and right (`col + 1`)
    /// on odd rows, mirroring the half-radius shift of odd rows. Addresses
    /// that fall off the lattice are omitted; there is no wraparound.
    pub fn neighbors(self) -> impl Iterator<Item = GridCoord> {
        let diag = if self.row % 2 == 0 { -1 } else { 1 };
        [
            GridCoord::new(self.row, self.col - 1),
            GridCoord::new(self.row, self.col + 1),
            GridCoord::new(self.row - 1, self.col),
            GridCoord::new(self.row + 1, self.col),
            GridCoord::new(self.row - 1, self.col + diag),
            GridCoord::new(self.row + 1, self.col + diag),
        ]
        .into_iter()
        .filter(GridCoord::in_bounds)
    }

    /// Center of this cell in world coordinates.
    pub fn to_pixel(&self) -> Vec2 {
        let row_shift = if self.row % 2 == 0 { 0.0 } else { BUBBLE_RADIUS };
        let x = LEFT_WALL + BUBBLE_RADIUS + self.col as f32 * BUBBLE_RADIUS * 2.0 + row_shift;
        let y = GRID_ORIGIN_Y - self.row as f32 * ROW_PITCH;
        Vec2::new(x, y)
    }

    /// The cell whose center is nearest to a world position.
    ///
    /// The result may be out of bounds for positions outside the playfield;
    /// callers that need a real cell go through
    /// [`BubbleGrid::closest_empty_cell`](super::grid::BubbleGrid::closest_empty_cell).
    pub fn from_pixel(pos: Vec2) -> Self {
        let row = ((GRID_ORIGIN_Y - pos.y) / ROW_PITCH).round() as i32;
        let row_shift = if row % 2 == 0 { 0.0 } else { BUBBLE_RADIUS };
        let col = ((pos.x - LEFT_WALL - BUBBLE_RADIUS - row_shift) / (BUBBLE_RADIUS * 2.0))
            .round() as i32;
        Self { row, col }
    }

    /// The six corner vertices of the hex outline drawn around a highlighted
    /// bubble. Purely cosmetic.
    pub fn hex_corners(&self, size: f32) -> [Vec2; 6] {
        let center = self.to_pixel();
        let mut corners = [Vec2::ZERO; 6];
        for (i, corner) in corners.iter_mut().enumerate() {
            let angle = std::f32::consts::PI / 180.0 * (60.0 * i as f32 + 30.0);
            *corner = Vec2::new(center.x + size * angle.cos(), center.y + size * angle.sin());
        }
        corners
    }
}

impl std::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Every valid cell address, in row-major order.
///
/// Row-major order matters: the collision scan resolves simultaneous hits in
/// favor of the first cell in this order.
pub fn all_coords() -> impl Iterator<Item = GridCoord> {
    (0..TOTAL_ROWS).flat_map(|row| (0..columns_in_row(row)).map(move |col| GridCoord::new(row, col)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn even_row_diagonals_lean_left() {
        let neighbors: HashSet<_> = GridCoord::new(2, 4).neighbors().collect();
        assert!(neighbors.contains(&GridCoord::new(1, 3)));
        assert!(neighbors.contains(&GridCoord::new(3, 3)));
        assert!(!neighbors.contains(&GridCoord::new(1, 5)));
        assert!(!neighbors.contains(&GridCoord::new(3, 5)));
    }

    #[test]
    fn odd_row_diagonals_lean_right() {
        let neighbors: HashSet<_> = GridCoord::new(3, 4).neighbors().collect();
        assert!(neighbors.contains(&GridCoord::new(2, 5)));
        assert!(neighbors.contains(&GridCoord::new(4, 5)));
        assert!(!neighbors.contains(&GridCoord::new(2, 3)));
        assert!(!neighbors.contains(&GridCoord::new(4, 3)));
    }

    #[test]
    fn interior_cell_has_six_neighbors() {
        assert_eq!(GridCoord::new(5, 4).neighbors().count(), 6);
    }

    #[test]
    fn corner_cells_drop_out_of_range_neighbors() {
        // Top-left even corner: only east, south and the in-bounds diagonal
        // survive.
        let neighbors: Vec<_> = GridCoord::new(0, 0).neighbors().collect();
        assert!(neighbors.iter().all(GridCoord::in_bounds));
        assert_eq!(neighbors.len(), 2);
        // Odd rows stop one column early.
        assert!(!GridCoord::new(1, COLUMNS - 1).in_bounds());
    }

    #[test]
    fn neighbor_relation_is_symmetric() {
        for a in all_coords() {
            for b in a.neighbors() {
                assert!(
                    b.neighbors().any(|back| back == a),
                    "{b} is a neighbor of {a} but not vice versa"
                );
            }
        }
    }

    #[test]
    fn pixel_roundtrip_even_row() {
        let original = GridCoord::new(4, 7);
        assert_eq!(GridCoord::from_pixel(original.to_pixel()), original);
    }

    #[test]
    fn pixel_roundtrip_odd_row() {
        let original = GridCoord::new(9, 3);
        assert_eq!(GridCoord::from_pixel(original.to_pixel()), original);
    }

    #[test]
    fn lose_line_matches_max_allowed_row() {
        let at_line = GridCoord::new(MAX_ALLOWED_ROW, 0).to_pixel();
        let above = GridCoord::new(MAX_ALLOWED_ROW - 1, 0).to_pixel();
        assert!(at_line.y - BUBBLE_RADIUS <= LOSE_LINE_Y);
        assert!(above.y - BUBBLE_RADIUS > LOSE_LINE_Y);
    }
}
