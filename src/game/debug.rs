//! Debug visualization for the bubble lattice.
//!
//! Toggle with the 'H' key during gameplay.
//! Shows:
//! - Hex cell outlines for every lattice position
//! - Colored cells highlighted
//! - Walls and the lose line (always visible)

use bevy::{color::palettes::css, input::common_conditions::input_just_pressed, prelude::*};

use super::{
    grid::BubbleGrid,
    lattice::{
        BUBBLE_RADIUS, GridCoord, LEFT_WALL, LOSE_LINE_Y, MAX_ALLOWED_ROW, RIGHT_WALL, TOP_WALL,
        all_coords,
    },
    shooter::SHOOTER_Y,
};
use crate::screens::Screen;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<LatticeOverlayVisible>();

    app.add_systems(
        Update,
        toggle_overlay.run_if(in_state(Screen::Gameplay).and(input_just_pressed(KeyCode::KeyH))),
    );
    app.add_systems(
        Update,
        draw_lattice_overlay.run_if(in_state(Screen::Gameplay).and(overlay_visible)),
    );

    // Walls are always drawn during gameplay
    app.add_systems(Update, draw_walls.run_if(in_state(Screen::Gameplay)));
}

/// Resource to track if the lattice overlay is visible.
#[derive(Resource, Default)]
pub struct LatticeOverlayVisible(pub bool);

fn overlay_visible(overlay: Res<LatticeOverlayVisible>) -> bool {
    overlay.0
}

/// Flip the overlay and mirror the state into every cell's highlight flag.
fn toggle_overlay(mut overlay: ResMut<LatticeOverlayVisible>, mut grid: ResMut<BubbleGrid>) {
    overlay.0 = !overlay.0;
    grid.set_highlight_all(overlay.0);
    let state = if overlay.0 { "ON" } else { "OFF" };
    info!("Lattice overlay: {}", state);
}

/// Draw the lattice overlay using Bevy's Gizmos.
fn draw_lattice_overlay(mut gizmos: Gizmos, grid: Res<BubbleGrid>) {
    for coord in all_coords() {
        let color = if grid.is_highlighted(coord) && grid.is_colored(coord) {
            css::LIMEGREEN.with_alpha(0.5)
        } else if coord.row == 0 {
            // Anchor row
            css::GOLD.with_alpha(0.3)
        } else if coord.row >= MAX_ALLOWED_ROW {
            // Past the lose line
            css::INDIAN_RED.with_alpha(0.3)
        } else {
            css::WHITE.with_alpha(0.15)
        };

        draw_hex_outline(&mut gizmos, coord, color);
    }
}

/// Draw a hexagon outline around a lattice cell.
fn draw_hex_outline(gizmos: &mut Gizmos, coord: GridCoord, color: impl Into<Color>) {
    let corners = coord.hex_corners(BUBBLE_RADIUS);
    let color = color.into();

    for i in 0..6 {
        let next = (i + 1) % 6;
        gizmos.line_2d(corners[i], corners[next], color);
    }
}

/// Draw the walls and play area boundaries (always visible during gameplay).
fn draw_walls(mut gizmos: Gizmos) {
    let wall_color = css::ORANGE.with_alpha(0.8);
    let lose_color = css::RED.with_alpha(0.6);

    gizmos.line_2d(
        Vec2::new(LEFT_WALL, SHOOTER_Y - 50.0),
        Vec2::new(LEFT_WALL, TOP_WALL + 50.0),
        wall_color,
    );
    gizmos.line_2d(
        Vec2::new(RIGHT_WALL, SHOOTER_Y - 50.0),
        Vec2::new(RIGHT_WALL, TOP_WALL + 50.0),
        wall_color,
    );
    gizmos.line_2d(
        Vec2::new(LEFT_WALL, TOP_WALL),
        Vec2::new(RIGHT_WALL, TOP_WALL),
        wall_color,
    );
    gizmos.line_2d(
        Vec2::new(LEFT_WALL, LOSE_LINE_Y),
        Vec2::new(RIGHT_WALL, LOSE_LINE_Y),
        lose_color,
    );
}
