//! The main game module for the bubble shooter.
//!
//! This module contains all the gameplay logic including:
//! - Offset hexagonal lattice addressing
//! - Bubble colors and entities
//! - Shooter aiming and launch
//! - Projectile flight and settling
//! - Match resolution and the floating sweep
//! - Round state, scoring, levels, and persistence

mod bubble;
mod cluster;
mod debug;
mod grid;
pub mod highscore;
pub mod lattice;
pub mod level;
mod projectile;
mod save;
mod shooter;
pub mod state;

use bevy::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        grid::plugin,
        bubble::plugin,
        level::plugin,
        shooter::plugin,
        projectile::plugin,
        cluster::plugin,
        state::plugin,
        save::plugin,
        highscore::plugin,
        debug::plugin,
    ));
}
