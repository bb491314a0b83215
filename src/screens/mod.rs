//! The game's screens and their transitions.

mod gameplay;
mod round_over;
mod title;

use bevy::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.init_state::<Screen>();

    app.add_plugins((title::plugin, gameplay::plugin, round_over::plugin));
}

/// The game's screens.
#[derive(States, Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Screen {
    #[default]
    Title,
    Gameplay,
    RoundOver,
}
