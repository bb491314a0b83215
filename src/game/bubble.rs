//! Bubble colors and the settled bubble entities on the lattice.
//!
//! The grid itself only stores colors (see `grid.rs`); the entities spawned
//! here are the visual bodies that track those cells.

use bevy::prelude::*;
use rand::Rng;

use super::lattice::{BUBBLE_RADIUS, GridCoord};
use crate::screens::Screen;

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Bubble>();
    app.register_type::<BubbleColor>();
}

/// A color as four 8-bit channels, compared and copied by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// The five bubble colors.
///
/// Level files identify colors with the small integers returned by
/// [`BubbleColor::id`]; `0` always means an empty cell and never maps to a
/// color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Component, Reflect, Default)]
#[reflect(Component)]
pub enum BubbleColor {
    #[default]
    Red,
    Green,
    Blue,
    Yellow,
    Gray,
}

impl BubbleColor {
    pub const ALL: [BubbleColor; 5] = [
        BubbleColor::Red,
        BubbleColor::Green,
        BubbleColor::Blue,
        BubbleColor::Yellow,
        BubbleColor::Gray,
    ];

    /// The channel values used to paint this color.
    pub const fn rgba(self) -> Rgba {
        match self {
            BubbleColor::Red => Rgba { r: 255, g: 0, b: 0, a: 255 },
            BubbleColor::Green => Rgba { r: 0, g: 255, b: 0, a: 255 },
            BubbleColor::Blue => Rgba { r: 0, g: 0, b: 255, a: 255 },
            BubbleColor::Yellow => Rgba { r: 255, g: 255, b: 0, a: 255 },
            BubbleColor::Gray => Rgba { r: 87, g: 88, b: 87, a: 255 },
        }
    }

    /// The rendering color.
    pub fn to_color(self) -> Color {
        let Rgba { r, g, b, a } = self.rgba();
        Color::srgba_u8(r, g, b, a)
    }

    /// The level-file identifier for this color (`1..=5`).
    pub const fn id(self) -> u8 {
        match self {
            BubbleColor::Red => 1,
            BubbleColor::Green => 2,
            BubbleColor::Blue => 3,
            BubbleColor::Yellow => 4,
            BubbleColor::Gray => 5,
        }
    }

    /// Inverse of [`BubbleColor::id`]. Unknown identifiers yield `None`.
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(BubbleColor::Red),
            2 => Some(BubbleColor::Green),
            3 => Some(BubbleColor::Blue),
            4 => Some(BubbleColor::Yellow),
            5 => Some(BubbleColor::Gray),
            _ => None,
        }
    }

    /// A uniformly random bubble color.
    pub fn random() -> Self {
        let mut rng = rand::rng();
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// A settled bubble's visual body. The authoritative color lives in the grid;
/// this component only remembers which cell the entity belongs to.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Bubble {
    pub color: BubbleColor,
    pub coord: GridCoord,
}

/// Spawn the visual body for a bubble settled at `coord`.
pub fn spawn_bubble(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    coord: GridCoord,
    color: BubbleColor,
) -> Entity {
    let world_pos = coord.to_pixel();

    commands
        .spawn((
            Name::new(format!("Bubble {color:?} at {coord}")),
            Bubble { color, coord },
            color,
            Transform::from_translation(world_pos.extend(0.0)),
            Mesh2d(meshes.add(Circle::new(BUBBLE_RADIUS))),
            MeshMaterial2d(materials.add(ColorMaterial::from_color(color.to_color()))),
            DespawnOnExit(Screen::Gameplay),
        ))
        .id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_roundtrip_covers_every_color() {
        for color in BubbleColor::ALL {
            assert_eq!(BubbleColor::from_id(color.id()), Some(color));
        }
    }

    #[test]
    fn zero_and_unknown_ids_are_not_colors() {
        assert_eq!(BubbleColor::from_id(0), None);
        assert_eq!(BubbleColor::from_id(6), None);
    }

    #[test]
    fn gray_channels_match_the_palette() {
        assert_eq!(BubbleColor::Gray.rgba(), Rgba { r: 87, g: 88, b: 87, a: 255 });
    }
}
