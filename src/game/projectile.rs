//! The projectile: the one bubble currently in flight.
//!
//! A projectile flies in a straight line, reflects off the side walls, and
//! settles into the lattice on its first contact with a settled bubble or
//! with the ceiling. At most one projectile is live at any instant; a second
//! one appearing is a core bug and aborts the round.

use bevy::prelude::*;

use super::{
    bubble::{BubbleColor, spawn_bubble},
    grid::BubbleGrid,
    lattice::{BUBBLE_RADIUS, GridCoord, LEFT_WALL, MAX_ALLOWED_ROW, RIGHT_WALL, TOP_WALL},
    level::LaunchQueue,
    shooter::SHOOTER_Y,
};
use crate::{PausableSystems, audio::sound_effect, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Projectile>();
    app.add_message::<LaunchBubble>();
    app.add_message::<BubbleLanded>();

    app.add_systems(
        Update,
        (
            launch_projectile,
            move_projectile,
            bounce_off_walls,
            settle_projectile,
            expire_projectile,
        )
            .chain()
            .in_set(PausableSystems)
            .in_set(ProjectileSystems)
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// System set for projectile flight and settling.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectileSystems;

/// Flight speed in world units per second.
const PROJECTILE_SPEED: f32 = 600.0;

/// A projectile that has flown this long without settling is discarded and
/// relaunched.
const MAX_FLIGHT_TIME: f32 = 5.0;

/// Request to launch the loaded bubble. Written by the shooter on release.
#[derive(Message, Debug, Clone)]
pub struct LaunchBubble {
    pub direction: Vec2,
    pub color: BubbleColor,
}

/// A projectile settled into the lattice. Drives match resolution.
#[derive(Message, Debug, Clone)]
pub struct BubbleLanded {
    pub coord: GridCoord,
    pub color: BubbleColor,
}

/// The bubble in flight.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Projectile {
    pub velocity: Vec2,
    pub color: BubbleColor,
    /// Seconds since launch.
    pub flight_time: f32,
}

/// First colored cell whose circle overlaps a projectile centered at `pos`.
///
/// Cells are scanned in row-major order and the first hit wins. Two cells
/// passing the radius test in the same tick should be impossible with a
/// single moving bubble, but if it ever happens the scan order is the
/// tie-break.
pub fn first_collision(grid: &BubbleGrid, pos: Vec2) -> Option<GridCoord> {
    let hit_range = BUBBLE_RADIUS * 2.0;
    let hit_range_sq = hit_range * hit_range;

    grid.colored_coords().find(|coord| {
        let center = coord.to_pixel();
        // Cheap box reject before the exact squared-distance test.
        if (pos.x - center.x).abs() > hit_range || (pos.y - center.y).abs() > hit_range {
            return false;
        }
        pos.distance_squared(center) <= hit_range_sq
    })
}

/// Whether a projectile centered at `pos` has reached the ceiling.
pub fn reached_ceiling(pos: Vec2) -> bool {
    pos.y + BUBBLE_RADIUS >= TOP_WALL
}

/// Reflect the horizontal velocity when the circle crosses a side wall.
/// The vertical component is untouched.
pub(super) fn reflect_at_walls(translation: &mut Vec3, velocity: &mut Vec2) {
    if translation.x - BUBBLE_RADIUS < LEFT_WALL {
        translation.x = LEFT_WALL + BUBBLE_RADIUS;
        velocity.x = velocity.x.abs();
    }
    if translation.x + BUBBLE_RADIUS > RIGHT_WALL {
        translation.x = RIGHT_WALL - BUBBLE_RADIUS;
        velocity.x = -velocity.x.abs();
    }
}

/// Whether the projectile left the logical playfield entirely.
fn out_of_playfield(pos: Vec2) -> bool {
    pos.x < LEFT_WALL - BUBBLE_RADIUS * 2.0
        || pos.x > RIGHT_WALL + BUBBLE_RADIUS * 2.0
        || pos.y > TOP_WALL + BUBBLE_RADIUS * 2.0
        || pos.y < SHOOTER_Y - BUBBLE_RADIUS * 4.0
}

fn launch_projectile(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    asset_server: Res<AssetServer>,
    mut launches: MessageReader<LaunchBubble>,
    live: Query<(), With<Projectile>>,
) {
    for launch in launches.read() {
        // Singleton invariant: a launch while one is in flight is a bug in
        // the round state machine, not a recoverable input.
        assert!(
            live.is_empty(),
            "launch requested while a projectile is already in flight"
        );

        let velocity = launch.direction.normalize() * PROJECTILE_SPEED;
        commands.spawn((
            Name::new("Projectile"),
            Projectile {
                velocity,
                color: launch.color,
                flight_time: 0.0,
            },
            Transform::from_translation(Vec3::new(0.0, SHOOTER_Y, 5.0)),
            Mesh2d(meshes.add(Circle::new(BUBBLE_RADIUS))),
            MeshMaterial2d(materials.add(ColorMaterial::from_color(launch.color.to_color()))),
            DespawnOnExit(Screen::Gameplay),
        ));
        commands.spawn(sound_effect(asset_server.load("audio/sound_effects/launch.ogg")));
        info!("launched {:?} bubble with velocity {velocity:?}", launch.color);
    }
}

fn move_projectile(time: Res<Time>, mut query: Query<(&mut Transform, &mut Projectile)>) {
    for (mut transform, mut projectile) in &mut query {
        transform.translation += projectile.velocity.extend(0.0) * time.delta_secs();
        projectile.flight_time += time.delta_secs();
    }
}

fn bounce_off_walls(mut query: Query<(&mut Transform, &mut Projectile)>) {
    for (mut transform, mut projectile) in &mut query {
        reflect_at_walls(&mut transform.translation, &mut projectile.velocity);
    }
}

/// Attach the projectile on first contact with the lattice or the ceiling.
fn settle_projectile(
    mut commands: Commands,
    mut grid: ResMut<BubbleGrid>,
    mut queue: ResMut<LaunchQueue>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut landed: MessageWriter<BubbleLanded>,
    query: Query<(Entity, &Transform, &Projectile)>,
) {
    let Ok((entity, transform, projectile)) = query.single() else {
        return;
    };
    let pos = transform.translation.truncate();

    let coord = if first_collision(&grid, pos).is_some() {
        // Hit a settled bubble: freeze into the nearest free cell.
        grid.closest_empty_cell(pos)
    } else if reached_ceiling(pos) {
        // No contact on the way up: snap into the nearest free top column.
        grid.nearest_empty_top_cell(pos.x)
    } else {
        return;
    };

    let Some(coord) = coord else {
        // Lattice completely full around the contact point. The lose check
        // will have ended the round before this matters; just drop the shot.
        warn!("no free cell to settle into at {pos:?}, discarding projectile");
        commands.entity(entity).despawn();
        return;
    };

    grid.set_color(coord, projectile.color);
    let body = spawn_bubble(&mut commands, &mut meshes, &mut materials, coord, projectile.color);
    grid.set_entity(coord, body);
    queue.consume();
    commands.entity(entity).despawn();

    // A settle on or past the last allowed row loses the round outright; the
    // landing is withheld from match resolution so a group completed on the
    // lose row cannot clear itself and undo the defeat.
    if coord.row >= MAX_ALLOWED_ROW {
        info!("bubble settled at {coord}, past the last allowed row");
        return;
    }

    landed.write(BubbleLanded {
        coord,
        color: projectile.color,
    });
    info!("bubble settled at {coord} with color {:?}", projectile.color);
}

/// Discard a projectile that flew too long or escaped the playfield. The
/// shooter reloads the same color; the launch queue is only advanced by a
/// settle.
fn expire_projectile(
    mut commands: Commands,
    query: Query<(Entity, &Transform, &Projectile)>,
) {
    for (entity, transform, projectile) in &query {
        let pos = transform.translation.truncate();
        if projectile.flight_time > MAX_FLIGHT_TIME {
            info!("projectile exceeded its lifetime, discarding");
            commands.entity(entity).despawn();
        } else if out_of_playfield(pos) {
            warn!("projectile escaped the playfield at {pos:?}, discarding");
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_requires_overlap() {
        let mut grid = BubbleGrid::default();
        let cell = GridCoord::new(2, 4);
        grid.set_color(cell, BubbleColor::Red);
        let center = cell.to_pixel();

        // Just inside two radii hits, just outside misses.
        let touching = center + Vec2::new(BUBBLE_RADIUS * 2.0 - 1.0, 0.0);
        let apart = center + Vec2::new(BUBBLE_RADIUS * 2.0 + 1.0, 0.0);
        assert_eq!(first_collision(&grid, touching), Some(cell));
        assert_eq!(first_collision(&grid, apart), None);
    }

    #[test]
    fn collision_ignores_empty_cells() {
        let grid = BubbleGrid::default();
        assert_eq!(first_collision(&grid, GridCoord::new(5, 5).to_pixel()), None);
    }

    #[test]
    fn simultaneous_hits_resolve_in_row_major_order() {
        let mut grid = BubbleGrid::default();
        let upper = GridCoord::new(0, 2);
        let lower = GridCoord::new(1, 2);
        grid.set_color(lower, BubbleColor::Blue);
        grid.set_color(upper, BubbleColor::Blue);

        let midpoint = (upper.to_pixel() + lower.to_pixel()) / 2.0;
        assert_eq!(first_collision(&grid, midpoint), Some(upper));
    }

    #[test]
    fn wall_bounce_reflects_x_only() {
        let mut translation = Vec3::new(LEFT_WALL + 1.0, 0.0, 0.0);
        let mut velocity = Vec2::new(-300.0, 400.0);
        reflect_at_walls(&mut translation, &mut velocity);
        assert_eq!(velocity, Vec2::new(300.0, 400.0));
        assert_eq!(translation.x, LEFT_WALL + BUBBLE_RADIUS);

        let mut translation = Vec3::new(RIGHT_WALL - 1.0, 0.0, 0.0);
        let mut velocity = Vec2::new(300.0, 400.0);
        reflect_at_walls(&mut translation, &mut velocity);
        assert_eq!(velocity, Vec2::new(-300.0, 400.0));
    }

    #[test]
    fn ceiling_detection_uses_the_circle_edge() {
        assert!(reached_ceiling(Vec2::new(0.0, TOP_WALL - BUBBLE_RADIUS)));
        assert!(!reached_ceiling(Vec2::new(0.0, TOP_WALL - BUBBLE_RADIUS - 1.0)));
    }

    #[test]
    fn playfield_exit_is_detected_on_every_side() {
        assert!(out_of_playfield(Vec2::new(LEFT_WALL - 100.0, 0.0)));
        assert!(out_of_playfield(Vec2::new(RIGHT_WALL + 100.0, 0.0)));
        assert!(out_of_playfield(Vec2::new(0.0, SHOOTER_Y - 100.0)));
        assert!(!out_of_playfield(Vec2::new(0.0, 0.0)));
    }
}
