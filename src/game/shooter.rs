//! The shooter at the bottom of the playfield.
//!
//! The player aims with the pointer and fires on release. The aim direction
//! is clamped to an upward cone so a shot can never travel flat or downward.

use bevy::prelude::*;

use super::{
    bubble::BubbleColor,
    lattice::BUBBLE_RADIUS,
    level::LaunchQueue,
    projectile::{LaunchBubble, Projectile},
    state::RoundPhase,
};
use crate::{AppSystems, PausableSystems, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<AimDirection>();
    app.init_resource::<AimDirection>();

    app.add_systems(OnEnter(Screen::Gameplay), spawn_shooter);
    app.add_systems(
        Update,
        (
            (aim_with_cursor, fire_on_release)
                .chain()
                .in_set(AppSystems::RecordInput),
            (reload_shooter, sync_shooter_visuals, draw_aim_line).in_set(AppSystems::Update),
        )
            .in_set(PausableSystems)
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// Vertical position of the shooter pivot.
pub(super) const SHOOTER_Y: f32 = -500.0;

/// Allowed aim cone, measured counterclockwise from the positive X axis.
const MIN_AIM_DEG: f32 = 15.0;
const MAX_AIM_DEG: f32 = 165.0;

/// Current (already clamped) aim direction, unit length.
#[derive(Resource, Debug, Clone, Reflect)]
#[reflect(Resource)]
pub struct AimDirection(pub Vec2);

impl Default for AimDirection {
    fn default() -> Self {
        Self(Vec2::Y)
    }
}

/// The shooter pivot.
#[derive(Component)]
struct Shooter;

/// Visual for the bubble currently loaded in the shooter.
#[derive(Component)]
struct LoadedBubble;

/// Smaller visual for the bubble that loads after the next shot.
#[derive(Component)]
struct NextPreview;

/// Clamp an aim direction into the allowed cone.
///
/// Directions inside the cone pass through normalized. Anything outside
/// snaps to whichever cone edge is angularly closer, so dragging past the
/// left edge keeps aiming hard left instead of flipping to the right.
pub fn clamp_aim(direction: Vec2) -> Vec2 {
    if direction == Vec2::ZERO {
        return Vec2::Y;
    }
    let angle = direction.y.atan2(direction.x).to_degrees();
    if (MIN_AIM_DEG..=MAX_AIM_DEG).contains(&angle) {
        return direction.normalize_or(Vec2::Y);
    }
    let bound = if angular_distance(angle, MIN_AIM_DEG) <= angular_distance(angle, MAX_AIM_DEG) {
        MIN_AIM_DEG
    } else {
        MAX_AIM_DEG
    };
    Vec2::from_angle(bound.to_radians())
}

fn angular_distance(a: f32, b: f32) -> f32 {
    let diff = (a - b).rem_euclid(360.0);
    diff.min(360.0 - diff)
}

fn spawn_shooter(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    commands.spawn((
        Name::new("Shooter"),
        Shooter,
        Transform::from_xyz(0.0, SHOOTER_Y, 1.0),
        Mesh2d(meshes.add(Annulus::new(BUBBLE_RADIUS + 4.0, BUBBLE_RADIUS + 8.0))),
        MeshMaterial2d(materials.add(ColorMaterial::from_color(Color::srgb(0.8, 0.8, 0.8)))),
        DespawnOnExit(Screen::Gameplay),
    ));
    commands.spawn((
        Name::new("Loaded Bubble"),
        LoadedBubble,
        Transform::from_xyz(0.0, SHOOTER_Y, 2.0),
        Mesh2d(meshes.add(Circle::new(BUBBLE_RADIUS))),
        MeshMaterial2d(materials.add(ColorMaterial::from_color(Color::WHITE))),
        DespawnOnExit(Screen::Gameplay),
    ));
    commands.spawn((
        Name::new("Next Preview"),
        NextPreview,
        Transform::from_xyz(BUBBLE_RADIUS * 3.0, SHOOTER_Y, 2.0),
        Mesh2d(meshes.add(Circle::new(BUBBLE_RADIUS * 0.6))),
        MeshMaterial2d(materials.add(ColorMaterial::from_color(Color::WHITE))),
        DespawnOnExit(Screen::Gameplay),
    ));
}

fn aim_with_cursor(
    window: Query<&Window>,
    camera: Query<(&Camera, &GlobalTransform)>,
    mut aim: ResMut<AimDirection>,
) {
    let Ok(window) = window.single() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok(world) = camera.viewport_to_world_2d(camera_transform, cursor) else {
        return;
    };
    aim.0 = clamp_aim(world - Vec2::new(0.0, SHOOTER_Y));
}

fn fire_on_release(
    mouse: Res<ButtonInput<MouseButton>>,
    aim: Res<AimDirection>,
    queue: Res<LaunchQueue>,
    mut phase: ResMut<RoundPhase>,
    mut launches: MessageWriter<LaunchBubble>,
) {
    if !mouse.just_released(MouseButton::Left) {
        return;
    }
    if !matches!(*phase, RoundPhase::Aiming) {
        return;
    }
    let Some(color) = queue.current() else {
        return;
    };
    launches.write(LaunchBubble {
        direction: aim.0,
        color,
    });
    *phase = RoundPhase::InFlight;
}

/// Hand the shooter back once the in-flight bubble is gone, whether it
/// settled or was discarded.
fn reload_shooter(live: Query<(), With<Projectile>>, mut phase: ResMut<RoundPhase>) {
    if matches!(*phase, RoundPhase::InFlight) && live.is_empty() {
        *phase = RoundPhase::Aiming;
    }
}

fn sync_shooter_visuals(
    queue: Res<LaunchQueue>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut loaded: Query<
        (&MeshMaterial2d<ColorMaterial>, &mut Visibility),
        (With<LoadedBubble>, Without<NextPreview>),
    >,
    mut preview: Query<(&MeshMaterial2d<ColorMaterial>, &mut Visibility), With<NextPreview>>,
) {
    let paint = |materials: &mut Assets<ColorMaterial>,
                 handle: &MeshMaterial2d<ColorMaterial>,
                 visibility: &mut Visibility,
                 color: Option<BubbleColor>| {
        match color {
            Some(color) => {
                if let Some(material) = materials.get_mut(&handle.0) {
                    material.color = color.to_color();
                }
                *visibility = Visibility::Inherited;
            }
            None => *visibility = Visibility::Hidden,
        }
    };

    if let Ok((handle, mut visibility)) = loaded.single_mut() {
        paint(&mut materials, handle, &mut visibility, queue.current());
    }
    if let Ok((handle, mut visibility)) = preview.single_mut() {
        paint(&mut materials, handle, &mut visibility, queue.preview());
    }
}

/// The aim preview shows while aiming and during the get-ready countdown;
/// only the launch itself waits for the countdown to finish.
fn aim_preview_visible(phase: &RoundPhase) -> bool {
    matches!(phase, RoundPhase::Aiming | RoundPhase::Countdown { .. })
}

fn draw_aim_line(mut gizmos: Gizmos, aim: Res<AimDirection>, phase: Res<RoundPhase>) {
    if !aim_preview_visible(&phase) {
        return;
    }
    let origin = Vec2::new(0.0, SHOOTER_Y);
    gizmos.line_2d(
        origin,
        origin + aim.0 * BUBBLE_RADIUS * 6.0,
        Color::srgba(1.0, 1.0, 1.0, 0.4),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_deg(deg: f32) -> Vec2 {
        Vec2::from_angle(deg.to_radians())
    }

    #[test]
    fn directions_inside_the_cone_pass_through() {
        let aim = clamp_aim(from_deg(90.0));
        assert!(aim.abs_diff_eq(Vec2::Y, 1e-5));

        let aim = clamp_aim(from_deg(15.0));
        assert!(aim.abs_diff_eq(from_deg(15.0), 1e-5));
    }

    #[test]
    fn shallow_right_aims_snap_to_the_right_edge() {
        let aim = clamp_aim(from_deg(10.0));
        assert!(aim.abs_diff_eq(from_deg(15.0), 1e-4));
    }

    #[test]
    fn shallow_left_aims_snap_to_the_left_edge() {
        let aim = clamp_aim(from_deg(170.0));
        assert!(aim.abs_diff_eq(from_deg(165.0), 1e-4));
    }

    #[test]
    fn downward_aims_snap_to_the_nearer_edge() {
        // Straight down and slightly right is closer to the right edge.
        let aim = clamp_aim(from_deg(-80.0));
        assert!(aim.abs_diff_eq(from_deg(15.0), 1e-4));

        let aim = clamp_aim(from_deg(-100.0));
        assert!(aim.abs_diff_eq(from_deg(165.0), 1e-4));
    }

    #[test]
    fn aim_preview_shows_through_the_countdown() {
        use crate::game::state::RoundOutcome;

        assert!(aim_preview_visible(&RoundPhase::Countdown { remaining: 2.0 }));
        assert!(aim_preview_visible(&RoundPhase::Aiming));
        assert!(!aim_preview_visible(&RoundPhase::InFlight));
        assert!(!aim_preview_visible(&RoundPhase::Over(RoundOutcome::Defeat { score: 0 })));
    }

    #[test]
    fn zero_direction_defaults_to_straight_up() {
        assert!(clamp_aim(Vec2::ZERO).abs_diff_eq(Vec2::Y, 1e-5));
    }
}
