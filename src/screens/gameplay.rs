//! The gameplay screen: HUD, countdown overlay, pause, and music.

use bevy::{input::common_conditions::input_just_pressed, prelude::*};

use super::Screen;
use crate::{
    Pause,
    audio::music,
    game::state::{GameScore, RoundPhase},
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Screen::Gameplay), (spawn_hud, start_music));
    app.add_systems(OnEnter(Pause(true)), spawn_pause_overlay);

    app.add_systems(
        Update,
        (
            toggle_pause
                .run_if(in_state(Screen::Gameplay).and(input_just_pressed(KeyCode::Escape))),
            (update_score_display, update_countdown_display).run_if(in_state(Screen::Gameplay)),
        ),
    );

    // Leaving gameplay while paused must not leave the game stuck paused.
    app.add_systems(OnExit(Screen::Gameplay), unpause);
}

#[derive(Component)]
struct ScoreDisplay;

#[derive(Component)]
struct CountdownDisplay;

fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            Name::new("HUD"),
            Node {
                width: Val::Percent(100.0),
                padding: UiRect::all(Val::Px(16.0)),
                justify_content: JustifyContent::SpaceBetween,
                ..default()
            },
            DespawnOnExit(Screen::Gameplay),
        ))
        .with_children(|parent| {
            parent.spawn((
                ScoreDisplay,
                Text::new("Score: 0"),
                TextFont::from_font_size(28.0),
            ));
        });

    commands.spawn((
        Name::new("Countdown"),
        CountdownDisplay,
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            top: Val::Percent(40.0),
            justify_content: JustifyContent::Center,
            ..default()
        },
        DespawnOnExit(Screen::Gameplay),
        children![(Text::new(""), TextFont::from_font_size(96.0))],
    ));
}

fn start_music(mut commands: Commands, asset_server: Res<AssetServer>) {
    commands.spawn((
        Name::new("Gameplay Music"),
        music(asset_server.load("audio/music/gameplay.ogg")),
        DespawnOnExit(Screen::Gameplay),
    ));
}

fn update_score_display(score: Res<GameScore>, mut query: Query<&mut Text, With<ScoreDisplay>>) {
    if !score.is_changed() {
        return;
    }
    for mut text in &mut query {
        text.0 = format!("Score: {}", score.0);
    }
}

/// Show whole seconds while the get-ready countdown runs, nothing after.
fn update_countdown_display(
    phase: Res<RoundPhase>,
    mut overlay: Query<(&Children, &mut Visibility), With<CountdownDisplay>>,
    mut texts: Query<&mut Text>,
) {
    for (children, mut visibility) in &mut overlay {
        match *phase {
            RoundPhase::Countdown { remaining } => {
                *visibility = Visibility::Inherited;
                for &child in children {
                    if let Ok(mut text) = texts.get_mut(child) {
                        text.0 = format!("{}", remaining.ceil() as i32);
                    }
                }
            }
            _ => *visibility = Visibility::Hidden,
        }
    }
}

fn toggle_pause(current: Res<State<Pause>>, mut next: ResMut<NextState<Pause>>) {
    next.set(Pause(!current.0));
}

fn unpause(mut next: ResMut<NextState<Pause>>) {
    next.set(Pause(false));
}

fn spawn_pause_overlay(mut commands: Commands) {
    commands.spawn((
        Name::new("Pause Overlay"),
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            align_items: AlignItems::Center,
            justify_content: JustifyContent::Center,
            ..default()
        },
        BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
        DespawnOnExit(Pause(true)),
        children![(Text::new("Paused"), TextFont::from_font_size(48.0))],
    ));
}
