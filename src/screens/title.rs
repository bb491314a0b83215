//! The title screen: pick a mode, see the leaderboard.

use bevy::{input::common_conditions::input_just_pressed, prelude::*};

use super::Screen;
use crate::game::{highscore::HighScores, level::GameMode};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Screen::Title), spawn_title_screen);
    app.add_systems(
        Update,
        (
            start_adventure.run_if(input_just_pressed(KeyCode::Enter)),
            start_quick_play.run_if(input_just_pressed(KeyCode::Space)),
        )
            .run_if(in_state(Screen::Title)),
    );
}

fn spawn_title_screen(mut commands: Commands, high_scores: Res<HighScores>) {
    commands
        .spawn((
            Name::new("Title Screen"),
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::Center,
                justify_content: JustifyContent::Center,
                row_gap: Val::Px(12.0),
                ..default()
            },
            DespawnOnExit(Screen::Title),
        ))
        .with_children(|parent| {
            parent.spawn((Text::new("FRUITBURST"), TextFont::from_font_size(64.0)));
            parent.spawn((
                Text::new("Enter - adventure    Space - quick play"),
                TextFont::from_font_size(24.0),
            ));

            if !high_scores.entries.is_empty() {
                parent.spawn((Text::new("Top scores"), TextFont::from_font_size(28.0)));
                for (rank, entry) in high_scores.entries.iter().enumerate() {
                    let marker = if entry.cleared_the_board { "*" } else { " " };
                    parent.spawn((
                        Text::new(format!("{:>2}. {:>6} {}", rank + 1, entry.score, marker)),
                        TextFont::from_font_size(20.0),
                    ));
                }
            }
        });
}

fn start_adventure(mut commands: Commands, mut next_screen: ResMut<NextState<Screen>>) {
    commands.insert_resource(GameMode::Adventure { level: 1 });
    next_screen.set(Screen::Gameplay);
}

fn start_quick_play(mut commands: Commands, mut next_screen: ResMut<NextState<Screen>>) {
    commands.insert_resource(GameMode::QuickPlay);
    next_screen.set(Screen::Gameplay);
}
