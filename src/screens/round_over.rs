//! The round-over screen: outcome, final score, back to the title.

use bevy::{input::common_conditions::input_just_pressed, prelude::*};

use super::Screen;
use crate::game::state::LastRoundOutcome;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(OnEnter(Screen::RoundOver), spawn_round_over_screen);
    app.add_systems(
        Update,
        return_to_title
            .run_if(in_state(Screen::RoundOver).and(
                input_just_pressed(KeyCode::Enter).or(input_just_pressed(KeyCode::Space)),
            )),
    );
}

fn spawn_round_over_screen(mut commands: Commands, outcome: Option<Res<LastRoundOutcome>>) {
    let (headline, score) = match outcome.as_deref() {
        Some(LastRoundOutcome(outcome)) if outcome.is_victory() => {
            ("Board cleared!", outcome.score())
        }
        Some(LastRoundOutcome(outcome)) => ("Game over", outcome.score()),
        None => ("Game over", 0),
    };

    commands.spawn((
        Name::new("Round Over Screen"),
        Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            flex_direction: FlexDirection::Column,
            align_items: AlignItems::Center,
            justify_content: JustifyContent::Center,
            row_gap: Val::Px(12.0),
            ..default()
        },
        DespawnOnExit(Screen::RoundOver),
        children![
            (Text::new(headline), TextFont::from_font_size(56.0)),
            (
                Text::new(format!("Score: {score}")),
                TextFont::from_font_size(32.0)
            ),
            (
                Text::new("Enter or Space - back to title"),
                TextFont::from_font_size(20.0)
            ),
        ],
    ));
}

fn return_to_title(mut next_screen: ResMut<NextState<Screen>>) {
    next_screen.set(Screen::Title);
}
