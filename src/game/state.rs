//! Round state machine, scoring, and the win/lose conditions.
//!
//! A round starts with a short countdown, then alternates between aiming
//! and a bubble in flight until the board is cleared (victory), a bubble
//! settles past the lose line, or a scripted round runs out of shots.

use bevy::prelude::*;

use super::{
    cluster::{ClusterSystems, FloatersDropped, GroupCleared},
    grid::BubbleGrid,
    lattice::MAX_ALLOWED_ROW,
    level::LaunchQueue,
};
use crate::{AppSystems, PausableSystems, audio::sound_effect, screens::Screen};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<GameScore>();
    app.init_resource::<GameScore>();
    app.add_message::<RoundOver>();

    app.add_systems(OnEnter(Screen::Gameplay), reset_round_state);
    app.add_systems(
        Update,
        (
            tick_countdown
                .in_set(AppSystems::TickTimers)
                .in_set(PausableSystems),
            // Scoring and judging must see this tick's completed clearances,
            // so both run after match/sweep resolution.
            (update_score, finish_round)
                .chain()
                .after(ClusterSystems)
                .in_set(AppSystems::Update)
                .in_set(PausableSystems),
        )
            .run_if(in_state(Screen::Gameplay)),
    );
}

/// Seconds of get-ready countdown at the start of every round.
const COUNTDOWN_SECS: f32 = 3.0;

/// Points awarded per cleared cell, matched and dropped alike.
pub const POINTS_PER_BUBBLE: u32 = 10;

/// What the shooter is allowed to do right now.
#[derive(Resource, Debug, Clone, PartialEq)]
pub enum RoundPhase {
    /// Get-ready overlay is showing; input is ignored.
    Countdown { remaining: f32 },
    /// Waiting for the player to fire.
    Aiming,
    /// A projectile is in flight.
    InFlight,
    /// The round has been decided.
    Over(RoundOutcome),
}

impl RoundPhase {
    pub fn is_over(&self) -> bool {
        matches!(self, Self::Over(_))
    }
}

/// How a round ended, with the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Victory { score: u32 },
    Defeat { score: u32 },
}

impl RoundOutcome {
    pub fn score(self) -> u32 {
        match self {
            Self::Victory { score } | Self::Defeat { score } => score,
        }
    }

    pub fn is_victory(self) -> bool {
        matches!(self, Self::Victory { .. })
    }
}

/// Accumulated score for the current round. Never goes below zero because
/// nothing subtracts from it.
#[derive(Resource, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Resource)]
pub struct GameScore(pub u32);

/// Outcome of the most recently finished round, for the round-over screen
/// and the highscore table.
#[derive(Resource, Debug, Clone, Copy)]
pub struct LastRoundOutcome(pub RoundOutcome);

/// The round has been decided. Fired exactly once per round.
#[derive(Message, Debug, Clone)]
pub struct RoundOver {
    pub outcome: RoundOutcome,
}

/// Decide the round, if it is decidable this tick.
///
/// Defeat by lose-line breach is checked first: a bubble settling on the
/// last allowed row ends the round even if the shot also cleared the top
/// row. An empty top row means an empty board, since everything else would
/// have been swept as floating.
pub fn round_outcome(grid: &BubbleGrid, out_of_shots: bool, score: u32) -> Option<RoundOutcome> {
    if grid.colored_coords().any(|coord| coord.row >= MAX_ALLOWED_ROW) {
        return Some(RoundOutcome::Defeat { score });
    }
    if grid.top_row_colored().is_empty() {
        return Some(RoundOutcome::Victory { score });
    }
    if out_of_shots {
        return Some(RoundOutcome::Defeat { score });
    }
    None
}

fn reset_round_state(mut commands: Commands, mut score: ResMut<GameScore>) {
    score.0 = 0;
    commands.insert_resource(RoundPhase::Countdown {
        remaining: COUNTDOWN_SECS,
    });
}

fn tick_countdown(time: Res<Time>, mut phase: ResMut<RoundPhase>) {
    if let RoundPhase::Countdown { remaining } = &mut *phase {
        *remaining -= time.delta_secs();
        if *remaining <= 0.0 {
            *phase = RoundPhase::Aiming;
        }
    }
}

fn update_score(
    mut score: ResMut<GameScore>,
    mut cleared: MessageReader<GroupCleared>,
    mut dropped: MessageReader<FloatersDropped>,
) {
    for message in cleared.read() {
        score.0 += message.count as u32 * POINTS_PER_BUBBLE;
    }
    for message in dropped.read() {
        score.0 += message.count as u32 * POINTS_PER_BUBBLE;
    }
}

/// End the round once the board decides it. The board is judged every tick
/// in every live phase: a lose-line breach must not wait for the shooter to
/// come back to rest, or the breaching board could be shot at (and even
/// repaired) before it is ever judged.
fn finish_round(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    grid: Res<BubbleGrid>,
    queue: Res<LaunchQueue>,
    score: Res<GameScore>,
    mut phase: ResMut<RoundPhase>,
    mut round_over: MessageWriter<RoundOver>,
    mut next_screen: ResMut<NextState<Screen>>,
) {
    if phase.is_over() {
        return;
    }
    let Some(outcome) = round_outcome(&grid, queue.is_exhausted(), score.0) else {
        return;
    };

    *phase = RoundPhase::Over(outcome);
    commands.insert_resource(LastRoundOutcome(outcome));
    round_over.write(RoundOver { outcome });

    let sound = if outcome.is_victory() {
        "audio/sound_effects/victory.ogg"
    } else {
        "audio/sound_effects/game_over.ogg"
    };
    commands.spawn(sound_effect(asset_server.load(sound)));

    info!("round over: {outcome:?}");
    next_screen.set(Screen::RoundOver);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{bubble::BubbleColor, lattice::GridCoord};

    #[test]
    fn empty_board_is_a_victory() {
        let grid = BubbleGrid::default();
        assert_eq!(
            round_outcome(&grid, false, 120),
            Some(RoundOutcome::Victory { score: 120 })
        );
    }

    #[test]
    fn populated_board_with_shots_left_is_undecided() {
        let mut grid = BubbleGrid::default();
        grid.set_color(GridCoord::new(0, 3), BubbleColor::Red);
        assert_eq!(round_outcome(&grid, false, 0), None);
    }

    #[test]
    fn lose_line_breach_is_a_defeat() {
        let mut grid = BubbleGrid::default();
        grid.set_color(GridCoord::new(0, 3), BubbleColor::Red);
        grid.set_color(GridCoord::new(MAX_ALLOWED_ROW, 3), BubbleColor::Blue);
        assert_eq!(
            round_outcome(&grid, false, 50),
            Some(RoundOutcome::Defeat { score: 50 })
        );
    }

    #[test]
    fn lose_line_breach_beats_a_cleared_top_row() {
        let mut grid = BubbleGrid::default();
        grid.set_color(GridCoord::new(MAX_ALLOWED_ROW, 3), BubbleColor::Blue);
        assert!(matches!(
            round_outcome(&grid, false, 0),
            Some(RoundOutcome::Defeat { .. })
        ));
    }

    #[test]
    fn running_out_of_shots_with_bubbles_left_is_a_defeat() {
        let mut grid = BubbleGrid::default();
        grid.set_color(GridCoord::new(0, 3), BubbleColor::Red);
        assert_eq!(
            round_outcome(&grid, true, 30),
            Some(RoundOutcome::Defeat { score: 30 })
        );
    }

    #[test]
    fn only_a_decided_round_stops_judging() {
        // The judge runs in every live phase; a breach during flight or the
        // countdown must not wait for the shooter to come to rest.
        assert!(!RoundPhase::Countdown { remaining: 1.0 }.is_over());
        assert!(!RoundPhase::Aiming.is_over());
        assert!(!RoundPhase::InFlight.is_over());
        assert!(RoundPhase::Over(RoundOutcome::Defeat { score: 0 }).is_over());
    }

    #[test]
    fn settling_on_the_lose_row_defeats_before_any_match() {
        // Reds at (17,2) and (17,3), red settles at (18,3): the three cells
        // form a clearable group, but a settle on the last allowed row ends
        // the round before match resolution ever sees it.
        let mut grid = BubbleGrid::default();
        grid.set_color(GridCoord::new(17, 2), BubbleColor::Red);
        grid.set_color(GridCoord::new(17, 3), BubbleColor::Red);
        let attach = GridCoord::new(MAX_ALLOWED_ROW, 3);
        grid.set_color(attach, BubbleColor::Red);

        let group = crate::game::cluster::find_group(&grid, attach, BubbleColor::Red);
        assert_eq!(group.len(), 3);
        assert_eq!(
            round_outcome(&grid, false, 0),
            Some(RoundOutcome::Defeat { score: 0 })
        );
    }

    #[test]
    fn outcome_carries_the_score() {
        assert_eq!(RoundOutcome::Victory { score: 7 }.score(), 7);
        assert_eq!(RoundOutcome::Defeat { score: 9 }.score(), 9);
        assert!(RoundOutcome::Victory { score: 0 }.is_victory());
        assert!(!RoundOutcome::Defeat { score: 0 }.is_victory());
    }
}
