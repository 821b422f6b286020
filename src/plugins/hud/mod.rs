//! HUD model and end-of-match transitions.
//!
//! The HUD subscribes to the gameplay topics once at startup and mirrors the
//! shared cells into plain fields every frame, logging life changes and
//! driving the state switch to `GameOver` or `Won`. Winning also asks the
//! pool to sweep every live entity off the field.

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;

use crate::common::state::GameState;
use crate::config::GameConfig;
use crate::events::{Counter, Deferred, EventBus, Flag, HandlerId, Payload, topics};
use crate::persistence::HighScoreStore;
use crate::plugins::pool::ReleaseAll;

#[derive(Resource, Default)]
pub struct HudModel {
    lives_cell: Counter,
    score_cell: Counter,
    game_over: Flag,
    win: Flag,

    pub lives: i32,
    pub score: i32,
    pub high_score: i32,
    game_over_handled: bool,
    win_handled: bool,
}

pub fn setup_hud(
    mut commands: Commands,
    config: Res<GameConfig>,
    store: Res<HighScoreStore>,
    mut bus: ResMut<EventBus>,
) {
    let model = HudModel {
        lives: config.player.lives,
        high_score: store.read(),
        ..default()
    };
    model.lives_cell.set(config.player.lives);

    let lives = model.lives_cell.clone();
    bus.subscribe(
        topics::LIVES_CHANGED,
        HandlerId("hud::lives"),
        Box::new(move |payload: &Payload, _: &mut Deferred| {
            lives.set(payload.count().unwrap_or(0));
        }),
    );

    let score = model.score_cell.clone();
    bus.subscribe(
        topics::SCORE_RAISED,
        HandlerId("hud::score"),
        Box::new(move |payload: &Payload, _: &mut Deferred| {
            score.add(payload.count().unwrap_or(0));
        }),
    );

    let over = model.game_over.clone();
    bus.subscribe(
        topics::GAME_OVER,
        HandlerId("hud::game_over"),
        Box::new(move |_: &Payload, _: &mut Deferred| over.raise()),
    );

    let win = model.win.clone();
    bus.subscribe(
        topics::WIN_GAME,
        HandlerId("hud::win"),
        Box::new(move |_: &Payload, _: &mut Deferred| win.raise()),
    );

    commands.insert_resource(model);
}

/// Mirror the handler cells into the model and run end-of-match transitions.
/// Not gated on `InGame`: it is the system that leaves that state.
pub fn sync_hud(
    mut model: ResMut<HudModel>,
    mut next: ResMut<NextState<GameState>>,
    mut release: MessageWriter<ReleaseAll>,
) {
    let lives = model.lives_cell.get();
    if lives != model.lives {
        info!("lives: {lives}");
        model.lives = lives;
    }
    model.score = model.score_cell.get();
    if model.score > model.high_score {
        model.high_score = model.score;
    }

    if model.game_over.is_raised() && !model.game_over_handled {
        model.game_over_handled = true;
        info!("game over at score {}", model.score);
        next.set(GameState::GameOver);
    }
    if model.win.is_raised() && !model.win_handled {
        model.win_handled = true;
        info!("match won at score {}", model.score);
        release.write(ReleaseAll);
        next.set(GameState::Won);
    }
}

pub fn plugin(app: &mut App) {
    app.add_systems(Startup, setup_hud.after(crate::plugins::waves::setup_waves))
        .add_systems(PostUpdate, sync_hud);
}
