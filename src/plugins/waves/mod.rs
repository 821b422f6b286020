//! Wave scheduling and match control.
//!
//! Each configured wave runs an independent [`WaveRunner`]: a pure timing
//! state machine that converts elapsed time into [`SpawnOrder`]s. Per cycle
//! one side of the playfield gets `wave_count` spawns and the other exactly
//! one; the majority side flips every cycle. The ECS side of the plugin
//! samples spawn positions and forwards orders as [`SpawnEnemyRequest`]s.
//!
//! [`MatchState`] tracks score and elapsed match time and fires the win
//! exactly once; winning halts every runner at its next phase boundary.

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;

use crate::common::side::Side;
use crate::common::state::GameState;
use crate::config::{GameConfig, WaveConfig};
use crate::events::{Counter, Deferred, EventBus, HandlerId, Payload, topics};
use crate::persistence::HighScoreStore;
use crate::plugins::core::SpawnRng;
use crate::plugins::enemies::SpawnEnemyRequest;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnOrder {
    pub kind: crate::plugins::enemies::EnemyKind,
    pub side: Side,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WavePhase {
    FirstWait,
    Spawning { slot: u32 },
    InterWave,
    Halted,
}

/// Timing state machine for one configured wave. Pure: feed it delta time,
/// it emits spawn orders.
#[derive(Debug)]
pub struct WaveRunner {
    config: WaveConfig,
    left_majority: bool,
    phase: WavePhase,
    remaining: f32,
}

impl WaveRunner {
    pub fn new(config: WaveConfig) -> Self {
        Self {
            left_majority: config.left_majority,
            phase: WavePhase::FirstWait,
            remaining: config.first_wait,
            config,
        }
    }

    /// Spawns per side for the current cycle: (left, right).
    fn counts(&self) -> (u32, u32) {
        if self.left_majority {
            (self.config.wave_count, 1)
        } else {
            (1, self.config.wave_count)
        }
    }

    /// One slot may produce a spawn on either side or both; the minority
    /// side only participates in slot zero.
    fn emit_slot(&self, slot: u32, out: &mut Vec<SpawnOrder>) {
        let (left, right) = self.counts();
        if slot < right {
            out.push(SpawnOrder { kind: self.config.kind, side: Side::Right });
        }
        if slot < left {
            out.push(SpawnOrder { kind: self.config.kind, side: Side::Left });
        }
    }

    pub fn region(&self, side: Side) -> &crate::common::side::SpawnRegion {
        match side {
            Side::Left => &self.config.left_region,
            Side::Right => &self.config.right_region,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.phase == WavePhase::Halted
    }

    /// Advance by `dt` seconds. `execute` false stops the runner at its next
    /// phase boundary; spawns already owed within this `dt` before the flag
    /// was checked are not emitted.
    pub fn tick(&mut self, mut dt: f32, execute: bool, out: &mut Vec<SpawnOrder>) {
        loop {
            if self.phase == WavePhase::Halted {
                return;
            }
            if dt < self.remaining {
                self.remaining -= dt;
                return;
            }
            dt -= self.remaining;

            match self.phase {
                WavePhase::FirstWait | WavePhase::InterWave => {
                    if !execute {
                        self.phase = WavePhase::Halted;
                        return;
                    }
                    self.phase = WavePhase::Spawning { slot: 0 };
                    self.emit_slot(0, out);
                    self.remaining = self.config.spawn_wait;
                }
                WavePhase::Spawning { slot } => {
                    let next = slot + 1;
                    if next >= self.config.wave_count {
                        self.left_majority = !self.left_majority;
                        self.phase = WavePhase::InterWave;
                        self.remaining = self.config.wave_wait;
                    } else {
                        self.phase = WavePhase::Spawning { slot: next };
                        self.emit_slot(next, out);
                        self.remaining = self.config.spawn_wait;
                    }
                }
                WavePhase::Halted => unreachable!(),
            }
        }
    }
}

#[derive(Resource, Default)]
pub struct WaveDirector {
    /// Cleared by the match controller on win; runners then halt.
    pub execute: bool,
    runners: Vec<WaveRunner>,
}

impl WaveDirector {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            execute: true,
            runners: config.waves.iter().copied().map(WaveRunner::new).collect(),
        }
    }

    pub fn runners(&self) -> &[WaveRunner] {
        &self.runners
    }
}

/// Score and clock for the current match.
#[derive(Resource, Default)]
pub struct MatchState {
    pub score: Counter,
    pub elapsed: f32,
    pub won: bool,
}

pub fn setup_waves(mut commands: Commands, config: Res<GameConfig>, mut bus: ResMut<EventBus>) {
    commands.insert_resource(WaveDirector::from_config(&config));

    let match_state = MatchState::default();
    let score = match_state.score.clone();
    bus.subscribe(
        topics::SCORE_RAISED,
        HandlerId("match::score"),
        Box::new(move |payload: &Payload, _: &mut Deferred| {
            score.add(payload.count().unwrap_or(0));
        }),
    );
    commands.insert_resource(match_state);
}

pub fn advance_waves(
    time: Res<Time>,
    mut director: ResMut<WaveDirector>,
    mut rng: ResMut<SpawnRng>,
    mut requests: MessageWriter<SpawnEnemyRequest>,
) {
    let dt = time.delta_secs();
    let execute = director.execute;
    let mut orders = Vec::new();

    for runner in &mut director.runners {
        orders.clear();
        runner.tick(dt, execute, &mut orders);
        for order in &orders {
            let pos = runner.region(order.side).sample(&mut rng.0);
            requests.write(SpawnEnemyRequest {
                kind: order.kind,
                side: order.side,
                pos,
            });
        }
    }
}

/// End the match the moment either win threshold is reached. Fires once:
/// `execute` doubles as the armed flag.
pub fn check_win(
    time: Res<Time>,
    config: Res<GameConfig>,
    store: Res<HighScoreStore>,
    mut director: ResMut<WaveDirector>,
    mut match_state: ResMut<MatchState>,
    mut bus: ResMut<EventBus>,
) {
    if !director.execute {
        return;
    }
    match_state.elapsed += time.delta_secs();

    let score = match_state.score.get();
    if score < config.win.score && match_state.elapsed < config.win.time_secs {
        return;
    }

    director.execute = false;
    match_state.won = true;
    if let Err(err) = store.set_max(score) {
        warn!("failed to persist high score: {err}");
    }
    info!("match won at score {score} after {:.1}s", match_state.elapsed);
    bus.publish(topics::WIN_GAME, Payload::Empty);
}

pub fn plugin(app: &mut App) {
    app.add_systems(Startup, setup_waves).add_systems(
        Update,
        (advance_waves, check_win).run_if(in_state(GameState::InGame)),
    );
}
