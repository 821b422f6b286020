//! Player control and damage protocol.
//!
//! The player is not pooled; it is spawned on entering the match and scoped
//! to the `InGame` state. Losing a life plays out as a timed respawn during
//! which the ship is hidden and collides with nothing; losing the last life
//! persists the score and ends the match.

use avian2d::prelude::*;
use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::config::GameConfig;
use crate::events::{EventBus, Payload, topics};
use crate::persistence::HighScoreStore;
use crate::plugins::effects::SpawnEffectRequest;
use crate::plugins::lifecycle::{FireControl, Health};
use crate::plugins::projectiles::{ShotKind, SpawnShotRequest};
use crate::plugins::waves::MatchState;
use crate::tasks::{ActivationEpoch, TaskFired, TaskKind, TaskQueue};

#[derive(Component, Debug)]
pub struct Player {
    /// Health observed last frame; damage is detected by comparison so the
    /// response runs once per hit however many contacts landed.
    last_hp: i32,
    start: Vec2,
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PlayerPhase {
    #[default]
    Fighting,
    Respawning,
}

/// Intent gathered from the keyboard, consumed by the fixed-step movers.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct PlayerInput {
    pub move_axis: Vec2,
    pub fire: bool,
}

fn active_player_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Player, [Layer::Enemy, Layer::EnemyShot])
}

fn respawning_player_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Player, [] as [Layer; 0])
}

pub fn spawn_player(mut commands: Commands, config: Res<GameConfig>) {
    let start = config.player.start();
    commands.spawn((
        Name::new("Player"),
        Player {
            last_hp: config.player.lives,
            start,
        },
        PlayerPhase::Fighting,
        ActivationEpoch(0),
        Health::full(config.player.lives),
        FireControl::ready_now(config.player.fire_cooldown),
        Sprite {
            color: Color::srgb(0.3, 0.75, 1.0),
            custom_size: Some(Vec2::new(30.0, 24.0)),
            ..default()
        },
        Transform::from_translation(start.extend(1.0)),
        RigidBody::Kinematic,
        Collider::circle(13.0),
        CollisionEventsEnabled,
        active_player_layers(),
        LinearVelocity(Vec2::ZERO),
        DespawnOnExit(GameState::InGame),
    ));
}

/// Producer: reads the keyboard into [`PlayerInput`]. The input resource is
/// absent in headless apps, so this degrades to a no-op there.
pub fn gather_input(keys: Option<Res<ButtonInput<KeyCode>>>, mut input: ResMut<PlayerInput>) {
    let Some(keys) = keys else {
        return;
    };
    let mut axis = Vec2::ZERO;
    if keys.pressed(KeyCode::ArrowLeft) || keys.pressed(KeyCode::KeyA) {
        axis.x -= 1.0;
    }
    if keys.pressed(KeyCode::ArrowRight) || keys.pressed(KeyCode::KeyD) {
        axis.x += 1.0;
    }
    if keys.pressed(KeyCode::ArrowDown) || keys.pressed(KeyCode::KeyS) {
        axis.y -= 1.0;
    }
    if keys.pressed(KeyCode::ArrowUp) || keys.pressed(KeyCode::KeyW) {
        axis.y += 1.0;
    }
    input.move_axis = axis.normalize_or_zero();
    input.fire = keys.pressed(KeyCode::Space);
}

pub fn apply_movement(
    input: Res<PlayerInput>,
    config: Res<GameConfig>,
    mut q: Query<(&PlayerPhase, &mut LinearVelocity, &mut Transform), With<Player>>,
) {
    for (phase, mut vel, mut transform) in &mut q {
        if *phase != PlayerPhase::Fighting {
            vel.0 = Vec2::ZERO;
            continue;
        }
        vel.0 = input.move_axis * config.player.speed;
        transform.translation.x = config.bounds.clamp_x(transform.translation.x);
        transform.translation.y = config.bounds.clamp_y(transform.translation.y);
    }
}

pub fn request_player_shots(
    time: Res<Time>,
    input: Res<PlayerInput>,
    config: Res<GameConfig>,
    mut q: Query<(&PlayerPhase, &Transform, &mut FireControl), With<Player>>,
    mut shots: MessageWriter<SpawnShotRequest>,
) {
    for (phase, transform, mut control) in &mut q {
        control.tick(time.delta());
        if *phase != PlayerPhase::Fighting || !input.fire || !control.is_ready() {
            continue;
        }
        control.restart();
        shots.write(SpawnShotRequest {
            kind: ShotKind::Player,
            pos: transform.translation.truncate() + Vec2::new(0.0, 20.0),
            vel: Vec2::new(0.0, config.player.shot_speed),
            damage: config.player.shot_damage,
        });
    }
}

/// React to health lost this step: announce the new life count, flash an
/// explosion, then either end the match or start a timed respawn.
pub fn player_damage_response(
    mut commands: Commands,
    config: Res<GameConfig>,
    match_state: Res<MatchState>,
    store: Res<HighScoreStore>,
    mut bus: ResMut<EventBus>,
    mut tasks: ResMut<TaskQueue>,
    mut effects: MessageWriter<SpawnEffectRequest>,
    mut q: Query<(
        Entity,
        &mut Player,
        &mut PlayerPhase,
        &Health,
        &ActivationEpoch,
        &Transform,
        &mut Visibility,
        &mut CollisionLayers,
    )>,
) {
    for (entity, mut player, mut phase, health, epoch, transform, mut vis, mut layers) in &mut q {
        if health.hp >= player.last_hp {
            continue;
        }
        player.last_hp = health.hp;

        bus.publish(topics::LIVES_CHANGED, Payload::Count(health.hp));
        effects.write(SpawnEffectRequest {
            pos: transform.translation.truncate(),
        });

        if health.is_dead() {
            if let Err(err) = store.set_max(match_state.score.get()) {
                warn!("failed to persist high score: {err}");
            }
            bus.publish(topics::GAME_OVER, Payload::Empty);
            tasks.cancel_for(entity);
            commands.entity(entity).despawn();
        } else {
            *phase = PlayerPhase::Respawning;
            *vis = Visibility::Hidden;
            *layers = respawning_player_layers();
            tasks.cancel_for(entity);
            tasks.schedule_in(
                config.player.respawn_wait,
                entity,
                epoch.0,
                TaskKind::RespawnPlayer,
            );
        }
    }
}

pub fn respawn_on_task(
    mut fired: MessageReader<TaskFired>,
    mut q: Query<(
        &Player,
        &mut PlayerPhase,
        &mut Transform,
        &mut Visibility,
        &mut CollisionLayers,
    )>,
) {
    for task in fired.read() {
        if task.kind != TaskKind::RespawnPlayer {
            continue;
        }
        if let Ok((player, mut phase, mut transform, mut vis, mut layers)) = q.get_mut(task.entity)
        {
            transform.translation = player.start.extend(1.0);
            *phase = PlayerPhase::Fighting;
            *vis = Visibility::Visible;
            *layers = active_player_layers();
        }
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<PlayerInput>()
        .add_systems(OnEnter(GameState::InGame), spawn_player)
        .add_systems(
            Update,
            (
                gather_input,
                request_player_shots,
                respawn_on_task.after(crate::tasks::drive_tasks),
            )
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedUpdate,
            apply_movement.run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedPostUpdate,
            player_damage_response
                .after(crate::plugins::collision::process_collisions)
                .run_if(in_state(GameState::InGame)),
        );
}

#[cfg(test)]
mod tests;
