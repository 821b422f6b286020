//! Enemy behavior: activation from wave spawn orders, movement quirks per
//! kind, budgeted fire, and death accounting.
//!
//! Two kinds share one pooled template shape and differ by data:
//!
//! * `Column`: dives from the top edge, drifting toward the playfield
//!   center; after a fixed delay its descent flips and it climbs back out.
//! * `Side`: enters from a side edge moving across, bounces off the
//!   horizontal playfield limits, and fires straight down.

use avian2d::prelude::*;
use bevy::ecs::message::{Message, MessageReader, MessageWriter, Messages};
use bevy::prelude::*;

use crate::common::side::Side;
use crate::common::state::GameState;
use crate::config::GameConfig;
use crate::events::{EventBus, Payload, topics};
use crate::plugins::effects::SpawnEffectRequest;
use crate::plugins::lifecycle::{FireControl, Health, ShotBudget};
use crate::plugins::pool::{ObjectPool, PoolState, PoolTag, templates};
use crate::plugins::projectiles::{ShotKind, SpawnShotRequest};
use crate::tasks::{ActivationEpoch, TaskFired, TaskKind, TaskQueue};

use serde::{Deserialize, Serialize};

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Column,
    Side,
}

impl EnemyKind {
    pub fn pool_tag(self) -> PoolTag {
        match self {
            EnemyKind::Column => PoolTag::ColumnEnemy,
            EnemyKind::Side => PoolTag::SideEnemy,
        }
    }

    /// Entry velocity for an enemy activated on `side`. Column enemies drift
    /// inward while descending; side enemies cross toward the far edge.
    pub fn initial_velocity(self, side: Side, speed: Vec2) -> Vec2 {
        match (self, side) {
            (EnemyKind::Column, Side::Left) => Vec2::new(speed.x, speed.y),
            (EnemyKind::Column, Side::Right) => Vec2::new(-speed.x, speed.y),
            (EnemyKind::Side, Side::Left) => Vec2::new(-speed.x, speed.y),
            (EnemyKind::Side, Side::Right) => Vec2::new(speed.x, speed.y),
        }
    }
}

#[derive(Message, Clone, Copy, Debug)]
pub struct SpawnEnemyRequest {
    pub kind: EnemyKind,
    pub side: Side,
    pub pos: Vec2,
}

/// Lease and arm a pooled enemy per spawn order. Sole consumer of
/// [`SpawnEnemyRequest`], so concurrent waves cannot double-book a slot.
pub fn activate_enemies(
    mut commands: Commands,
    mut requests: MessageReader<SpawnEnemyRequest>,
    mut pool: ResMut<ObjectPool>,
    mut tasks: ResMut<TaskQueue>,
    config: Res<GameConfig>,
) {
    for request in requests.read() {
        let tag = request.kind.pool_tag();
        let Some(lease) = pool.acquire(&mut commands, tag) else {
            debug!("{tag:?} pool exhausted, dropping spawn order");
            continue;
        };

        let stats = config.enemies.stats(request.kind);
        commands.entity(lease.entity).insert((
            PoolState::Active,
            ActivationEpoch(lease.epoch),
            request.side,
            Health::full(stats.health),
            ShotBudget::new(stats.max_shots),
            FireControl::new(stats.fire_cooldown),
            Transform::from_translation(request.pos.extend(1.0)),
            LinearVelocity(request.kind.initial_velocity(request.side, stats.speed())),
            Visibility::Visible,
            templates::active_layers(tag),
        ));

        tasks.cancel_for(lease.entity);
        if request.kind == EnemyKind::Column {
            tasks.schedule_in(
                config.enemies.column_flip_after,
                lease.entity,
                lease.epoch,
                TaskKind::FlipDescent,
            );
        }
    }
}

/// A column enemy's timed descent reversal: it climbs back out the way it
/// came, on the same horizontal drift.
pub fn flip_descent_on_task(
    mut fired: MessageReader<TaskFired>,
    mut q: Query<(&PoolState, &mut LinearVelocity), With<EnemyKind>>,
) {
    for task in fired.read() {
        if task.kind != TaskKind::FlipDescent {
            continue;
        }
        if let Ok((state, mut vel)) = q.get_mut(task.entity)
            && *state == PoolState::Active
        {
            vel.0.y = -vel.0.y;
        }
    }
}

/// Side enemies reflect off the horizontal playfield limits.
pub fn side_bounce(
    config: Res<GameConfig>,
    mut q: Query<(&EnemyKind, &PoolState, &Transform, &mut LinearVelocity, &mut Side)>,
) {
    for (kind, state, transform, mut vel, mut side) in &mut q {
        if *kind != EnemyKind::Side || *state != PoolState::Active {
            continue;
        }
        let x = transform.translation.x;
        let leaving = (x <= config.bounds.x_min && vel.0.x < 0.0)
            || (x >= config.bounds.x_max && vel.0.x > 0.0);
        if leaving {
            vel.0.x = -vel.0.x;
            *side = side.flipped();
        }
    }
}

/// Tick cooldowns and fire while the per-activation budget lasts. Column
/// enemies shoot along their own travel direction, scaled up; side enemies
/// drop shots straight down.
pub fn enemy_fire(
    time: Res<Time>,
    config: Res<GameConfig>,
    mut q: Query<(
        &EnemyKind,
        &PoolState,
        &Transform,
        &LinearVelocity,
        &mut FireControl,
        &mut ShotBudget,
    )>,
    mut shots: MessageWriter<SpawnShotRequest>,
) {
    for (kind, state, transform, vel, mut control, mut budget) in &mut q {
        control.tick(time.delta());
        if *state != PoolState::Active || !control.is_ready() {
            continue;
        }
        if !budget.try_spend() {
            continue;
        }
        control.restart();

        let stats = config.enemies.stats(*kind);
        let shot_vel = match kind {
            EnemyKind::Column => vel.0 * 1.5,
            EnemyKind::Side => Vec2::new(0.0, -config.enemies.side_shot_speed),
        };
        let pos = transform.translation.truncate() - Vec2::new(0.0, 18.0);
        shots.write(SpawnShotRequest {
            kind: ShotKind::Enemy,
            pos,
            vel: shot_vel,
            damage: stats.shot_damage,
        });
    }
}

/// Score dead enemies, flash an explosion, and hand the slot back.
pub fn enemy_death(
    config: Res<GameConfig>,
    mut bus: ResMut<EventBus>,
    mut effects: MessageWriter<SpawnEffectRequest>,
    mut q: Query<(&EnemyKind, &Health, &Transform, &mut PoolState)>,
) {
    for (kind, health, transform, mut state) in &mut q {
        if *state != PoolState::Active || !health.is_dead() {
            continue;
        }
        let stats = config.enemies.stats(*kind);
        bus.publish(topics::SCORE_RAISED, Payload::Count(stats.score_value));
        effects.write(SpawnEffectRequest {
            pos: transform.translation.truncate(),
        });
        *state = PoolState::PendingReturn;
    }
}

fn update_enemy_messages(mut messages: ResMut<Messages<SpawnEnemyRequest>>) {
    messages.update();
}

pub fn plugin(app: &mut App) {
    app.init_resource::<Messages<SpawnEnemyRequest>>()
        .add_systems(
            Update,
            (
                activate_enemies.after(crate::plugins::waves::advance_waves),
                flip_descent_on_task.after(crate::tasks::drive_tasks),
                enemy_fire,
            )
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedUpdate,
            side_bounce.run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedPostUpdate,
            enemy_death
                .after(crate::plugins::collision::process_collisions)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(PostUpdate, update_enemy_messages);
}

#[cfg(test)]
mod tests;
