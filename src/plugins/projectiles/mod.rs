//! Shot activation. Producers (player input, enemy fire) publish
//! [`SpawnShotRequest`] messages; this plugin's allocator is the only system
//! that leases shot slots from the pool, so producers never race each other
//! for the same slot.

use avian2d::prelude::*;
use bevy::ecs::message::{Message, MessageReader, Messages};
use bevy::prelude::*;

use crate::common::state::GameState;
use crate::config::GameConfig;
use crate::plugins::pool::{ObjectPool, PoolState, PoolTag, templates};
use crate::tasks::{ActivationEpoch, TaskKind, TaskQueue};

/// Damage dealt on contact. Lives on the pooled entity and is overwritten at
/// each activation.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shot {
    pub damage: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShotKind {
    Player,
    Enemy,
}

impl ShotKind {
    pub fn pool_tag(self) -> PoolTag {
        match self {
            ShotKind::Player => PoolTag::PlayerShot,
            ShotKind::Enemy => PoolTag::EnemyShot,
        }
    }
}

#[derive(Message, Clone, Copy, Debug)]
pub struct SpawnShotRequest {
    pub kind: ShotKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: i32,
}

/// Lease a pooled shot per request and arm its lifetime timer. A request that
/// finds its pool exhausted is dropped, not queued.
pub fn activate_shots(
    mut commands: Commands,
    mut requests: MessageReader<SpawnShotRequest>,
    mut pool: ResMut<ObjectPool>,
    mut tasks: ResMut<TaskQueue>,
    config: Res<GameConfig>,
) {
    for request in requests.read() {
        let tag = request.kind.pool_tag();
        let Some(lease) = pool.acquire(&mut commands, tag) else {
            debug!("{tag:?} pool exhausted, dropping shot request");
            continue;
        };

        commands.entity(lease.entity).insert((
            PoolState::Active,
            ActivationEpoch(lease.epoch),
            Shot { damage: request.damage },
            Transform::from_translation(request.pos.extend(2.0)),
            LinearVelocity(request.vel),
            Visibility::Visible,
            templates::active_layers(tag),
        ));

        tasks.cancel_for(lease.entity);
        tasks.schedule_in(
            config.shot_lifetime,
            lease.entity,
            lease.epoch,
            TaskKind::ReclaimPooled,
        );
    }
}

fn update_shot_messages(mut messages: ResMut<Messages<SpawnShotRequest>>) {
    messages.update();
}

pub fn plugin(app: &mut App) {
    app.init_resource::<Messages<SpawnShotRequest>>()
        .add_systems(
            Update,
            activate_shots
                .after(crate::plugins::player::request_player_shots)
                .after(crate::plugins::enemies::enemy_fire)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(PostUpdate, update_shot_messages);
}
