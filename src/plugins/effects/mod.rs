//! Explosion flashes: pooled sprites with a short timed life and a random
//! roll so repeats read less uniform.

use std::f32::consts::TAU;

use bevy::ecs::message::{Message, MessageReader, Messages};
use bevy::prelude::*;
use rand::Rng;

use crate::common::state::GameState;
use crate::config::GameConfig;
use crate::plugins::core::SpawnRng;
use crate::plugins::pool::{ObjectPool, PoolState, PoolTag};
use crate::tasks::{ActivationEpoch, TaskKind, TaskQueue};

#[derive(Message, Clone, Copy, Debug)]
pub struct SpawnEffectRequest {
    pub pos: Vec2,
}

pub fn activate_explosions(
    mut commands: Commands,
    mut requests: MessageReader<SpawnEffectRequest>,
    mut pool: ResMut<ObjectPool>,
    mut tasks: ResMut<TaskQueue>,
    mut rng: ResMut<SpawnRng>,
    config: Res<GameConfig>,
) {
    for request in requests.read() {
        let Some(lease) = pool.acquire(&mut commands, PoolTag::Explosion) else {
            debug!("explosion pool exhausted, dropping effect request");
            continue;
        };

        let roll = rng.0.gen_range(0.0..TAU);
        commands.entity(lease.entity).insert((
            PoolState::Active,
            ActivationEpoch(lease.epoch),
            Transform::from_translation(request.pos.extend(3.0))
                .with_rotation(Quat::from_rotation_z(roll)),
            Visibility::Visible,
        ));

        tasks.cancel_for(lease.entity);
        tasks.schedule_in(
            config.explosion_lifetime,
            lease.entity,
            lease.epoch,
            TaskKind::ReclaimPooled,
        );
    }
}

fn update_effect_messages(mut messages: ResMut<Messages<SpawnEffectRequest>>) {
    messages.update();
}

pub fn plugin(app: &mut App) {
    app.init_resource::<Messages<SpawnEffectRequest>>()
        .add_systems(
            Update,
            activate_explosions
                .after(crate::plugins::enemies::activate_enemies)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(PostUpdate, update_effect_messages);
}
