//! Per-tag entity templates and collision-layer tables.
//!
//! Every pooled entity is spawned here exactly once, inactive. Activation
//! and release only mutate component values on top of these templates.

use avian2d::prelude::*;
use bevy::prelude::*;

use super::{PoolState, PoolTag};
use crate::common::layers::Layer;
use crate::common::side::Side;
use crate::plugins::enemies::EnemyKind;
use crate::plugins::lifecycle::{FireControl, Health, ShotBudget};
use crate::plugins::projectiles::Shot;
use crate::tasks::ActivationEpoch;

pub fn active_layers(tag: PoolTag) -> CollisionLayers {
    match tag {
        PoolTag::ColumnEnemy | PoolTag::SideEnemy => {
            CollisionLayers::new(Layer::Enemy, [Layer::Player, Layer::PlayerShot])
        }
        PoolTag::PlayerShot => CollisionLayers::new(Layer::PlayerShot, [Layer::Enemy]),
        PoolTag::EnemyShot => CollisionLayers::new(Layer::EnemyShot, [Layer::Player]),
        PoolTag::Explosion => CollisionLayers::new(Layer::Default, [] as [Layer; 0]),
    }
}

/// Disabled without structural changes: empty filters collide with nothing.
pub fn inactive_layers(tag: PoolTag) -> CollisionLayers {
    let membership = match tag {
        PoolTag::ColumnEnemy | PoolTag::SideEnemy => Layer::Enemy,
        PoolTag::PlayerShot => Layer::PlayerShot,
        PoolTag::EnemyShot => Layer::EnemyShot,
        PoolTag::Explosion => Layer::Default,
    };
    CollisionLayers::new(membership, [] as [Layer; 0])
}

/// Spawn one inactive entity for `tag` and return it. Values inserted here
/// are placeholders; activation overwrites them from config.
pub fn instantiate(commands: &mut Commands, tag: PoolTag) -> Entity {
    let mut entity = commands.spawn((
        tag,
        PoolState::Inactive,
        ActivationEpoch(0),
        Transform::from_xyz(0.0, 0.0, 1.0),
        Visibility::Hidden,
    ));

    match tag {
        PoolTag::ColumnEnemy | PoolTag::SideEnemy => {
            let kind = if tag == PoolTag::ColumnEnemy {
                EnemyKind::Column
            } else {
                EnemyKind::Side
            };
            entity.insert((
                Name::new(format!("{kind:?}Enemy(Pooled)")),
                kind,
                Side::Left,
                Health::full(1),
                ShotBudget::new(0),
                FireControl::new(1.0),
                Sprite {
                    color: Color::srgb(0.85, 0.3, 0.3),
                    custom_size: Some(Vec2::splat(28.0)),
                    ..default()
                },
                RigidBody::Kinematic,
                Sensor,
                Collider::circle(14.0),
                CollisionEventsEnabled,
                inactive_layers(tag),
                LinearVelocity(Vec2::ZERO),
            ));
        }
        PoolTag::PlayerShot | PoolTag::EnemyShot => {
            let color = if tag == PoolTag::PlayerShot {
                Color::srgb(1.0, 0.85, 0.3)
            } else {
                Color::srgb(0.95, 0.4, 0.9)
            };
            entity.insert((
                Name::new("Shot(Pooled)"),
                Shot { damage: 1 },
                Sprite {
                    color,
                    custom_size: Some(Vec2::new(4.0, 10.0)),
                    ..default()
                },
                RigidBody::Kinematic,
                Sensor,
                Collider::circle(3.0),
                CollisionEventsEnabled,
                inactive_layers(tag),
                LinearVelocity(Vec2::ZERO),
            ));
        }
        PoolTag::Explosion => {
            entity.insert((
                Name::new("Explosion(Pooled)"),
                Sprite {
                    color: Color::srgb(1.0, 0.6, 0.1),
                    custom_size: Some(Vec2::splat(36.0)),
                    ..default()
                },
            ));
        }
    }

    entity.id()
}
