//! Contact routing. Physics only reports `CollisionStart`; everything about
//! who hurts whom is decided here from collision-layer memberships.
//!
//! Pairs that matter:
//!
//! * player shot x enemy: shot returns to the pool, enemy takes its damage.
//! * enemy shot x player: shot returns to the pool, player takes its damage
//!   unless the ship is mid-respawn.
//! * enemy x player: both take one point of contact damage.

use avian2d::prelude::*;
use bevy::ecs::message::MessageReader;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use crate::common::layers::Layer;
use crate::plugins::lifecycle::Health;
use crate::plugins::player::PlayerPhase;
use crate::plugins::pool::PoolState;
use crate::plugins::projectiles::Shot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Contact {
    PlayerShot,
    EnemyShot,
    Enemy,
    Player,
}

#[inline]
fn classify(layers: &CollisionLayers) -> Option<Contact> {
    if layers.memberships.has_all(Layer::PlayerShot) {
        Some(Contact::PlayerShot)
    } else if layers.memberships.has_all(Layer::EnemyShot) {
        Some(Contact::EnemyShot)
    } else if layers.memberships.has_all(Layer::Enemy) {
        Some(Contact::Enemy)
    } else if layers.memberships.has_all(Layer::Player) {
        Some(Contact::Player)
    } else {
        None
    }
}

pub fn process_collisions(
    mut started: MessageReader<CollisionStart>,
    q_layers: Query<&CollisionLayers>,
    mut q_shots: Query<(&Shot, &mut PoolState)>,
    mut q_health: Query<&mut Health>,
    q_phase: Query<&PlayerPhase>,
    // Per-frame dedupe so one shot never lands twice.
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for ev in started.read() {
        let Ok(l1) = q_layers.get(ev.collider1) else {
            continue;
        };
        let Ok(l2) = q_layers.get(ev.collider2) else {
            continue;
        };
        let (Some(c1), Some(c2)) = (classify(l1), classify(l2)) else {
            continue;
        };

        // Normalize each pair to a single orientation so it resolves once.
        for (contact_a, a, contact_b, b) in [
            (c1, ev.collider1, c2, ev.collider2),
            (c2, ev.collider2, c1, ev.collider1),
        ] {
            match (contact_a, contact_b) {
                (Contact::PlayerShot, Contact::Enemy) => {
                    apply_shot_hit(a, b, &mut q_shots, &mut q_health, &mut seen);
                }
                (Contact::EnemyShot, Contact::Player) => {
                    if matches!(q_phase.get(b), Ok(PlayerPhase::Fighting)) {
                        apply_shot_hit(a, b, &mut q_shots, &mut q_health, &mut seen);
                    }
                }
                (Contact::Enemy, Contact::Player) => {
                    if !matches!(q_phase.get(b), Ok(PlayerPhase::Fighting)) {
                        continue;
                    }
                    if let Ok(mut hp) = q_health.get_mut(a) {
                        hp.damage(1);
                    }
                    if let Ok(mut hp) = q_health.get_mut(b) {
                        hp.damage(1);
                    }
                }
                _ => continue,
            }
            break;
        }
    }
}

fn apply_shot_hit(
    shot_entity: Entity,
    target: Entity,
    q_shots: &mut Query<(&Shot, &mut PoolState)>,
    q_health: &mut Query<&mut Health>,
    seen: &mut HashSet<Entity>,
) {
    if !seen.insert(shot_entity) {
        return;
    }
    let Ok((shot, mut state)) = q_shots.get_mut(shot_entity) else {
        return;
    };
    if *state != PoolState::Active {
        return;
    }

    if let Ok(mut hp) = q_health.get_mut(target) {
        hp.damage(shot.damage);
    }
    *state = PoolState::PendingReturn;
}

pub fn plugin(app: &mut App) {
    app.add_systems(
        FixedPostUpdate,
        process_collisions
            .after(avian2d::collision::narrow_phase::CollisionEventSystems)
            .run_if(in_state(crate::common::state::GameState::InGame)),
    );
}
