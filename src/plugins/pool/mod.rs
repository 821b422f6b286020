//! Object pool for everything spawned in bulk: enemies, shots, explosions.
//!
//! Pooled entities are pre-spawned once and never despawned during play.
//! "Release" is a collision-layer and visibility toggle, not a structural
//! change, so returning an entity never moves archetypes. Lifecycle:
//!
//! * `Inactive`: hidden, empty collision filters, owned by the free list.
//! * `Active`: handed out through [`ObjectPool::acquire`], fully live.
//! * `PendingReturn`: marked dead by gameplay; [`return_to_pool_commit`]
//!   folds it back to `Inactive` at the end of the fixed step.
//!
//! Only the commit system transitions entities into `Inactive`; everything
//! else requests a return by setting `PendingReturn`.

use avian2d::prelude::*;
use bevy::ecs::message::{Message, MessageReader, Messages};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::tasks::{TaskFired, TaskKind, drive_tasks};

pub mod templates;


/// Which pool an entity belongs to. Doubles as the pooled-entity marker.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolTag {
    ColumnEnemy,
    SideEnemy,
    PlayerShot,
    EnemyShot,
    Explosion,
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PoolState {
    #[default]
    Inactive,
    Active,
    PendingReturn,
}

/// Preallocation policy for one pool, part of [`GameConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSpec {
    pub tag: PoolTag,
    pub initial: usize,
    pub expand: bool,
}

struct PoolEntry {
    entity: Entity,
    tag: PoolTag,
    active: bool,
    epoch: u32,
}

/// An activation handle: the entity plus the epoch stamped on it. Timers
/// scheduled against the lease die with it when the slot is recycled.
#[derive(Clone, Copy, Debug)]
pub struct Lease {
    pub entity: Entity,
    pub epoch: u32,
}

#[derive(Resource, Default)]
pub struct ObjectPool {
    specs: Vec<PoolSpec>,
    entries: Vec<PoolEntry>,
}

impl ObjectPool {
    pub fn new(specs: Vec<PoolSpec>) -> Self {
        Self { specs, entries: Vec::new() }
    }

    pub fn spec(&self, tag: PoolTag) -> Option<&PoolSpec> {
        self.specs.iter().find(|spec| spec.tag == tag)
    }

    /// Total slots for `tag`, active or not.
    pub fn count(&self, tag: PoolTag) -> usize {
        self.entries.iter().filter(|entry| entry.tag == tag).count()
    }

    pub fn active_count(&self, tag: PoolTag) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.tag == tag && entry.active)
            .count()
    }

    pub fn is_active(&self, entity: Entity) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.entity == entity && entry.active)
    }

    pub fn epoch_of(&self, entity: Entity) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.entity == entity)
            .map(|entry| entry.epoch)
    }

    /// Track a pre-spawned inactive entity.
    pub fn register(&mut self, entity: Entity, tag: PoolTag) {
        self.entries.push(PoolEntry {
            entity,
            tag,
            active: false,
            epoch: 0,
        });
    }

    /// Hand out an inactive slot, instantiating a new one if the pool is
    /// exhausted and its spec allows growth. The caller finishes activation
    /// by inserting the live component set on the leased entity.
    pub fn acquire(&mut self, commands: &mut Commands, tag: PoolTag) -> Option<Lease> {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.tag == tag && !entry.active)
        {
            entry.active = true;
            entry.epoch += 1;
            return Some(Lease {
                entity: entry.entity,
                epoch: entry.epoch,
            });
        }

        let Some(spec) = self.spec(tag) else {
            debug!("acquire on unknown pool {tag:?}");
            return None;
        };
        if !spec.expand {
            debug!("pool {tag:?} exhausted and fixed-size, acquire denied");
            return None;
        }

        let entity = templates::instantiate(commands, tag);
        self.entries.push(PoolEntry {
            entity,
            tag,
            active: true,
            epoch: 1,
        });
        Some(Lease { entity, epoch: 1 })
    }

    fn release(&mut self, entity: Entity) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.entity == entity) {
            entry.active = false;
        }
    }
}

/// Asks the commit pipeline to return every active pooled entity. Written by
/// the match controller when the game is won.
#[derive(Message, Default, Clone, Copy, Debug)]
pub struct ReleaseAll;

/// Pre-spawn every pool's initial inventory, inactive and hidden.
pub fn warm_pool(mut commands: Commands, mut pool: ResMut<ObjectPool>) {
    let specs = pool.specs.clone();
    for spec in specs {
        for _ in 0..spec.initial {
            let entity = templates::instantiate(&mut commands, spec.tag);
            pool.register(entity, spec.tag);
        }
    }
}

pub fn release_all_on_request(
    mut requests: MessageReader<ReleaseAll>,
    mut q: Query<&mut PoolState, With<PoolTag>>,
) {
    if requests.read().next().is_none() {
        return;
    }
    requests.clear();
    for mut state in &mut q {
        if *state == PoolState::Active {
            *state = PoolState::PendingReturn;
        }
    }
}

/// Fold `PendingReturn` entities back to `Inactive`. The only writer of the
/// inactive state: hides the entity, zeroes velocity, empties collision
/// filters and returns the slot to the free list.
pub fn return_to_pool_commit(
    mut pool: ResMut<ObjectPool>,
    mut q: Query<(
        Entity,
        &PoolTag,
        &mut PoolState,
        &mut Visibility,
        Option<&mut LinearVelocity>,
        Option<&mut CollisionLayers>,
    )>,
) {
    for (entity, tag, mut state, mut vis, vel, layers) in &mut q {
        if *state != PoolState::PendingReturn {
            continue;
        }

        *state = PoolState::Inactive;
        *vis = Visibility::Hidden;
        if let Some(mut vel) = vel {
            *vel = LinearVelocity(Vec2::ZERO);
        }
        if let Some(mut layers) = layers {
            *layers = templates::inactive_layers(*tag);
        }

        pool.release(entity);
    }
}

/// Lifetime expiry: a [`TaskKind::ReclaimPooled`] task marks its target for
/// return. Stale epochs never get here; the task driver drops them.
pub fn reclaim_on_task(
    mut fired: MessageReader<TaskFired>,
    mut q: Query<&mut PoolState, With<PoolTag>>,
) {
    for task in fired.read() {
        if task.kind != TaskKind::ReclaimPooled {
            continue;
        }
        if let Ok(mut state) = q.get_mut(task.entity)
            && *state == PoolState::Active
        {
            *state = PoolState::PendingReturn;
        }
    }
}

/// Reclaim active pooled entities that drifted well outside the playfield.
pub fn offscreen_reclaim(
    config: Res<GameConfig>,
    mut q: Query<(&Transform, &mut PoolState), With<PoolTag>>,
) {
    const MARGIN: f32 = 80.0;
    for (transform, mut state) in &mut q {
        if *state == PoolState::Active
            && !config.bounds.contains(transform.translation.truncate(), MARGIN)
        {
            *state = PoolState::PendingReturn;
        }
    }
}

fn update_release_messages(mut messages: ResMut<Messages<ReleaseAll>>) {
    messages.update();
}

pub fn plugin(app: &mut App) {
    app.init_resource::<Messages<ReleaseAll>>()
        .add_systems(Startup, warm_pool)
        // Ungated: the win-time sweep must still land after leaving InGame.
        // ReleaseAll is consumed in Update; a fixed tick may not run within
        // the two-frame message window.
        .add_systems(
            Update,
            (
                reclaim_on_task.after(drive_tasks),
                offscreen_reclaim,
                release_all_on_request,
            ),
        )
        .add_systems(
            FixedPostUpdate,
            return_to_pool_commit
                .after(crate::plugins::collision::process_collisions)
                .after(crate::plugins::enemies::enemy_death)
                .after(crate::plugins::player::player_damage_response),
        )
        .add_systems(PostUpdate, update_release_messages);
}
