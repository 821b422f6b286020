//! Delayed one-shot tasks tied to a pooled entity's activation epoch.
//!
//! A pooled entity that gets released and re-acquired before its timer fires
//! must not receive the stale callback. Every activation bumps the entity's
//! epoch; a task captures the epoch at schedule time and is dropped on fire
//! if the entity's current epoch no longer matches.

use bevy::ecs::message::{Message, MessageReader, MessageWriter, Messages};
use bevy::prelude::*;

use crate::common::state::GameState;

/// Generation counter for a pooled slot, mirrored onto the entity at each
/// activation. Epoch 0 is the freshly instantiated, never-acquired state.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ActivationEpoch(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    RespawnPlayer,
    FlipDescent,
    ReclaimPooled,
}

/// Emitted when a scheduled task comes due and its epoch still matches.
#[derive(Message, Clone, Copy, Debug)]
pub struct TaskFired {
    pub entity: Entity,
    pub kind: TaskKind,
}

struct ScheduledTask {
    due_at: f64,
    entity: Entity,
    epoch: u32,
    kind: TaskKind,
}

#[derive(Resource, Default)]
pub struct TaskQueue {
    now: f64,
    tasks: Vec<ScheduledTask>,
}

impl TaskQueue {
    pub fn schedule_in(&mut self, delay: f32, entity: Entity, epoch: u32, kind: TaskKind) {
        self.tasks.push(ScheduledTask {
            due_at: self.now + f64::from(delay.max(0.0)),
            entity,
            epoch,
            kind,
        });
    }

    /// Drop every pending task for `entity`, regardless of epoch.
    pub fn cancel_for(&mut self, entity: Entity) {
        self.tasks.retain(|task| task.entity != entity);
    }

    /// Advance the clock and collect tasks that came due, earliest first.
    pub fn advance(&mut self, dt: f32) -> Vec<(Entity, u32, TaskKind)> {
        self.now += f64::from(dt);
        let now = self.now;

        let mut due = Vec::new();
        self.tasks.retain(|task| {
            if task.due_at <= now {
                due.push((task.due_at, task.entity, task.epoch, task.kind));
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.0.total_cmp(&b.0));
        due.into_iter().map(|(_, entity, epoch, kind)| (entity, epoch, kind)).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn now(&self) -> f64 {
        self.now
    }
}

/// Tick the queue and emit [`TaskFired`] for tasks whose target entity still
/// carries the epoch captured at schedule time.
pub fn drive_tasks(
    time: Res<Time>,
    mut queue: ResMut<TaskQueue>,
    mut fired: MessageWriter<TaskFired>,
    q_epoch: Query<&ActivationEpoch>,
) {
    for (entity, epoch, kind) in queue.advance(time.delta_secs()) {
        match q_epoch.get(entity) {
            Ok(current) if current.0 == epoch => {
                fired.write(TaskFired { entity, kind });
            }
            Ok(current) => {
                debug!(
                    "dropping stale {kind:?} task for {entity}: epoch {epoch} != {}",
                    current.0
                );
            }
            Err(_) => {
                debug!("dropping {kind:?} task for despawned entity {entity}");
            }
        }
    }
}

fn update_task_messages(mut messages: ResMut<Messages<TaskFired>>) {
    messages.update();
}

pub fn plugin(app: &mut App) {
    app.init_resource::<TaskQueue>()
        .init_resource::<Messages<TaskFired>>()
        .add_systems(Update, drive_tasks.run_if(in_state(GameState::InGame)))
        .add_systems(PostUpdate, update_task_messages);
}
