//! Enemy behavior tests, pure ECS with injected time and messages.

use std::time::Duration;

use avian2d::prelude::*;
use bevy::ecs::message::{MessageReader, Messages};
use bevy::prelude::*;

use super::*;
use crate::common::test_utils::run_system_once;

fn base_world() -> World {
    let mut world = World::new();
    world.insert_resource(GameConfig::default());
    world.init_resource::<Messages<SpawnShotRequest>>();
    world.init_resource::<Messages<SpawnEffectRequest>>();
    world
}

fn advance_time(world: &mut World, dt: f32) {
    if world.get_resource::<Time>().is_none() {
        world.init_resource::<Time>();
    }
    world
        .resource_mut::<Time>()
        .advance_by(Duration::from_secs_f32(dt));
}

fn spawn_active_enemy(world: &mut World, kind: EnemyKind, side: Side, pos: Vec2) -> Entity {
    let config = world.resource::<GameConfig>().clone();
    let stats = *config.enemies.stats(kind);
    world
        .spawn((
            kind,
            side,
            PoolState::Active,
            ActivationEpoch(1),
            Health::full(stats.health),
            ShotBudget::new(stats.max_shots),
            FireControl::new(stats.fire_cooldown),
            Transform::from_translation(pos.extend(1.0)),
            LinearVelocity(kind.initial_velocity(side, stats.speed())),
        ))
        .id()
}

fn drain_shots(world: &mut World) -> Vec<SpawnShotRequest> {
    run_system_once(
        world,
        |mut reader: MessageReader<SpawnShotRequest>| -> Vec<SpawnShotRequest> {
            reader.read().copied().collect()
        },
    )
}

#[test]
fn entry_velocity_mirrors_by_kind_and_side() {
    let speed = Vec2::new(100.0, -50.0);

    assert_eq!(
        EnemyKind::Column.initial_velocity(Side::Left, speed),
        Vec2::new(100.0, -50.0)
    );
    assert_eq!(
        EnemyKind::Column.initial_velocity(Side::Right, speed),
        Vec2::new(-100.0, -50.0)
    );
    assert_eq!(
        EnemyKind::Side.initial_velocity(Side::Left, speed),
        Vec2::new(-100.0, -50.0)
    );
    assert_eq!(
        EnemyKind::Side.initial_velocity(Side::Right, speed),
        Vec2::new(100.0, -50.0)
    );
}

#[test]
fn enemy_fires_after_cooldown_and_respects_budget() {
    let mut world = base_world();
    let cooldown = world.resource::<GameConfig>().enemies.side.fire_cooldown;
    let max_shots = world.resource::<GameConfig>().enemies.side.max_shots;
    spawn_active_enemy(&mut world, EnemyKind::Side, Side::Left, Vec2::new(300.0, 200.0));

    // Not yet: the first cooldown has not elapsed.
    advance_time(&mut world, cooldown * 0.5);
    run_system_once(&mut world, enemy_fire);
    assert!(drain_shots(&mut world).is_empty());

    for _ in 0..(max_shots + 3) {
        advance_time(&mut world, cooldown + 0.01);
        run_system_once(&mut world, enemy_fire);
    }
    assert_eq!(drain_shots(&mut world).len() as u32, max_shots);
}

#[test]
fn side_enemy_shots_drop_straight_down() {
    let mut world = base_world();
    let config = world.resource::<GameConfig>().clone();
    spawn_active_enemy(&mut world, EnemyKind::Side, Side::Left, Vec2::new(0.0, 100.0));

    advance_time(&mut world, config.enemies.side.fire_cooldown + 0.01);
    run_system_once(&mut world, enemy_fire);

    let shots = drain_shots(&mut world);
    assert_eq!(shots.len(), 1);
    assert_eq!(shots[0].kind, ShotKind::Enemy);
    assert_eq!(shots[0].vel, Vec2::new(0.0, -config.enemies.side_shot_speed));
}

#[test]
fn column_enemy_shots_follow_its_travel_direction() {
    let mut world = base_world();
    let config = world.resource::<GameConfig>().clone();
    let stats = config.enemies.column;
    spawn_active_enemy(&mut world, EnemyKind::Column, Side::Left, Vec2::new(-200.0, 300.0));

    advance_time(&mut world, stats.fire_cooldown + 0.01);
    run_system_once(&mut world, enemy_fire);

    let shots = drain_shots(&mut world);
    assert_eq!(shots.len(), 1);
    assert_eq!(shots[0].vel, stats.speed() * 1.5);
}

#[test]
fn inactive_enemies_never_fire() {
    let mut world = base_world();
    let cooldown = world.resource::<GameConfig>().enemies.side.fire_cooldown;
    let e = spawn_active_enemy(&mut world, EnemyKind::Side, Side::Left, Vec2::ZERO);
    *world.entity_mut(e).get_mut::<PoolState>().unwrap() = PoolState::Inactive;

    advance_time(&mut world, cooldown * 2.0);
    run_system_once(&mut world, enemy_fire);

    assert!(drain_shots(&mut world).is_empty());
}

#[test]
fn side_enemy_bounces_off_the_playfield_edge() {
    let mut world = base_world();
    let x_max = world.resource::<GameConfig>().bounds.x_max;
    let e = spawn_active_enemy(
        &mut world,
        EnemyKind::Side,
        Side::Right,
        Vec2::new(x_max + 1.0, 100.0),
    );

    let vx_before = world.entity(e).get::<LinearVelocity>().unwrap().0.x;
    assert!(vx_before > 0.0);

    run_system_once(&mut world, side_bounce);

    let entity = world.entity(e);
    assert_eq!(entity.get::<LinearVelocity>().unwrap().0.x, -vx_before);
    assert_eq!(*entity.get::<Side>().unwrap(), Side::Left);

    // Already moving back inward: a second pass must not flip again.
    run_system_once(&mut world, side_bounce);
    assert_eq!(world.entity(e).get::<LinearVelocity>().unwrap().0.x, -vx_before);
}

#[test]
fn descent_flip_task_reverses_vertical_velocity() {
    let mut world = base_world();
    world.init_resource::<Messages<TaskFired>>();
    let e = spawn_active_enemy(&mut world, EnemyKind::Column, Side::Left, Vec2::new(0.0, 200.0));
    let vy_before = world.entity(e).get::<LinearVelocity>().unwrap().0.y;

    world.write_message(TaskFired { entity: e, kind: TaskKind::FlipDescent });
    run_system_once(&mut world, flip_descent_on_task);

    assert_eq!(world.entity(e).get::<LinearVelocity>().unwrap().0.y, -vy_before);
}

#[test]
fn dead_enemy_scores_flashes_and_returns_to_pool() {
    let mut world = base_world();
    world.init_resource::<EventBus>();
    let score = crate::events::Counter::default();
    {
        let cell = score.clone();
        world.resource_mut::<EventBus>().subscribe(
            topics::SCORE_RAISED,
            crate::events::HandlerId("test::score"),
            Box::new(move |payload: &Payload, _: &mut crate::events::Deferred| {
                cell.add(payload.count().unwrap_or(0));
            }),
        );
    }

    let e = spawn_active_enemy(&mut world, EnemyKind::Side, Side::Left, Vec2::new(50.0, 60.0));
    world.entity_mut(e).get_mut::<Health>().unwrap().damage(5);

    run_system_once(&mut world, enemy_death);

    let expected = world.resource::<GameConfig>().enemies.side.score_value;
    assert_eq!(score.get(), expected);
    assert_eq!(*world.entity(e).get::<PoolState>().unwrap(), PoolState::PendingReturn);

    let effects: Vec<SpawnEffectRequest> = run_system_once(
        &mut world,
        |mut reader: MessageReader<SpawnEffectRequest>| -> Vec<SpawnEffectRequest> {
            reader.read().copied().collect()
        },
    );
    assert_eq!(effects.len(), 1);
    assert_eq!(effects[0].pos, Vec2::new(50.0, 60.0));

    // A second pass over the same corpse must not score twice.
    run_system_once(&mut world, enemy_death);
    assert_eq!(score.get(), expected);
}
