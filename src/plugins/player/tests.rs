//! Player tests, pure ECS.

use avian2d::prelude::*;
use bevy::ecs::message::{MessageReader, Messages};
use bevy::prelude::*;

use super::*;
use crate::common::test_utils::run_system_once;
use crate::events::{Counter, Deferred, Flag, HandlerId};

fn base_world() -> World {
    let mut world = World::new();
    world.insert_resource(GameConfig::default());
    world.init_resource::<MatchState>();
    world.insert_resource(PlayerInput::default());
    world.insert_resource(HighScoreStore::new(scratch_score_path()));
    world.init_resource::<EventBus>();
    world.init_resource::<TaskQueue>();
    world.init_resource::<Messages<SpawnEffectRequest>>();
    world.init_resource::<Messages<SpawnShotRequest>>();
    world.init_resource::<Messages<TaskFired>>();
    world
}

fn scratch_score_path() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("sky_squadron_player_test_{}.ron", std::process::id()))
}

fn spawn_test_player(world: &mut World) -> Entity {
    run_system_once(world, spawn_player);
    let mut q = world.query_filtered::<Entity, With<Player>>();
    q.single(world).unwrap()
}

#[test]
fn fighting_player_moves_along_the_input_axis() {
    let mut world = base_world();
    let e = spawn_test_player(&mut world);

    world.resource_mut::<PlayerInput>().move_axis = Vec2::new(1.0, 0.0);
    run_system_once(&mut world, apply_movement);

    let speed = world.resource::<GameConfig>().player.speed;
    assert_eq!(world.entity(e).get::<LinearVelocity>().unwrap().0, Vec2::new(speed, 0.0));
}

#[test]
fn respawning_player_does_not_move() {
    let mut world = base_world();
    let e = spawn_test_player(&mut world);
    *world.entity_mut(e).get_mut::<PlayerPhase>().unwrap() = PlayerPhase::Respawning;

    world.resource_mut::<PlayerInput>().move_axis = Vec2::new(1.0, 0.0);
    run_system_once(&mut world, apply_movement);

    assert_eq!(world.entity(e).get::<LinearVelocity>().unwrap().0, Vec2::ZERO);
}

#[test]
fn movement_clamps_the_ship_to_the_playfield() {
    let mut world = base_world();
    let e = spawn_test_player(&mut world);
    let bounds = world.resource::<GameConfig>().bounds;

    world.entity_mut(e).get_mut::<Transform>().unwrap().translation.x = bounds.x_max + 50.0;
    run_system_once(&mut world, apply_movement);

    assert_eq!(
        world.entity(e).get::<Transform>().unwrap().translation.x,
        bounds.x_max
    );
}

#[test]
fn losing_a_life_hides_the_ship_and_schedules_a_respawn() {
    let mut world = base_world();
    let e = spawn_test_player(&mut world);
    let lives = Counter::default();
    {
        let cell = lives.clone();
        world.resource_mut::<EventBus>().subscribe(
            crate::events::topics::LIVES_CHANGED,
            HandlerId("test::lives"),
            Box::new(move |payload: &crate::events::Payload, _: &mut Deferred| {
                cell.set(payload.count().unwrap_or(0));
            }),
        );
    }

    world.entity_mut(e).get_mut::<Health>().unwrap().damage(1);
    run_system_once(&mut world, player_damage_response);

    let starting_lives = world.resource::<GameConfig>().player.lives;
    assert_eq!(lives.get(), starting_lives - 1);
    {
        let entity = world.entity(e);
        assert_eq!(*entity.get::<PlayerPhase>().unwrap(), PlayerPhase::Respawning);
        assert_eq!(*entity.get::<Visibility>().unwrap(), Visibility::Hidden);
    }
    assert_eq!(world.resource::<TaskQueue>().len(), 1);

    // Same health next step: no second response.
    run_system_once(&mut world, player_damage_response);
    assert_eq!(world.resource::<TaskQueue>().len(), 1);
}

#[test]
fn respawn_task_restores_the_fighting_phase_at_the_start_position() {
    let mut world = base_world();
    let e = spawn_test_player(&mut world);
    let start = world.resource::<GameConfig>().player.start();

    {
        let mut entity = world.entity_mut(e);
        *entity.get_mut::<PlayerPhase>().unwrap() = PlayerPhase::Respawning;
        *entity.get_mut::<Visibility>().unwrap() = Visibility::Hidden;
        entity.get_mut::<Transform>().unwrap().translation = Vec3::new(200.0, 50.0, 1.0);
    }

    world.write_message(TaskFired { entity: e, kind: TaskKind::RespawnPlayer });
    run_system_once(&mut world, respawn_on_task);

    let entity = world.entity(e);
    assert_eq!(*entity.get::<PlayerPhase>().unwrap(), PlayerPhase::Fighting);
    assert_eq!(*entity.get::<Visibility>().unwrap(), Visibility::Visible);
    assert_eq!(entity.get::<Transform>().unwrap().translation, start.extend(1.0));
}

#[test]
fn losing_the_last_life_announces_game_over_and_despawns() {
    let mut world = base_world();
    let _ = std::fs::remove_file(scratch_score_path());
    let e = spawn_test_player(&mut world);
    let over = Flag::default();
    {
        let flag = over.clone();
        world.resource_mut::<EventBus>().subscribe(
            crate::events::topics::GAME_OVER,
            HandlerId("test::over"),
            Box::new(move |_: &crate::events::Payload, _: &mut Deferred| flag.raise()),
        );
    }

    world.resource::<MatchState>().score.add(35);
    let lives = world.resource::<GameConfig>().player.lives;
    world.entity_mut(e).get_mut::<Health>().unwrap().damage(lives);
    run_system_once(&mut world, player_damage_response);

    assert!(over.is_raised());
    assert!(world.get_entity(e).is_err());
    assert_eq!(world.resource::<HighScoreStore>().read(), 35);

    let _ = std::fs::remove_file(scratch_score_path());
}

#[test]
fn player_fires_only_while_fighting_and_off_cooldown() {
    let mut world = base_world();
    world.init_resource::<Time>();
    let e = spawn_test_player(&mut world);
    world.resource_mut::<PlayerInput>().fire = true;

    run_system_once(&mut world, request_player_shots);
    let shots: Vec<SpawnShotRequest> = run_system_once(
        &mut world,
        |mut reader: MessageReader<SpawnShotRequest>| -> Vec<SpawnShotRequest> {
            reader.read().copied().collect()
        },
    );
    assert_eq!(shots.len(), 1);
    assert_eq!(shots[0].kind, ShotKind::Player);
    assert!(shots[0].vel.y > 0.0);

    // Cooldown was restarted and no time passed, so no second shot.
    run_system_once(&mut world, request_player_shots);
    let shots: Vec<SpawnShotRequest> = run_system_once(
        &mut world,
        |mut reader: MessageReader<SpawnShotRequest>| -> Vec<SpawnShotRequest> {
            reader.read().copied().collect()
        },
    );
    assert_eq!(shots.len(), 1);

    *world.entity_mut(e).get_mut::<PlayerPhase>().unwrap() = PlayerPhase::Respawning;
    world.resource_mut::<Messages<SpawnShotRequest>>().update();
    world.resource_mut::<Messages<SpawnShotRequest>>().update();
    world
        .resource_mut::<Time>()
        .advance_by(std::time::Duration::from_secs(1));
    run_system_once(&mut world, request_player_shots);
    let shots: Vec<SpawnShotRequest> = run_system_once(
        &mut world,
        |mut reader: MessageReader<SpawnShotRequest>| -> Vec<SpawnShotRequest> {
            reader.read().copied().collect()
        },
    );
    assert!(shots.is_empty());
}
