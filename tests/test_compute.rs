use dungeon_runner::compute::*;
use dungeon_runner::difficulty::{DifficultySettings, Preset};
use dungeon_runner::entities::*;
use dungeon_runner::geometry::Vec2;
use dungeon_runner::input::{Action, InputState};
use dungeon_runner::map::TileMap;

use rand::rngs::mock::StepRng;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Normal preset without random pickups, so ticks only depend on the scene.
fn quiet_difficulty() -> DifficultySettings {
    DifficultySettings {
        pickup_spawn_rate: 0.0,
        ..Preset::Normal.settings()
    }
}

fn make_state() -> GameState {
    let difficulty = quiet_difficulty();
    GameState {
        player: Player::new(
            Vec2::new(400.0, 300.0),
            difficulty.player_health,
            difficulty.block_reduction,
        ),
        enemies: Vec::new(),
        projectiles: Vec::new(),
        pickups: Vec::new(),
        door: None,
        map: TileMap::open(20, 15, 40.0),
        score: 0,
        floor: 1,
        difficulty,
        status: GameStatus::Playing,
        frame: 0,
        arena: Arena::default(),
    }
}

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

/// Every `gen_bool` below 1.0 comes out false: nobody shoots. Only safe for
/// ticks that never place a door, since range sampling would spin forever.
fn no_shots_rng() -> StepRng {
    StepRng::new(u64::MAX, 0)
}

/// Enemy shot that sits still on top of the player for one tick.
fn shot_on_player(damage: u32) -> Projectile {
    Projectile::new(
        ProjectileKind::Enemy,
        Vec2::new(410.0, 310.0),
        Vec2::new(1.0, 0.0),
        true,
    )
    .with_damage(damage)
    .with_speed(0.0)
}

fn far_enemy() -> Enemy {
    Enemy::spawn(EnemyKind::Normal, Vec2::new(20.0, 20.0), &quiet_difficulty())
}

// ── init_state ────────────────────────────────────────────────────────────────

#[test]
fn init_state_starts_floor_one() {
    let mut rng = seeded_rng();
    let s = init_state(Preset::Normal.settings(), Arena::default(), &mut rng);
    assert_eq!(s.floor, 1);
    assert_eq!(s.score, 0);
    assert_eq!(s.frame, 0);
    assert_eq!(s.status, GameStatus::Playing);
    assert_eq!(s.player.position, Vec2::new(400.0, 300.0));
    assert_eq!(s.player.health, 100);
    assert_eq!(s.enemies.len(), 3);
    assert!(s.projectiles.is_empty());
    assert!(s.pickups.is_empty());
    assert!(s.door.is_none());
    assert_eq!((s.map.columns(), s.map.rows()), (20, 15));
}

#[test]
fn spawned_enemies_use_arena_tile_size() {
    let arena = Arena {
        width: 400.0,
        height: 300.0,
        tile_size: 20.0,
    };
    let s = init_state(quiet_difficulty(), arena, &mut seeded_rng());
    assert!(!s.enemies.is_empty());
    for enemy in &s.enemies {
        assert_eq!(enemy.collision_offset, Vec2::new(6.0, 6.0));
    }
}

#[test]
fn init_state_uses_preset_health_and_count() {
    let mut rng = seeded_rng();
    let easy = init_state(Preset::Easy.settings(), Arena::default(), &mut rng);
    assert_eq!(easy.player.health, 150);
    assert_eq!(easy.enemies.len(), 2); // floor(3 × 0.75)

    let hard = init_state(Preset::Hard.settings(), Arena::default(), &mut rng);
    assert_eq!(hard.player.health, 75);
    assert_eq!(hard.enemies.len(), 4); // floor(3 × 1.5)
    assert!(hard.enemies.iter().all(|e| e.health == 75));
}

#[test]
fn init_state_enemies_spawn_on_canvas() {
    let mut rng = seeded_rng();
    let s = init_state(Preset::Hard.settings(), Arena::default(), &mut rng);
    for enemy in &s.enemies {
        assert!((0.0..760.0).contains(&enemy.position.x));
        assert!((0.0..560.0).contains(&enemy.position.y));
    }
}

// ── tick: damage ──────────────────────────────────────────────────────────────

#[test]
fn projectile_hit_leaves_player_alive() {
    let mut s = make_state();
    s.player.health = 30;
    s.enemies.push(far_enemy());
    s.projectiles.push(shot_on_player(25));

    let (s2, events) = tick(&s, &mut InputState::new(), 0.0, &mut seeded_rng());
    assert_eq!(s2.player.health, 5);
    assert_eq!(s2.status, GameStatus::Playing);
    assert!(s2.projectiles.iter().all(|p| p.position != Vec2::new(410.0, 310.0)));
    assert!(events.contains(&GameEvent::PlayerDamaged {
        amount: 25,
        health: 5
    }));
}

#[test]
fn blocking_halves_projectile_damage_rounding_down() {
    let mut s = make_state();
    s.player.health = 30;
    s.player.start_blocking();
    s.enemies.push(far_enemy());
    s.projectiles.push(shot_on_player(25));

    let (s2, _) = tick(&s, &mut InputState::new(), 0.0, &mut seeded_rng());
    assert!(s2.player.is_blocking);
    assert_eq!(s2.player.health, 18);
}

#[test]
fn contact_damage_stacks_per_enemy_and_ignores_block() {
    let mut s = make_state();
    s.player.start_blocking();
    let on_player = Enemy::spawn(EnemyKind::Normal, Vec2::new(405.0, 305.0), &s.difficulty);
    s.enemies.push(on_player.clone());
    s.enemies.push(on_player);

    let (s2, events) = tick(&s, &mut InputState::new(), 0.0, &mut no_shots_rng());
    assert_eq!(s2.player.health, 98);
    let hits = events
        .iter()
        .filter(|e| matches!(e, GameEvent::PlayerDamaged { amount: 1, .. }))
        .count();
    assert_eq!(hits, 2);
}

#[test]
fn death_ends_run_and_freezes_state() {
    let mut s = make_state();
    s.player.health = 1;
    s.score = 700;
    s.enemies
        .push(Enemy::spawn(EnemyKind::Normal, Vec2::new(405.0, 305.0), &s.difficulty));

    let (s2, events) = tick(&s, &mut InputState::new(), 0.0, &mut seeded_rng());
    assert_eq!(s2.status, GameStatus::GameOver);
    assert_eq!(s2.player.health, 0);
    assert_eq!(
        events.last(),
        Some(&GameEvent::PlayerDied {
            score: 700,
            floor: 1
        })
    );

    let mut input = InputState::new();
    input.press(Action::Attack);
    let (s3, events) = tick(&s2, &mut input, 16.0, &mut seeded_rng());
    assert!(events.is_empty());
    assert_eq!(s3.frame, s2.frame);
    assert_eq!(s3.enemies, s2.enemies);
}

#[test]
fn tick_leaves_previous_state_untouched() {
    let mut s = make_state();
    s.enemies.push(far_enemy());
    let before = s.clone();
    let _ = tick(&s, &mut InputState::new(), 0.0, &mut seeded_rng());
    assert_eq!(s.player, before.player);
    assert_eq!(s.enemies, before.enemies);
    assert_eq!(s.frame, 0);
}

// ── tick: attack ──────────────────────────────────────────────────────────────

#[test]
fn attack_kills_weak_enemy_and_scores() {
    let mut s = make_state();
    s.player.facing = Direction::Down;
    s.enemies.push(Enemy::with_modifiers(
        EnemyKind::Normal,
        Vec2::new(400.0, 340.0),
        0.5,
        1.0,
    ));
    assert_eq!(s.enemies[0].health, 25);

    let mut input = InputState::new();
    input.press(Action::Attack);
    let (s2, events) = tick(&s, &mut input, 0.0, &mut seeded_rng());

    assert!(s2.enemies.is_empty());
    assert_eq!(s2.score, 100);
    assert!(events.contains(&GameEvent::EnemyKilled {
        kind: EnemyKind::Normal,
        score: 100
    }));
    assert_eq!(s2.player.attack_cooldown, 19);
}

#[test]
fn attack_score_follows_multiplier() {
    let mut s = make_state();
    s.difficulty = DifficultySettings {
        pickup_spawn_rate: 0.0,
        ..Preset::Easy.settings()
    };
    s.enemies.push(Enemy::with_modifiers(
        EnemyKind::Normal,
        Vec2::new(400.0, 340.0),
        0.5,
        1.0,
    ));
    let mut input = InputState::new();
    input.press(Action::Attack);
    let (s2, _) = tick(&s, &mut input, 0.0, &mut seeded_rng());
    assert_eq!(s2.score, 50);
}

#[test]
fn attack_while_blocking_does_nothing() {
    let mut s = make_state();
    s.player.start_blocking();
    s.enemies.push(Enemy::with_modifiers(
        EnemyKind::Normal,
        Vec2::new(400.0, 340.0),
        0.5,
        1.0,
    ));
    let mut input = InputState::new();
    input.press(Action::Attack);
    let (s2, _) = tick(&s, &mut input, 0.0, &mut seeded_rng());
    assert_eq!(s2.enemies.len(), 1);
    assert_eq!(s2.score, 0);
    assert_eq!(s2.player.attack_cooldown, 0);
}

#[test]
fn player_shot_kills_enemy() {
    let mut s = make_state();
    let mut enemy = Enemy::spawn(EnemyKind::Normal, Vec2::new(100.0, 100.0), &s.difficulty);
    enemy.health = 10;
    s.enemies.push(enemy);
    s.enemies.push(far_enemy());
    // Lands inside the first enemy after it steps toward the player.
    s.projectiles.push(
        Projectile::new(ProjectileKind::Player, Vec2::new(105.0, 105.0), Vec2::ZERO, false)
            .with_speed(0.0),
    );

    let (s2, events) = tick(&s, &mut InputState::new(), 0.0, &mut seeded_rng());
    assert_eq!(s2.enemies.len(), 1);
    assert!(s2.projectiles.is_empty());
    assert_eq!(s2.score, 100);
    assert!(matches!(events[0], GameEvent::EnemyKilled { .. }));
}

// ── tick: movement ────────────────────────────────────────────────────────────

#[test]
fn held_direction_moves_player() {
    let mut s = make_state();
    s.enemies.push(far_enemy());
    let mut input = InputState::new();
    input.press(Action::MoveRight);

    let (s2, _) = tick(&s, &mut input, 0.0, &mut seeded_rng());
    assert_eq!(s2.player.position, Vec2::new(403.0, 300.0));
    assert_eq!(s2.player.facing, Direction::Right);
    assert!(s2.player.is_moving);

    // Still held on the next tick, no new press needed.
    let (s3, _) = tick(&s2, &mut input, 16.0, &mut seeded_rng());
    assert_eq!(s3.player.position, Vec2::new(406.0, 300.0));
}

#[test]
fn movement_into_wall_is_reverted() {
    let mut cells = vec![vec![0u8; 20]; 15];
    cells[7][11] = 1;
    cells[8][11] = 1;
    let mut s = make_state();
    s.map = TileMap::from_cells(cells, 40.0).unwrap();
    s.player.position = Vec2::new(406.0, 300.0);
    s.enemies.push(far_enemy());

    let mut input = InputState::new();
    input.press(Action::MoveRight);
    let (s2, _) = tick(&s, &mut input, 0.0, &mut seeded_rng());
    assert_eq!(s2.player.position, Vec2::new(406.0, 300.0));
    assert_eq!(s2.player.velocity, Vec2::ZERO);
}

#[test]
fn diagonal_movement_is_normalised() {
    let mut s = make_state();
    s.enemies.push(far_enemy());
    let mut input = InputState::new();
    input.press(Action::MoveDown);
    input.press(Action::MoveLeft);

    let (s2, _) = tick(&s, &mut input, 0.0, &mut seeded_rng());
    let moved = s2.player.position.distance(s.player.position);
    assert!((moved - 3.0).abs() < 1e-4);
}

// ── tick: floors & doors ──────────────────────────────────────────────────────

#[test]
fn cleared_floor_spawns_door_away_from_player() {
    let s = make_state();
    let (s2, events) = tick(&s, &mut InputState::new(), 0.0, &mut seeded_rng());
    let door = s2.door.as_ref().expect("door should spawn");
    assert!(door.position.distance(s2.player.position) >= 120.0);
    assert!(matches!(events.last(), Some(GameEvent::DoorSpawned { .. })));

    // Only one door per floor.
    let (s3, events) = tick(&s2, &mut InputState::new(), 16.0, &mut seeded_rng());
    assert_eq!(s3.door, s2.door);
    assert!(!events.iter().any(|e| matches!(e, GameEvent::DoorSpawned { .. })));
}

#[test]
fn touching_door_advances_floor() {
    let mut s = make_state();
    s.door = Some(Door::new(Vec2::new(400.0, 300.0), 40.0));
    s.score = 300;

    let (s2, events) = tick(&s, &mut InputState::new(), 0.0, &mut seeded_rng());
    assert_eq!(s2.floor, 2);
    assert_eq!(s2.score, 800);
    assert_eq!(s2.enemies.len(), 4); // 3 + 2/2
    assert!(events.contains(&GameEvent::FloorCleared {
        cleared: 1,
        next: 2
    }));
}

#[test]
fn door_falls_back_to_grid_centre_on_walled_map() {
    let map = TileMap::from_cells(vec![vec![1u8; 20]; 15], 40.0).unwrap();
    let pos = find_door_position(&map, Vec2::new(400.0, 300.0), &mut seeded_rng());
    assert_eq!(pos, Vec2::new(400.0, 280.0));
}

#[test]
fn door_avoids_walls_and_border() {
    let mut rng = seeded_rng();
    let map = TileMap::open(20, 15, 40.0);
    for _ in 0..50 {
        let pos = find_door_position(&map, Vec2::new(400.0, 300.0), &mut rng);
        assert!(pos.x >= 40.0 && pos.x <= 18.0 * 40.0);
        assert!(pos.y >= 40.0 && pos.y <= 13.0 * 40.0);
        assert!(pos.distance(Vec2::new(400.0, 300.0)) >= 120.0);
    }
}

#[test]
fn next_floor_resets_floor_state() {
    let mut s = make_state();
    s.player.health = 95;
    s.player.position = Vec2::new(100.0, 100.0);
    s.projectiles.push(shot_on_player(10));
    s.pickups.push(Pickup::new(Vec2::new(60.0, 60.0), PickupKind::Health));
    s.door = Some(Door::new(Vec2::new(40.0, 40.0), 40.0));

    let event = next_floor(&mut s, &mut seeded_rng());
    assert_eq!(
        event,
        GameEvent::FloorCleared {
            cleared: 1,
            next: 2
        }
    );
    assert_eq!(s.player.health, 100);
    assert_eq!(s.player.position, Vec2::new(400.0, 300.0));
    assert_eq!(s.score, 500);
    assert!(s.door.is_none());
    assert!(s.projectiles.is_empty());
    assert_eq!(s.pickups.len(), 1);
}

#[test]
fn fifth_floor_adds_a_boss() {
    let mut s = make_state();
    s.floor = 4;
    let _ = next_floor(&mut s, &mut seeded_rng());
    assert_eq!(s.floor, 5);
    let bosses = s.enemies.iter().filter(|e| e.kind == EnemyKind::Boss).count();
    let normals = s.enemies.iter().filter(|e| e.kind == EnemyKind::Normal).count();
    assert_eq!(bosses, 1);
    assert_eq!(normals, 5);
}

#[test]
fn non_boss_floor_has_no_boss() {
    let mut s = make_state();
    s.floor = 5;
    let _ = next_floor(&mut s, &mut seeded_rng());
    assert!(s.enemies.iter().all(|e| e.kind == EnemyKind::Normal));
}

// ── tick: pickups ─────────────────────────────────────────────────────────────

#[test]
fn health_pickup_is_consumed() {
    let mut s = make_state();
    s.player.health = 50;
    s.enemies.push(far_enemy());
    s.pickups.push(Pickup::new(Vec2::new(405.0, 305.0), PickupKind::Health));

    let (s2, events) = tick(&s, &mut InputState::new(), 0.0, &mut seeded_rng());
    assert_eq!(s2.player.health, 75);
    assert!(s2.pickups.is_empty());
    assert!(events.contains(&GameEvent::PickupCollected {
        kind: PickupKind::Health,
        health: 75
    }));
}

#[test]
fn unusable_pickup_stays_on_the_map() {
    let mut s = make_state();
    s.enemies.push(far_enemy());
    s.pickups.push(Pickup::new(Vec2::new(405.0, 305.0), PickupKind::Unknown));

    let (s2, _) = tick(&s, &mut InputState::new(), 0.0, &mut seeded_rng());
    assert_eq!(s2.pickups.len(), 1);
}

#[test]
fn pickup_spawn_respects_cap() {
    let mut s = make_state();
    s.difficulty.pickup_spawn_rate = 1.0;
    let mut rng = seeded_rng();
    for _ in 0..10 {
        let _ = maybe_spawn_pickup(&mut s, &mut rng);
    }
    assert_eq!(s.pickups.len(), 3);
}

#[test]
fn pickup_never_spawns_on_walls() {
    let mut cells = vec![vec![1u8; 20]; 15];
    cells[7][10] = 0;
    let mut s = make_state();
    s.map = TileMap::from_cells(cells, 40.0).unwrap();
    s.difficulty.pickup_spawn_rate = 1.0;
    let mut rng = seeded_rng();
    for _ in 0..5 {
        let _ = maybe_spawn_pickup(&mut s, &mut rng);
    }
    for pickup in &s.pickups {
        assert_eq!(s.map.tile_of(pickup.position), (10, 7));
    }
}

// ── tick: projectiles ─────────────────────────────────────────────────────────

#[test]
fn projectile_stops_at_wall() {
    let mut cells = vec![vec![0u8; 20]; 15];
    cells[2][2] = 1;
    let mut s = make_state();
    s.map = TileMap::from_cells(cells, 40.0).unwrap();
    s.enemies.push(Enemy::spawn(EnemyKind::Normal, Vec2::new(700.0, 500.0), &s.difficulty));
    s.projectiles.push(
        Projectile::new(ProjectileKind::Enemy, Vec2::new(90.0, 90.0), Vec2::new(0.0, 1.0), true)
            .with_speed(0.0),
    );

    let (s2, _) = tick(&s, &mut InputState::new(), 0.0, &mut seeded_rng());
    assert!(s2
        .projectiles
        .iter()
        .all(|p| p.position != Vec2::new(90.0, 90.0)));
}

#[test]
fn projectile_leaving_canvas_is_removed() {
    let mut s = make_state();
    s.enemies.push(Enemy::spawn(EnemyKind::Normal, Vec2::new(700.0, 500.0), &s.difficulty));
    s.projectiles.push(Projectile::new(
        ProjectileKind::Enemy,
        Vec2::new(798.0, 10.0),
        Vec2::new(1.0, 0.0),
        true,
    ));

    let (s2, _) = tick(&s, &mut InputState::new(), 0.0, &mut seeded_rng());
    assert!(s2.projectiles.iter().all(|p| p.position.x < 798.0));
}

#[test]
fn entities_lists_player_first() {
    let mut s = make_state();
    s.enemies.push(far_enemy());
    s.door = Some(Door::new(Vec2::new(40.0, 40.0), 40.0));
    let labels: Vec<&str> = s.entities().map(|e| e.label()).collect();
    assert_eq!(labels, vec!["player", "enemy", "door"]);
}
