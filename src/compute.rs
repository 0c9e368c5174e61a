//! Game-state construction, the per-tick pipeline, and floor progression.
//!
//! [`tick`] takes an immutable reference to the current [`GameState`] and
//! returns a brand-new one along with the [`GameEvent`]s the tick produced.
//! Side effects are limited to the injected RNG and draining the input queue.

use rand::Rng;
use tracing::{debug, info};

use crate::constants::{
    BOSS_FLOOR_INTERVAL, CANVAS_HEIGHT, CANVAS_WIDTH, CONTACT_DAMAGE, DOOR_MIN_DISTANCE_TILES,
    FLOOR_HEAL, MAX_PICKUPS, PLACEMENT_ATTEMPTS, TILE_SIZE,
};
use crate::difficulty::DifficultySettings;
use crate::entities::{
    Door, Enemy, EnemyKind, EntityRef, Pickup, PickupKind, Player, Projectile,
};
use crate::geometry::{collides, collides_with_walls, HasCollisionBox, Rect, Size, Vec2};
use crate::input::{Action, InputState};
use crate::map::{self, TileMap};

// ── Arena ────────────────────────────────────────────────────────────────────

/// Canvas and tile dimensions for a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub tile_size: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            tile_size: TILE_SIZE,
        }
    }
}

impl Arena {
    pub fn columns(&self) -> usize {
        (self.width / self.tile_size).floor() as usize
    }

    pub fn rows(&self) -> usize {
        (self.height / self.tile_size).floor() as usize
    }

    /// Where the player is placed at the start of every floor.
    pub fn spawn_point(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Uniform point whose `margin`-sized box still fits on the canvas.
    fn random_point(&self, margin: f32, rng: &mut impl Rng) -> Vec2 {
        let span_x = self.width - margin;
        let span_y = self.height - margin;
        let x = if span_x > 0.0 { rng.gen_range(0.0..span_x) } else { 0.0 };
        let y = if span_y > 0.0 { rng.gen_range(0.0..span_y) } else { 0.0 };
        Vec2::new(x, y)
    }
}

// ── State ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    GameOver,
}

/// Something that happened during a tick, for hooks, logs and UI.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    EnemyKilled { kind: EnemyKind, score: u32 },
    PlayerDamaged { amount: u32, health: u32 },
    PickupCollected { kind: PickupKind, health: u32 },
    DoorSpawned { position: Vec2 },
    FloorCleared { cleared: u32, next: u32 },
    PlayerDied { score: u32, floor: u32 },
}

/// The entire simulation state. Cloneable so [`tick`] can return a new copy
/// without mutating the original.
#[derive(Clone, Debug)]
pub struct GameState {
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    pub door: Option<Door>,
    pub map: TileMap,
    pub score: u32,
    pub floor: u32,
    pub difficulty: DifficultySettings,
    pub status: GameStatus,
    pub frame: u64,
    pub arena: Arena,
}

impl GameState {
    /// Every collidable entity, player first.
    pub fn entities(&self) -> impl Iterator<Item = EntityRef<'_>> {
        std::iter::once(EntityRef::Player(&self.player))
            .chain(self.enemies.iter().map(EntityRef::Enemy))
            .chain(self.projectiles.iter().map(EntityRef::Projectile))
            .chain(self.pickups.iter().map(EntityRef::Pickup))
            .chain(self.door.iter().map(EntityRef::Door))
    }

    pub fn is_over(&self) -> bool {
        self.status == GameStatus::GameOver
    }
}

// ── Constructors ─────────────────────────────────────────────────────────────

/// Build a fresh run: floor 1, zero score, a new map and the opening wave.
pub fn init_state(
    difficulty: DifficultySettings,
    arena: Arena,
    rng: &mut impl Rng,
) -> GameState {
    let player = Player::new(
        arena.spawn_point(),
        difficulty.player_health,
        difficulty.block_reduction,
    );
    let map = map::generate(
        arena.columns(),
        arena.rows(),
        arena.tile_size,
        Some(player.position),
        rng,
    );
    let mut state = GameState {
        player,
        enemies: Vec::new(),
        projectiles: Vec::new(),
        pickups: Vec::new(),
        door: None,
        map,
        score: 0,
        floor: 1,
        difficulty,
        status: GameStatus::Playing,
        frame: 0,
        arena,
    };
    let count = state.difficulty.opening_enemy_count();
    spawn_enemies(&mut state, EnemyKind::Normal, count, rng);
    info!(enemies = count, "new run started");
    state
}

/// Adds `count` enemies of `kind` at uniformly random canvas positions.
pub fn spawn_enemies(state: &mut GameState, kind: EnemyKind, count: u32, rng: &mut impl Rng) {
    for _ in 0..count {
        let position = state.arena.random_point(state.arena.tile_size, rng);
        let enemy =
            Enemy::spawn(kind, position, &state.difficulty).with_tile_size(state.arena.tile_size);
        state.enemies.push(enemy);
    }
}

// ── Floor progression ────────────────────────────────────────────────────────

/// Moves the run to the next floor.
///
/// Awards the clear bonus, heals the player a little, recentres them, rebuilds
/// the map around the new position and spawns the next wave. Pickups carry
/// over.
pub fn next_floor(state: &mut GameState, rng: &mut impl Rng) -> GameEvent {
    let cleared = state.floor;
    state.floor += 1;
    state.score += state.difficulty.floor_clear_bonus();
    state.door = None;
    state.enemies.clear();
    state.projectiles.clear();

    state.player.heal(FLOOR_HEAL);
    state.player.position = state.arena.spawn_point();

    state.map = map::generate(
        state.arena.columns(),
        state.arena.rows(),
        state.arena.tile_size,
        Some(state.player.position),
        rng,
    );

    let count = state.difficulty.enemy_count(state.floor);
    spawn_enemies(state, EnemyKind::Normal, count, rng);
    let boss = state.floor % BOSS_FLOOR_INTERVAL == 0;
    if boss {
        spawn_enemies(state, EnemyKind::Boss, 1, rng);
    }

    info!(floor = state.floor, enemies = count, boss, score = state.score, "floor cleared");
    GameEvent::FloorCleared {
        cleared,
        next: state.floor,
    }
}

/// Picks a door tile: a random interior tile whose tile-sized box is clear of
/// walls and at least [`DOOR_MIN_DISTANCE_TILES`] from the player. Falls back
/// to the grid centre, or to tile (1, 1) on an empty grid.
pub fn find_door_position(map: &TileMap, player: Vec2, rng: &mut impl Rng) -> Vec2 {
    let tile = map.tile_size();
    let (columns, rows) = (map.columns(), map.rows());

    if columns >= 3 && rows >= 3 {
        for _ in 0..PLACEMENT_ATTEMPTS {
            let tx = rng.gen_range(1..columns - 1);
            let ty = rng.gen_range(1..rows - 1);
            let candidate = Vec2::new(tx as f32 * tile, ty as f32 * tile);
            let clear = !collides_with_walls(map, &Rect::at(candidate, Size::square(tile)));
            if clear && candidate.distance(player) >= tile * DOOR_MIN_DISTANCE_TILES {
                return candidate;
            }
        }
    }

    if map.is_empty() {
        debug!("door placement on an empty grid, using default tile");
        Vec2::new(tile, tile)
    } else {
        debug!(attempts = PLACEMENT_ATTEMPTS, "no door tile found, using grid centre");
        Vec2::new((columns / 2) as f32 * tile, (rows / 2) as f32 * tile)
    }
}

fn spawn_door(state: &mut GameState, rng: &mut impl Rng) -> GameEvent {
    let position = find_door_position(&state.map, state.player.position, rng);
    state.door = Some(Door::new(position, state.arena.tile_size));
    debug!(x = position.x, y = position.y, "door spawned");
    GameEvent::DoorSpawned { position }
}

/// Rolls for a health pickup and places it on a wall-free spot. Returns
/// whether one was added.
pub fn maybe_spawn_pickup(state: &mut GameState, rng: &mut impl Rng) -> bool {
    if !rng.gen_bool(state.difficulty.pickup_spawn_rate) || state.pickups.len() >= MAX_PICKUPS {
        return false;
    }
    for _ in 0..PLACEMENT_ATTEMPTS {
        let position = state.arena.random_point(state.arena.tile_size, rng);
        let candidate = Pickup::new(position, PickupKind::Health);
        if !collides_with_walls(&state.map, &candidate.collision_box()) {
            state.pickups.push(candidate);
            return true;
        }
    }
    debug!("no free spot for a pickup");
    false
}

// ── Per-tick pipeline ────────────────────────────────────────────────────────

/// Advance the simulation by one frame.
///
/// `now_ms` is the host timestamp of this frame; it only drives the boss
/// wobble. All randomness comes through `rng` so callers control
/// determinism. A finished run is returned unchanged.
pub fn tick(
    state: &GameState,
    input: &mut InputState,
    now_ms: f64,
    rng: &mut impl Rng,
) -> (GameState, Vec<GameEvent>) {
    let mut next = state.clone();
    let mut events = Vec::new();
    if next.is_over() {
        return (next, events);
    }
    next.frame += 1;

    // ── 0. One-shot input ────────────────────────────────────────────────────
    for action in input.drain_events() {
        apply_action(&mut next, action, &mut events);
    }

    // ── 1. Player movement ───────────────────────────────────────────────────
    move_player(&mut next, input);

    // ── 2. Contact damage ────────────────────────────────────────────────────
    let touching = next
        .enemies
        .iter()
        .filter(|enemy| collides(&next.player, *enemy))
        .count();
    for _ in 0..touching {
        let dead = next.player.take_contact_damage(CONTACT_DAMAGE);
        events.push(GameEvent::PlayerDamaged {
            amount: CONTACT_DAMAGE,
            health: next.player.health,
        });
        if dead {
            end_run(&mut next, &mut events);
            return (next, events);
        }
    }

    // ── 3. Player cooldowns ──────────────────────────────────────────────────
    next.player.update();

    // ── 4. Door ──────────────────────────────────────────────────────────────
    if next
        .door
        .as_ref()
        .is_some_and(|door| collides(&next.player, door))
    {
        events.push(next_floor(&mut next, rng));
    }

    // ── 5. Enemies ───────────────────────────────────────────────────────────
    let target = next.player.position;
    for enemy in next.enemies.iter_mut() {
        let _ = enemy.update(target, now_ms, rng, &mut next.projectiles);
    }

    // ── 6. Floor cleared → door ──────────────────────────────────────────────
    if next.enemies.is_empty() && next.door.is_none() {
        events.push(spawn_door(&mut next, rng));
    }

    // ── 7–8. Pickups ─────────────────────────────────────────────────────────
    let _ = maybe_spawn_pickup(&mut next, rng);
    collect_pickups(&mut next, &mut events);

    // ── 9. Projectiles ───────────────────────────────────────────────────────
    advance_projectiles(&mut next, &mut events);
    if next.player.is_dead() {
        end_run(&mut next, &mut events);
    }

    (next, events)
}

fn apply_action(state: &mut GameState, action: Action, events: &mut Vec<GameEvent>) {
    if let Some(direction) = action.direction() {
        state.player.facing = direction;
        return;
    }
    match action {
        Action::Attack => {
            let tile = state.arena.tile_size;
            if let Some(report) = state
                .player
                .attack(&mut state.enemies, tile, &state.difficulty)
            {
                state.score += report.score;
                for kind in report.kills {
                    events.push(GameEvent::EnemyKilled {
                        kind,
                        score: kind.kill_score(&state.difficulty),
                    });
                }
            }
        }
        Action::BlockStart => state.player.start_blocking(),
        Action::BlockStop => state.player.stop_blocking(),
        // Session-level actions never reach the tick.
        _ => {}
    }
}

fn move_player(state: &mut GameState, input: &InputState) {
    let (dx, dy) = input.axis();
    let delta = state.player.movement_delta(dx, dy);
    state.player.is_moving = delta != Vec2::ZERO;
    if !state.player.is_moving {
        state.player.velocity = Vec2::ZERO;
        return;
    }

    let before = state.player.position;
    state.player.position += delta;
    if collides_with_walls(&state.map, &state.player.collision_box()) {
        state.player.position = before;
        state.player.velocity = Vec2::ZERO;
    } else {
        state.player.velocity = delta;
    }
}

/// Applies every pickup the player is standing on; a pickup stays on the map
/// when applying it had no effect.
fn collect_pickups(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let GameState {
        player, pickups, ..
    } = state;
    pickups.retain(|pickup| {
        if !collides(&*player, pickup) {
            return true;
        }
        if pickup.apply(player) {
            events.push(GameEvent::PickupCollected {
                kind: pickup.kind,
                health: player.health,
            });
            false
        } else {
            true
        }
    });
}

fn advance_projectiles(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let GameState {
        player,
        enemies,
        projectiles,
        map,
        score,
        difficulty,
        arena,
        ..
    } = state;

    projectiles.retain_mut(|projectile| {
        projectile.update();
        if projectile.is_expired(arena.width, arena.height) {
            return false;
        }
        if collides_with_walls(map, &projectile.collision_box()) {
            return false;
        }

        if projectile.is_enemy {
            if !collides(&*projectile, &*player) || player.is_dead() {
                return true;
            }
            let before = player.health;
            let _ = player.take_damage(projectile.damage);
            events.push(GameEvent::PlayerDamaged {
                amount: before - player.health,
                health: player.health,
            });
            return false;
        }

        let Some(index) = enemies.iter().position(|enemy| collides(&*projectile, enemy)) else {
            return true;
        };
        if enemies[index].take_hit(projectile.damage) {
            let kind = enemies.remove(index).kind;
            let gained = kind.kill_score(difficulty);
            *score += gained;
            events.push(GameEvent::EnemyKilled {
                kind,
                score: gained,
            });
        }
        false
    });
}

fn end_run(state: &mut GameState, events: &mut Vec<GameEvent>) {
    state.status = GameStatus::GameOver;
    info!(score = state.score, floor = state.floor, "player died");
    events.push(GameEvent::PlayerDied {
        score: state.score,
        floor: state.floor,
    });
}
