//! Tuning constants shared by the simulation and the renderer.
//!
//! All distances are in canvas pixels, all durations in ticks unless the name
//! says otherwise.

// ── Canvas & tiles ───────────────────────────────────────────────────────────

pub const CANVAS_WIDTH: f32 = 800.0;
pub const CANVAS_HEIGHT: f32 = 600.0;
pub const TILE_SIZE: f32 = 40.0;

// ── Entity sizes ─────────────────────────────────────────────────────────────

pub const SPRITE_SIZE: f32 = 32.0;
pub const PLAYER_SIZE: f32 = 32.0;
pub const ENEMY_SIZE: f32 = 24.0;
pub const BOSS_SIZE: f32 = 48.0;
pub const PROJECTILE_SIZE: f32 = 5.0;
pub const PICKUP_SIZE: f32 = TILE_SIZE / 2.0;

// ── Movement ─────────────────────────────────────────────────────────────────

pub const PLAYER_SPEED: f32 = 3.0;
pub const ENEMY_SPEED: f32 = 1.5;
pub const BOSS_SPEED: f32 = 1.0;
/// Speed factor applied to the player while the shield is up.
pub const BLOCK_SPEED_MULTIPLIER: f32 = 0.5;
/// Radians of bearing wobble applied to boss movement.
pub const BOSS_WOBBLE_AMPLITUDE: f32 = 0.5;

// ── Combat ───────────────────────────────────────────────────────────────────

pub const ATTACK_DAMAGE: u32 = 25;
pub const ATTACK_COOLDOWN: u32 = 20;
/// The attack hitbox stays visible while the cooldown is above this value.
pub const ATTACK_FLASH_THRESHOLD: u32 = 15;
pub const BLOCK_DURATION: u32 = 30;
pub const BLOCK_RECHARGE: u32 = 60;
/// Damage dealt per tick by each enemy touching the player.
pub const CONTACT_DAMAGE: u32 = 1;
pub const PROJECTILE_MAX_AGE: u32 = 300;

// ── Pickups & floors ─────────────────────────────────────────────────────────

pub const HEALTH_PICKUP_VALUE: u32 = 25;
pub const MAX_PICKUPS: usize = 3;
pub const FLOOR_HEAL: u32 = 20;
pub const BASE_ENEMY_COUNT: u32 = 3;
pub const BOSS_FLOOR_INTERVAL: u32 = 5;
pub const PLACEMENT_ATTEMPTS: u32 = 100;
/// Minimum door distance from the player, in tiles.
pub const DOOR_MIN_DISTANCE_TILES: f32 = 3.0;
pub const WALL_PROBABILITY: f64 = 0.2;

// ── Score table ──────────────────────────────────────────────────────────────

pub const SCORE_ENEMY_KILL: u32 = 100;
pub const SCORE_BOSS_KILL: u32 = 1000;
pub const SCORE_FLOOR_CLEAR: u32 = 500;

// ── Timing ───────────────────────────────────────────────────────────────────

pub const FRAME_RATE: u32 = 60;
