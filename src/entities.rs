//! Entity types and their per-entity behaviour.
//!
//! Entities only ever see what the tick hands them: the player position, the
//! enemy list for an attack, or a projectile sink for shooting. The game
//! state in [`crate::compute`] owns every collection.

use rand::Rng;

use crate::constants::{
    ATTACK_COOLDOWN, ATTACK_DAMAGE, BLOCK_DURATION, BLOCK_RECHARGE, BLOCK_SPEED_MULTIPLIER,
    BOSS_SIZE, BOSS_SPEED, BOSS_WOBBLE_AMPLITUDE, ENEMY_SIZE, ENEMY_SPEED, HEALTH_PICKUP_VALUE,
    PICKUP_SIZE, PLAYER_SIZE, PLAYER_SPEED, PROJECTILE_MAX_AGE, PROJECTILE_SIZE, SCORE_BOSS_KILL,
    SCORE_ENEMY_KILL, SPRITE_SIZE, TILE_SIZE,
};
use crate::difficulty::{scale, DifficultySettings};
use crate::geometry::{collides, HasCollisionBox, Rect, Size, Vec2};

// ── Shared enums ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    /// Facing implied by a velocity: the dominant axis wins, ties go vertical.
    pub fn from_velocity(velocity: Vec2) -> Self {
        if velocity.x.abs() > velocity.y.abs() {
            if velocity.x > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if velocity.y > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

// ── Player ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub position: Vec2,
    pub dimensions: Size,
    pub sprite_size: Size,
    /// Last applied movement delta; informational only.
    pub velocity: Vec2,
    pub health: u32,
    pub initial_health: u32,
    pub facing: Direction,
    pub is_moving: bool,
    pub attack_cooldown: u32,
    pub is_blocking: bool,
    /// Counts down the active block, then the recharge after it.
    pub block_cooldown: u32,
    pub block_duration: u32,
    pub block_recharge: u32,
    pub block_reduction: f32,
}

/// What a successful swing did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttackReport {
    pub hits: usize,
    pub kills: Vec<EnemyKind>,
    pub score: u32,
}

impl Player {
    pub fn new(position: Vec2, health: u32, block_reduction: f32) -> Self {
        Self {
            position,
            dimensions: Size::square(PLAYER_SIZE),
            sprite_size: Size::square(SPRITE_SIZE),
            velocity: Vec2::ZERO,
            health,
            initial_health: health,
            facing: Direction::Down,
            is_moving: false,
            attack_cooldown: 0,
            is_blocking: false,
            block_cooldown: 0,
            block_duration: BLOCK_DURATION,
            block_recharge: BLOCK_RECHARGE,
            block_reduction,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.position.x + self.dimensions.width / 2.0,
            self.position.y + self.dimensions.height / 2.0,
        )
    }

    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// One-tile square next to the player on the facing side.
    pub fn attack_hitbox(&self, tile_size: f32) -> Rect {
        let c = self.center();
        let half_w = self.dimensions.width / 2.0;
        let half_h = self.dimensions.height / 2.0;
        let (x, y) = match self.facing {
            Direction::Up => (c.x - tile_size / 2.0, c.y - tile_size - half_h),
            Direction::Down => (c.x - tile_size / 2.0, c.y + half_h),
            Direction::Left => (c.x - tile_size - half_w, c.y - tile_size / 2.0),
            Direction::Right => (c.x + half_w, c.y - tile_size / 2.0),
        };
        Rect::new(x, y, tile_size, tile_size)
    }

    pub fn can_attack(&self) -> bool {
        self.attack_cooldown == 0 && !self.is_blocking
    }

    /// Swings at every enemy under the hitbox. Dead enemies are removed and
    /// their kill score is returned. `None` when the swing is not allowed.
    pub fn attack(
        &mut self,
        enemies: &mut Vec<Enemy>,
        tile_size: f32,
        difficulty: &DifficultySettings,
    ) -> Option<AttackReport> {
        if !self.can_attack() {
            return None;
        }
        let hitbox = self.attack_hitbox(tile_size);
        let mut report = AttackReport::default();

        enemies.retain_mut(|enemy| {
            if !collides(&hitbox, &*enemy) {
                return true;
            }
            report.hits += 1;
            if enemy.take_hit(ATTACK_DAMAGE) {
                report.score += enemy.kind.kill_score(difficulty);
                report.kills.push(enemy.kind);
                return false;
            }
            true
        });

        self.attack_cooldown = ATTACK_COOLDOWN;
        Some(report)
    }

    pub fn start_blocking(&mut self) {
        if !self.is_blocking && self.block_cooldown == 0 {
            self.is_blocking = true;
            self.block_cooldown = self.block_duration;
        }
    }

    pub fn stop_blocking(&mut self) {
        if self.is_blocking {
            self.is_blocking = false;
            self.block_cooldown = self.block_recharge;
        }
    }

    /// Applies damage, reduced (rounding down) while blocking. Returns `true`
    /// when this leaves the player dead.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        let effective = if self.is_blocking {
            scale(amount, 1.0 - self.block_reduction)
        } else {
            amount
        };
        self.health = self.health.saturating_sub(effective);
        self.is_dead()
    }

    /// Contact damage path: ignores the shield.
    pub fn take_contact_damage(&mut self, amount: u32) -> bool {
        self.health = self.health.saturating_sub(amount);
        self.is_dead()
    }

    pub fn heal(&mut self, amount: u32) {
        self.health = self.health.saturating_add(amount).min(self.initial_health);
    }

    pub fn current_speed(&self) -> f32 {
        if self.is_blocking {
            PLAYER_SPEED * BLOCK_SPEED_MULTIPLIER
        } else {
            PLAYER_SPEED
        }
    }

    /// Displacement for a raw input direction (`-1`, `0` or `1` per axis).
    /// Diagonals are scaled by 1/√2.
    pub fn movement_delta(&self, dx: f32, dy: f32) -> Vec2 {
        let (dx, dy) = if dx != 0.0 && dy != 0.0 {
            (
                dx * std::f32::consts::FRAC_1_SQRT_2,
                dy * std::f32::consts::FRAC_1_SQRT_2,
            )
        } else {
            (dx, dy)
        };
        Vec2::new(dx, dy).scale(self.current_speed())
    }

    pub fn move_by(&mut self, dx: f32, dy: f32) {
        let delta = self.movement_delta(dx, dy);
        self.position += delta;
    }

    /// Advances cooldowns by one tick.
    pub fn update(&mut self) {
        self.attack_cooldown = self.attack_cooldown.saturating_sub(1);

        if self.block_cooldown > 0 {
            self.block_cooldown -= 1;
            if self.is_blocking && self.block_cooldown == 0 {
                self.is_blocking = false;
                self.block_cooldown = self.block_recharge;
            }
        }
    }
}

impl HasCollisionBox for Player {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn dimensions(&self) -> Size {
        self.dimensions
    }

    fn collision_offset(&self) -> Vec2 {
        let dx = (SPRITE_SIZE - PLAYER_SIZE) / 2.0;
        Vec2::new(dx, dx)
    }
}

// ── Enemies ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Normal,
    Boss,
}

/// Unscaled per-kind numbers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    pub base_health: u32,
    pub base_damage: u32,
    pub shoot_range: f32,
    /// Chance per tick of attempting a shot.
    pub shoot_chance: f64,
    /// Multiplier on the projectile kind's base speed.
    pub projectile_speed: f32,
}

impl EnemyKind {
    pub fn stats(self) -> EnemyStats {
        match self {
            EnemyKind::Normal => EnemyStats {
                base_health: 50,
                base_damage: 10,
                shoot_range: 300.0,
                shoot_chance: 0.01,
                projectile_speed: 1.0,
            },
            EnemyKind::Boss => EnemyStats {
                base_health: 200,
                base_damage: 20,
                shoot_range: 400.0,
                shoot_chance: 0.015,
                projectile_speed: 1.1,
            },
        }
    }

    pub fn speed(self) -> f32 {
        match self {
            EnemyKind::Normal => ENEMY_SPEED,
            EnemyKind::Boss => BOSS_SPEED,
        }
    }

    pub fn size(self) -> f32 {
        match self {
            EnemyKind::Normal => ENEMY_SIZE,
            EnemyKind::Boss => BOSS_SIZE,
        }
    }

    pub fn projectile_kind(self) -> ProjectileKind {
        match self {
            EnemyKind::Normal => ProjectileKind::Enemy,
            EnemyKind::Boss => ProjectileKind::Boss,
        }
    }

    pub fn kill_score(self, difficulty: &DifficultySettings) -> u32 {
        let base = match self {
            EnemyKind::Normal => SCORE_ENEMY_KILL,
            EnemyKind::Boss => SCORE_BOSS_KILL,
        };
        difficulty.scaled_score(base)
    }

    /// `(health, damage)` multipliers this kind takes from a difficulty.
    fn modifiers(self, difficulty: &DifficultySettings) -> (f32, f32) {
        match self {
            EnemyKind::Normal => (difficulty.enemy_modifier, difficulty.enemy_modifier),
            EnemyKind::Boss => (
                difficulty.boss_health_modifier,
                difficulty.boss_damage_modifier,
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub position: Vec2,
    pub dimensions: Size,
    pub sprite_size: Size,
    pub velocity: Vec2,
    pub health: u32,
    pub initial_health: u32,
    pub damage: u32,
    pub kind: EnemyKind,
    pub speed: f32,
    pub facing: Direction,
    /// Centres a tile-sized hitbox on the sprite; follows the run's tile size.
    pub collision_offset: Vec2,
}

impl Enemy {
    /// Builds an enemy with health and damage scaled for `difficulty`.
    pub fn spawn(kind: EnemyKind, position: Vec2, difficulty: &DifficultySettings) -> Self {
        let (health_mod, damage_mod) = kind.modifiers(difficulty);
        Self::with_modifiers(kind, position, health_mod, damage_mod)
    }

    pub fn with_modifiers(kind: EnemyKind, position: Vec2, health_mod: f32, damage_mod: f32) -> Self {
        let stats = kind.stats();
        let health = scale(stats.base_health, health_mod).max(1);
        let size = Size::square(kind.size());
        Self {
            position,
            dimensions: size,
            sprite_size: size,
            velocity: Vec2::ZERO,
            health,
            initial_health: health,
            damage: scale(stats.base_damage, damage_mod),
            kind,
            speed: kind.speed(),
            facing: Direction::Down,
            collision_offset: hitbox_offset(TILE_SIZE),
        }
    }

    pub fn with_tile_size(mut self, tile_size: f32) -> Self {
        self.collision_offset = hitbox_offset(tile_size);
        self
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.position.x + self.dimensions.width / 2.0,
            self.position.y + self.dimensions.height / 2.0,
        )
    }

    /// Returns `true` once health reaches zero.
    pub fn take_hit(&mut self, amount: u32) -> bool {
        self.health = self.health.saturating_sub(amount);
        self.health == 0
    }

    /// Steers toward the player, moves, then maybe fires into `projectiles`.
    ///
    /// `now_ms` drives the boss wobble so it keeps the same phase regardless
    /// of frame rate. Returns `true` when a shot was fired.
    pub fn update(
        &mut self,
        player_position: Vec2,
        now_ms: f64,
        rng: &mut impl Rng,
        projectiles: &mut Vec<Projectile>,
    ) -> bool {
        let to_player = player_position - self.position;
        let distance = to_player.length();

        if distance > 0.0 {
            self.velocity = match self.kind {
                EnemyKind::Normal => to_player.scale(self.speed / distance),
                EnemyKind::Boss => {
                    let wobble = (now_ms / 1000.0).sin() as f32 * BOSS_WOBBLE_AMPLITUDE;
                    let angle = to_player.y.atan2(to_player.x) + wobble;
                    Vec2::new(angle.cos(), angle.sin()).scale(self.speed)
                }
            };
        }

        self.position += self.velocity;
        self.facing = Direction::from_velocity(self.velocity);

        match self.try_shoot(player_position, rng) {
            Some(projectile) => {
                projectiles.push(projectile);
                true
            }
            None => false,
        }
    }

    fn try_shoot(&self, player_position: Vec2, rng: &mut impl Rng) -> Option<Projectile> {
        let stats = self.kind.stats();
        if !rng.gen_bool(stats.shoot_chance) {
            return None;
        }
        let to_player = player_position - self.position;
        if to_player.length() >= stats.shoot_range {
            return None;
        }
        let direction = to_player.normalized()?;
        let kind = self.kind.projectile_kind();
        Some(
            Projectile::new(kind, self.center(), direction, true)
                .with_damage(self.damage)
                .with_speed(stats.projectile_speed * kind.stats().base_speed),
        )
    }
}

impl HasCollisionBox for Enemy {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn dimensions(&self) -> Size {
        self.dimensions
    }

    fn collision_offset(&self) -> Vec2 {
        self.collision_offset
    }
}

fn hitbox_offset(tile_size: f32) -> Vec2 {
    let d = (SPRITE_SIZE - tile_size) / 2.0;
    Vec2::new(d, d)
}

// ── Projectiles ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProjectileKind {
    Player,
    Enemy,
    Boss,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileStats {
    pub base_size: f32,
    pub base_damage: u32,
    pub base_speed: f32,
    pub color: Rgb,
}

impl ProjectileKind {
    pub fn stats(self) -> ProjectileStats {
        match self {
            ProjectileKind::Player => ProjectileStats {
                base_size: PROJECTILE_SIZE,
                base_damage: 15,
                base_speed: 6.0,
                color: Rgb(0x00, 0xff, 0x00),
            },
            ProjectileKind::Enemy => ProjectileStats {
                base_size: PROJECTILE_SIZE,
                base_damage: 10,
                base_speed: 4.0,
                color: Rgb(0xff, 0x00, 0x00),
            },
            ProjectileKind::Boss => ProjectileStats {
                base_size: PROJECTILE_SIZE * 1.5,
                base_damage: 20,
                base_speed: 3.0,
                color: Rgb(0xff, 0xa5, 0x00),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    pub position: Vec2,
    /// Unit direction of travel.
    pub direction: Vec2,
    pub kind: ProjectileKind,
    pub base_size: f32,
    /// Current side length; boss shots pulse around `base_size`.
    pub size: f32,
    pub damage: u32,
    pub speed: f32,
    pub color: Rgb,
    pub age: u32,
    pub max_age: u32,
    /// Enemy-owned shots hit the player, player-owned shots hit enemies.
    pub is_enemy: bool,
}

impl Projectile {
    pub fn new(kind: ProjectileKind, position: Vec2, direction: Vec2, is_enemy: bool) -> Self {
        let stats = kind.stats();
        Self {
            position,
            direction,
            kind,
            base_size: stats.base_size,
            size: stats.base_size,
            damage: stats.base_damage,
            speed: stats.base_speed,
            color: stats.color,
            age: 0,
            max_age: PROJECTILE_MAX_AGE,
            is_enemy,
        }
    }

    pub fn with_damage(mut self, damage: u32) -> Self {
        self.damage = damage;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.base_size = size;
        self.size = size;
        self
    }

    pub fn update(&mut self) {
        self.position += self.direction.scale(self.speed);
        self.age += 1;
        if self.kind == ProjectileKind::Boss {
            self.size = self.base_size * (1.0 + 0.25 * (self.age as f32 * 0.2).sin());
        }
    }

    pub fn is_in_bounds(&self, width: f32, height: f32) -> bool {
        (0.0..=width).contains(&self.position.x) && (0.0..=height).contains(&self.position.y)
    }

    pub fn is_expired(&self, width: f32, height: f32) -> bool {
        self.age >= self.max_age || !self.is_in_bounds(width, height)
    }
}

impl HasCollisionBox for Projectile {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn dimensions(&self) -> Size {
        Size::square(self.size)
    }
}

// ── Pickups & doors ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PickupKind {
    Health,
    /// Placeholder for kinds the player cannot use; applying it does nothing.
    Unknown,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pickup {
    pub position: Vec2,
    pub dimensions: Size,
    pub kind: PickupKind,
    pub value: u32,
}

impl Pickup {
    pub fn new(position: Vec2, kind: PickupKind) -> Self {
        let value = match kind {
            PickupKind::Health => HEALTH_PICKUP_VALUE,
            PickupKind::Unknown => 0,
        };
        Self {
            position,
            dimensions: Size::square(PICKUP_SIZE),
            kind,
            value,
        }
    }

    /// Returns `true` when the pickup was consumed.
    pub fn apply(&self, player: &mut Player) -> bool {
        match self.kind {
            PickupKind::Health => {
                player.heal(self.value);
                true
            }
            PickupKind::Unknown => false,
        }
    }
}

impl HasCollisionBox for Pickup {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn dimensions(&self) -> Size {
        self.dimensions
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Door {
    pub position: Vec2,
    pub dimensions: Size,
}

impl Door {
    pub fn new(position: Vec2, tile_size: f32) -> Self {
        Self {
            position,
            dimensions: Size::square(tile_size),
        }
    }
}

impl HasCollisionBox for Door {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn dimensions(&self) -> Size {
        self.dimensions
    }
}

// ── Uniform view ─────────────────────────────────────────────────────────────

/// Borrowed view over any collidable thing in the world.
#[derive(Clone, Copy, Debug)]
pub enum EntityRef<'a> {
    Player(&'a Player),
    Enemy(&'a Enemy),
    Projectile(&'a Projectile),
    Pickup(&'a Pickup),
    Door(&'a Door),
    Hitbox(Rect),
}

impl EntityRef<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            EntityRef::Player(_) => "player",
            EntityRef::Enemy(_) => "enemy",
            EntityRef::Projectile(_) => "projectile",
            EntityRef::Pickup(_) => "pickup",
            EntityRef::Door(_) => "door",
            EntityRef::Hitbox(_) => "hitbox",
        }
    }
}

impl HasCollisionBox for EntityRef<'_> {
    fn position(&self) -> Vec2 {
        match self {
            EntityRef::Player(e) => e.position(),
            EntityRef::Enemy(e) => e.position(),
            EntityRef::Projectile(e) => e.position(),
            EntityRef::Pickup(e) => e.position(),
            EntityRef::Door(e) => e.position(),
            EntityRef::Hitbox(r) => r.position(),
        }
    }

    fn dimensions(&self) -> Size {
        match self {
            EntityRef::Player(e) => e.dimensions(),
            EntityRef::Enemy(e) => e.dimensions(),
            EntityRef::Projectile(e) => e.dimensions(),
            EntityRef::Pickup(e) => e.dimensions(),
            EntityRef::Door(e) => e.dimensions(),
            EntityRef::Hitbox(r) => r.dimensions(),
        }
    }

    fn collision_offset(&self) -> Vec2 {
        match self {
            EntityRef::Player(e) => e.collision_offset(),
            EntityRef::Enemy(e) => e.collision_offset(),
            EntityRef::Projectile(e) => e.collision_offset(),
            EntityRef::Pickup(e) => e.collision_offset(),
            EntityRef::Door(e) => e.collision_offset(),
            EntityRef::Hitbox(r) => r.collision_offset(),
        }
    }
}
