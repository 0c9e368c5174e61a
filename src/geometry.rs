//! Axis-aligned boxes and the collision predicates every entity pair shares.

use crate::map::{Tile, TileMap};

/// A point or displacement in canvas space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or `None` for the zero vector.
    pub fn normalized(self) -> Option<Vec2> {
        let len = self.length();
        if len > 0.0 {
            Some(Vec2::new(self.x / len, self.y / len))
        } else {
            None
        }
    }

    pub fn scale(self, factor: f32) -> Vec2 {
        Vec2::new(self.x * factor, self.y * factor)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

/// Width and height of an entity's hitbox.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub const fn square(side: f32) -> Self {
        Self::new(side, side)
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn at(origin: Vec2, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Strict overlap: rectangles that only share an edge do not collide.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// The four corners sampled by the wall check, in TL, TR, BL, BR order.
    pub fn corners(&self) -> [Vec2; 4] {
        let right = self.x + self.width;
        let bottom = self.y + self.height;
        [
            Vec2::new(self.x, self.y),
            Vec2::new(right, self.y),
            Vec2::new(self.x, bottom),
            Vec2::new(right, bottom),
        ]
    }
}

/// Anything that takes part in AABB collision.
///
/// The box is `position + collision_offset()` sized by `dimensions()`. Types
/// whose hitbox fills the sprite keep the default zero offset.
pub trait HasCollisionBox {
    fn position(&self) -> Vec2;

    fn dimensions(&self) -> Size;

    fn collision_offset(&self) -> Vec2 {
        Vec2::ZERO
    }

    fn collision_box(&self) -> Rect {
        Rect::at(self.position() + self.collision_offset(), self.dimensions())
    }
}

impl HasCollisionBox for Rect {
    fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    fn dimensions(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Generic entity-vs-entity collision.
pub fn collides<A, B>(a: &A, b: &B) -> bool
where
    A: HasCollisionBox + ?Sized,
    B: HasCollisionBox + ?Sized,
{
    a.collision_box().overlaps(&b.collision_box())
}

/// Returns `true` when any corner of `rect` lands outside the grid or on a
/// wall tile.
///
/// Only corners are sampled, so a box wider or taller than one tile can still
/// straddle a single wall tile between its corners.
pub fn collides_with_walls(map: &TileMap, rect: &Rect) -> bool {
    let tile = map.tile_size();
    rect.corners().iter().any(|corner| {
        let tx = (corner.x / tile).floor();
        let ty = (corner.y / tile).floor();
        if tx < 0.0 || ty < 0.0 {
            return true;
        }
        match map.get(tx as usize, ty as usize) {
            Some(Tile::Floor) => false,
            Some(Tile::Wall) | None => true,
        }
    })
}
