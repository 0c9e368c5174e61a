//! Tile grid and the per-floor map generator.

use rand::Rng;
use tracing::{debug, warn};

use crate::constants::WALL_PROBABILITY;
use crate::error::MapError;
use crate::geometry::Vec2;

const FLOOR: u8 = 0;
const WALL: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Floor,
    Wall,
}

impl Tile {
    pub fn is_wall(self) -> bool {
        self == Tile::Wall
    }
}

/// Rectangular walkability grid, indexed `[row][column]`.
#[derive(Clone, Debug, PartialEq)]
pub struct TileMap {
    rows: Vec<Vec<Tile>>,
    tile_size: f32,
}

impl TileMap {
    /// An all-floor grid.
    pub fn open(columns: usize, rows: usize, tile_size: f32) -> Self {
        Self {
            rows: vec![vec![Tile::Floor; columns]; rows],
            tile_size,
        }
    }

    /// Builds a map from raw `0`/`1` cells, rejecting empty, ragged or
    /// out-of-range grids.
    pub fn from_cells(cells: Vec<Vec<u8>>, tile_size: f32) -> Result<Self, MapError> {
        verify(&cells)?;
        let rows = cells
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| if cell == WALL { Tile::Wall } else { Tile::Floor })
                    .collect()
            })
            .collect();
        Ok(Self { rows, tile_size })
    }

    pub fn columns(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn is_empty(&self) -> bool {
        self.columns() == 0 || self.rows() == 0
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Tile> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    pub fn is_wall(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_some_and(Tile::is_wall)
    }

    /// Row-major view for renderers.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Raw `0`/`1` cells, the inverse of [`TileMap::from_cells`].
    pub fn to_cells(&self) -> Vec<Vec<u8>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|t| if t.is_wall() { WALL } else { FLOOR }).collect())
            .collect()
    }

    /// Tile coordinate containing a canvas point.
    pub fn tile_of(&self, point: Vec2) -> (i64, i64) {
        (
            (point.x / self.tile_size).floor() as i64,
            (point.y / self.tile_size).floor() as i64,
        )
    }
}

/// Checks that a raw grid is non-empty, rectangular and holds only 0 and 1.
pub fn verify(cells: &[Vec<u8>]) -> Result<(), MapError> {
    let width = cells.first().map_or(0, Vec::len);
    if width == 0 {
        return Err(MapError::Empty);
    }
    for (y, row) in cells.iter().enumerate() {
        if row.len() != width {
            return Err(MapError::Ragged {
                row: y,
                expected: width,
                actual: row.len(),
            });
        }
        if let Some((x, &value)) = row.iter().enumerate().find(|(_, &c)| c > WALL) {
            return Err(MapError::InvalidCell { x, y, value });
        }
    }
    Ok(())
}

/// Generates a `columns × rows` floor.
///
/// With a player position, every cell sharing a row band or column band
/// (±1) with the player's clamped tile is kept clear, so the safe zone is a
/// cross through the player rather than a box. Remaining cells turn to wall
/// with a fixed probability, then long straight wall runs are broken up.
/// Without a player the grid stays open. A grid that fails [`verify`] is
/// replaced by an open grid of the same size.
pub fn generate(
    columns: usize,
    rows: usize,
    tile_size: f32,
    player: Option<Vec2>,
    rng: &mut impl Rng,
) -> TileMap {
    let mut cells = vec![vec![FLOOR; columns]; rows];

    if let Some(position) = player {
        let (cx, cy) = safe_center(position, columns, rows, tile_size);
        scatter_walls(&mut cells, cx, cy, rng);
        widen_corridors(&mut cells);
    }

    match TileMap::from_cells(cells, tile_size) {
        Ok(map) => {
            debug!(columns, rows, "generated map");
            map
        }
        Err(err) => {
            warn!(%err, columns, rows, "map verification failed, using an open map");
            TileMap::open(columns, rows, tile_size)
        }
    }
}

/// Player tile clamped one tile inside the border.
fn safe_center(position: Vec2, columns: usize, rows: usize, tile_size: f32) -> (i64, i64) {
    let tx = (position.x / tile_size).floor() as i64;
    let ty = (position.y / tile_size).floor() as i64;
    (
        tx.min(columns as i64 - 2).max(1),
        ty.min(rows as i64 - 2).max(1),
    )
}

fn scatter_walls(cells: &mut [Vec<u8>], cx: i64, cy: i64, rng: &mut impl Rng) {
    for (y, row) in cells.iter_mut().enumerate() {
        for (x, cell) in row.iter_mut().enumerate() {
            let in_safe_band = (x as i64 - cx).abs() <= 1 || (y as i64 - cy).abs() <= 1;
            if in_safe_band {
                *cell = FLOOR;
            } else if rng.gen_bool(WALL_PROBABILITY) {
                *cell = WALL;
            }
        }
    }
}

/// Clears the middle of any five-in-a-row wall run, horizontally then
/// vertically, in one row-major sweep over interior cells.
fn widen_corridors(cells: &mut [Vec<u8>]) {
    let height = cells.len();
    let width = cells.first().map_or(0, Vec::len);
    if width < 3 || height < 3 {
        return;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            if x >= 2 && x + 2 < width && (x - 2..=x + 2).all(|nx| cells[y][nx] == WALL) {
                cells[y][x] = FLOOR;
            }
            if y >= 2 && y + 2 < height && (y - 2..=y + 2).all(|ny| cells[ny][x] == WALL) {
                cells[y][x] = FLOOR;
            }
        }
    }
}
