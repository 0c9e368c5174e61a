//! Rendering layer: all terminal I/O lives here.
//!
//! The canvas is drawn at two terminal columns per tile horizontally and one
//! row per tile vertically, so a 20x15 tile grid fits in a 42x19 terminal.
//! Nothing here touches game rules; it only turns a [`Frame`] into crossterm
//! commands.

use std::cell::Cell;
use std::io::{self, Write};
use std::rc::Rc;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use dungeon_runner::compute::GameState;
use dungeon_runner::constants::{ATTACK_COOLDOWN, ATTACK_FLASH_THRESHOLD};
use dungeon_runner::difficulty::Preset;
use dungeon_runner::entities::{Enemy, EnemyKind, EntityRef, PickupKind, ProjectileKind, Rgb};
use dungeon_runner::geometry::{HasCollisionBox, Rect, Vec2};
use dungeon_runner::map::Tile;
use dungeon_runner::session::{Frame, FrameSink, Screen};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_WALL: Color = Color::DarkGrey;
const C_FLOOR: Color = Color::Black;
const C_HUD: Color = Color::Yellow;
const C_HEALTH: Color = Color::Red;
const C_PLAYER: Color = Color::White;
const C_PLAYER_BLOCKING: Color = Color::Cyan;
const C_ENEMY: Color = Color::Green;
const C_BOSS: Color = Color::Magenta;
const C_DOOR: Color = Color::DarkYellow;
const C_PICKUP: Color = Color::Red;
const C_HITBOX: Color = Color::Yellow;
const C_DEBUG: Color = Color::Cyan;
const C_HINT: Color = Color::DarkGrey;

/// Rows above the play field: HUD line and top border.
const TOP: u16 = 2;
/// Columns left of the play field: the side border.
const LEFT: u16 = 1;

// ── Renderer ──────────────────────────────────────────────────────────────────

pub struct TerminalRenderer<W: Write> {
    out: W,
    best_score: Rc<Cell<u32>>,
}

impl<W: Write> TerminalRenderer<W> {
    /// `best_score` is shared with whoever tracks it so the game-over screen
    /// can show it.
    pub fn new(out: W, best_score: Rc<Cell<u32>>) -> Self {
        Self { out, best_score }
    }
}

impl<W: Write> FrameSink for TerminalRenderer<W> {
    fn draw(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        let out = &mut self.out;
        out.queue(terminal::Clear(terminal::ClearType::All))?;

        match (frame.screen, frame.state) {
            (Screen::Splash, _) => draw_splash(out, self.best_score.get())?,
            (Screen::DifficultySelect, _) => draw_difficulty_menu(out, frame.selected)?,
            (Screen::Running, Some(state)) => draw_world(out, state, frame.debug)?,
            (Screen::Paused, Some(state)) => {
                draw_world(out, state, frame.debug)?;
                draw_pause(out, state)?;
            }
            (Screen::GameOver, Some(state)) => {
                draw_world(out, state, frame.debug)?;
                draw_game_over(out, state, self.best_score.get())?;
            }
            (_, None) => draw_splash(out, self.best_score.get())?,
        }

        out.queue(style::ResetColor)?;
        out.queue(cursor::MoveTo(0, 0))?;
        out.flush()
    }
}

// ── Coordinate mapping ────────────────────────────────────────────────────────

struct Grid {
    col_px: f32,
    row_px: f32,
    cols: u16,
    rows: u16,
}

impl Grid {
    fn new(state: &GameState) -> Self {
        Self {
            col_px: state.arena.tile_size / 2.0,
            row_px: state.arena.tile_size,
            cols: (state.map.columns() * 2) as u16,
            rows: state.map.rows() as u16,
        }
    }

    /// Terminal cell of a canvas point, `None` when off the field.
    fn cell(&self, p: Vec2) -> Option<(u16, u16)> {
        if p.x < 0.0 || p.y < 0.0 {
            return None;
        }
        let c = (p.x / self.col_px) as u16;
        let r = (p.y / self.row_px) as u16;
        (c < self.cols && r < self.rows).then_some((LEFT + c, TOP + r))
    }
}

fn put<W: Write>(out: &mut W, at: (u16, u16), color: Color, text: &str) -> io::Result<()> {
    out.queue(cursor::MoveTo(at.0, at.1))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(text))?;
    Ok(())
}

fn centered<W: Write>(out: &mut W, row: u16, color: Color, text: &str) -> io::Result<()> {
    let (width, _) = terminal::size().unwrap_or((80, 24));
    let col = (width / 2).saturating_sub(text.chars().count() as u16 / 2);
    put(out, (col, row), color, text)
}

fn rgb(c: Rgb) -> Color {
    Color::Rgb {
        r: c.0,
        g: c.1,
        b: c.2,
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

fn draw_world<W: Write>(out: &mut W, state: &GameState, debug: bool) -> io::Result<()> {
    let grid = Grid::new(state);
    draw_hud(out, state)?;
    draw_map(out, state, &grid)?;

    if let Some(door) = &state.door {
        if let Some(at) = grid.cell(door.position) {
            put(out, at, C_DOOR, "[]")?;
        }
    }
    for pickup in &state.pickups {
        if let Some(at) = grid.cell(pickup.position) {
            let glyph = match pickup.kind {
                PickupKind::Health => "+",
                PickupKind::Unknown => "?",
            };
            put(out, at, C_PICKUP, glyph)?;
        }
    }
    for enemy in &state.enemies {
        draw_enemy(out, enemy, &grid)?;
    }
    for projectile in &state.projectiles {
        if let Some(at) = grid.cell(projectile.position) {
            let glyph = match projectile.kind {
                ProjectileKind::Boss => "*",
                _ => "•",
            };
            put(out, at, rgb(projectile.color), glyph)?;
        }
    }
    draw_player(out, state, &grid)?;

    if debug {
        draw_debug(out, state, &grid)?;
    }
    draw_controls_hint(out, &grid)?;
    Ok(())
}

fn draw_map<W: Write>(out: &mut W, state: &GameState, grid: &Grid) -> io::Result<()> {
    out.queue(style::SetForegroundColor(C_BORDER))?;
    out.queue(cursor::MoveTo(0, TOP - 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(grid.cols as usize))))?;
    out.queue(cursor::MoveTo(0, TOP + grid.rows))?;
    out.queue(Print(format!("└{}┘", "─".repeat(grid.cols as usize))))?;

    for (y, row) in state.map.iter_rows().enumerate() {
        let line: String = row
            .iter()
            .map(|tile| match tile {
                Tile::Wall => "██",
                Tile::Floor => "  ",
            })
            .collect();
        let r = TOP + y as u16;
        put(out, (0, r), C_BORDER, "│")?;
        out.queue(style::SetForegroundColor(C_WALL))?;
        out.queue(style::SetBackgroundColor(C_FLOOR))?;
        out.queue(Print(line))?;
        out.queue(style::ResetColor)?;
        put(out, (LEFT + grid.cols, r), C_BORDER, "│")?;
    }
    Ok(())
}

fn draw_player<W: Write>(out: &mut W, state: &GameState, grid: &Grid) -> io::Result<()> {
    let player = &state.player;

    // Swing flash: the hitbox lingers for the first few ticks of the cooldown.
    if player.attack_cooldown > ATTACK_FLASH_THRESHOLD {
        let hitbox = player.attack_hitbox(state.arena.tile_size);
        if let Some(at) = grid.cell(hitbox.center()) {
            put(out, at, C_HITBOX, "╳")?;
        }
    }

    let Some(at) = grid.cell(player.center()) else {
        return Ok(());
    };
    let color = if player.is_blocking {
        C_PLAYER_BLOCKING
    } else {
        C_PLAYER
    };
    let glyph = if player.is_blocking { "◘" } else { "@" };
    put(out, at, color, glyph)
}

fn draw_enemy<W: Write>(out: &mut W, enemy: &Enemy, grid: &Grid) -> io::Result<()> {
    let Some(at) = grid.cell(enemy.center()) else {
        return Ok(());
    };
    let (glyph, color, bar_len) = match enemy.kind {
        EnemyKind::Normal => ("e", C_ENEMY, 2),
        EnemyKind::Boss => ("B", C_BOSS, 4),
    };
    put(out, at, color, glyph)?;

    // Health bar on the row above, if there is one.
    if at.1 > TOP {
        let filled = if enemy.initial_health == 0 {
            0
        } else {
            (enemy.health as usize * bar_len).div_ceil(enemy.initial_health as usize)
        };
        let bar = format!("{}{}", "▬".repeat(filled), " ".repeat(bar_len - filled.min(bar_len)));
        put(out, (at.0, at.1 - 1), C_HEALTH, &bar)?;
    }
    Ok(())
}

fn draw_debug<W: Write>(out: &mut W, state: &GameState, grid: &Grid) -> io::Result<()> {
    let hitbox = EntityRef::Hitbox(state.player.attack_hitbox(state.arena.tile_size));
    let mut counts = [0usize; 6];
    for entity in state.entities().chain(std::iter::once(hitbox)) {
        let slot = match entity {
            EntityRef::Player(_) => 0,
            EntityRef::Enemy(_) => 1,
            EntityRef::Projectile(_) => 2,
            EntityRef::Pickup(_) => 3,
            EntityRef::Door(_) => 4,
            EntityRef::Hitbox(_) => 5,
        };
        counts[slot] += 1;
        draw_box_corners(out, &entity.collision_box(), grid)?;
    }

    let p = state.player.position;
    let line = format!(
        "pos ({:.0},{:.0})  enemies {}  shots {}  pickups {}  door {}  frame {}",
        p.x, p.y, counts[1], counts[2], counts[3], counts[4], state.frame
    );
    put(out, (0, TOP + grid.rows + 2), C_DEBUG, &line)
}

fn draw_box_corners<W: Write>(out: &mut W, rect: &Rect, grid: &Grid) -> io::Result<()> {
    for corner in rect.corners() {
        if let Some(at) = grid.cell(corner) {
            put(out, at, C_DEBUG, "·")?;
        }
    }
    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, state: &GameState) -> io::Result<()> {
    let player = &state.player;
    const BAR: u32 = 10;
    let filled = if player.initial_health == 0 {
        0
    } else {
        (player.health * BAR).div_ceil(player.initial_health).min(BAR)
    };
    let health = format!(
        "HP {:>3}/{:<3} [{}{}]",
        player.health,
        player.initial_health,
        "█".repeat(filled as usize),
        " ".repeat((BAR - filled) as usize)
    );
    put(out, (0, 0), C_HEALTH, &health)?;

    const ATK_BAR: u32 = 4;
    let ready = ATTACK_COOLDOWN - player.attack_cooldown.min(ATTACK_COOLDOWN);
    let charged = ready * ATK_BAR / ATTACK_COOLDOWN;
    let atk = format!(
        "  ATK [{}{}]",
        "=".repeat(charged as usize),
        " ".repeat((ATK_BAR - charged) as usize)
    );
    put(out, (health.chars().count() as u16, 0), C_HUD, &atk)?;

    let mut right = format!("Score {:>6}  Floor {:>2}", state.score, state.floor);
    if player.is_blocking {
        right.push_str("  BLOCK");
    }
    let col = (health.chars().count() + atk.chars().count()) as u16 + 2;
    put(out, (col, 0), C_HUD, &right)
}

fn draw_controls_hint<W: Write>(out: &mut W, grid: &Grid) -> io::Result<()> {
    put(
        out,
        (0, TOP + grid.rows + 1),
        C_HINT,
        "WASD/←↑↓→ Move  SPACE Attack  B Block  P Pause  I Debug  Q Quit",
    )
}

// ── Screens ───────────────────────────────────────────────────────────────────

fn draw_splash<W: Write>(out: &mut W, best: u32) -> io::Result<()> {
    let (_, height) = terminal::size().unwrap_or((80, 24));
    let cy = height / 2;
    centered(out, cy.saturating_sub(3), Color::Cyan, "═══  DUNGEON  RUNNER  ═══")?;
    if best > 0 {
        centered(out, cy.saturating_sub(1), C_HUD, &format!("Best Score: {best}"))?;
    }
    centered(out, cy + 1, Color::White, "Press ENTER to begin")?;
    centered(out, cy + 2, C_HINT, "Q : Quit")
}

fn draw_difficulty_menu<W: Write>(out: &mut W, selected: Preset) -> io::Result<()> {
    let (width, height) = terminal::size().unwrap_or((80, 24));
    let cx = width / 2;
    let cy = height / 2;
    put(out, (cx.saturating_sub(12), cy.saturating_sub(4)), Color::White, "Select difficulty:")?;

    let options: [(Preset, &str, Color, &str); 3] = [
        (Preset::Easy, "1", Color::Green, "More health, fewer enemies"),
        (Preset::Normal, "2", Color::Yellow, "The intended run"),
        (Preset::Hard, "3", Color::Red, "Double score, double trouble"),
    ];
    for (i, (preset, key, color, desc)) in options.iter().enumerate() {
        let row = cy.saturating_sub(2) + i as u16;
        let marker = if *preset == selected { "▶" } else { " " };
        put(out, (cx.saturating_sub(14), row), Color::White, marker)?;
        put(out, (cx.saturating_sub(12), row), C_HINT, &format!("[{key}] "))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(format!("{:<8}", preset.name())))?;
        out.queue(style::SetForegroundColor(C_HINT))?;
        out.queue(Print(format!(" {desc}")))?;
    }
    centered(out, cy + 2, C_HINT, "1-3 or ↑↓ + ENTER to start   Q : Back")
}

fn draw_pause<W: Write>(out: &mut W, state: &GameState) -> io::Result<()> {
    let cy = TOP + state.map.rows() as u16 / 2;
    centered(out, cy.saturating_sub(1), Color::White, "╔══════════════╗")?;
    centered(out, cy, Color::White, "║    PAUSED    ║")?;
    centered(out, cy + 1, Color::White, "╚══════════════╝")?;
    centered(out, cy + 2, C_HINT, "P : Resume   Q : Quit")
}

fn draw_game_over<W: Write>(out: &mut W, state: &GameState, best: u32) -> io::Result<()> {
    let cy = TOP + state.map.rows() as u16 / 2;
    let new_best = state.score > 0 && state.score >= best;

    centered(out, cy.saturating_sub(2), Color::Red, "╔════════════════════╗")?;
    centered(out, cy.saturating_sub(1), Color::Red, "║     GAME  OVER     ║")?;
    centered(out, cy, Color::Red, "╚════════════════════╝")?;
    centered(
        out,
        cy + 1,
        C_HUD,
        &format!("Score {:>6}   Floor {:>2}", state.score, state.floor),
    )?;
    let (best_line, best_color) = if new_best {
        (format!("★ NEW BEST: {:>6} ★", state.score), C_HUD)
    } else {
        (format!("Best Score: {best:>6}"), C_HINT)
    };
    centered(out, cy + 2, best_color, &best_line)?;
    centered(out, cy + 3, Color::White, "R - Play Again  Q - Quit")
}
