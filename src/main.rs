//! Terminal host for the dungeon crawler: owns the real loop, the keyboard
//! and the screen, and drives a [`Session`] with wall-clock timestamps.
//!
//! Logs go to a file because the terminal is busy drawing the game.

mod display;

use std::cell::Cell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, BufWriter, Stdout};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dungeon_runner::config::GameConfig;
use dungeon_runner::difficulty::Preset;
use dungeon_runner::input::{Action, InputState};
use dungeon_runner::session::{Screen, Session, SessionHooks};

use display::TerminalRenderer;

/// Sleep between loop iterations; the session's frame gate does the pacing.
const POLL: Duration = Duration::from_millis(2);

/// A key counts as held if its last press or repeat arrived this recently.
/// Covers terminals that never send key-release events: OS key repeat runs
/// at 15 Hz or faster, so a live key refreshes well before the window ends.
const HOLD_WINDOW: Duration = Duration::from_millis(135);

#[derive(Parser, Debug)]
#[command(name = "dungeon_runner")]
#[command(about = "Top-down dungeon crawler in the terminal")]
struct Args {
    /// TOML config file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preset highlighted on the difficulty screen (easy, normal, hard)
    #[arg(short, long)]
    difficulty: Option<Preset>,

    /// Fixed RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Where log output is written
    #[arg(long, default_value = "dungeon_runner.log")]
    log_file: PathBuf,
}

// ── Best score ────────────────────────────────────────────────────────────────

/// Tracks the best score of this process in the cell the renderer reads.
struct BestScore {
    best: Rc<Cell<u32>>,
}

impl SessionHooks for BestScore {
    fn on_game_over(&mut self, score: u32) {
        info!(score, best = self.best.get(), "run over");
        if score > self.best.get() {
            self.best.set(score);
        }
    }

    fn on_floor_cleared(&mut self, floor: u32) {
        info!(floor, "floor cleared");
    }
}

// ── Held keys ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct HeldKeys {
    seen: HashMap<KeyCode, Instant>,
    blocking: bool,
}

impl HeldKeys {
    fn is_held(&self, keys: &[KeyCode], now: Instant) -> bool {
        keys.iter().any(|key| {
            self.seen
                .get(key)
                .is_some_and(|&last| now.duration_since(last) <= HOLD_WINDOW)
        })
    }

    /// Pushes the live movement keys into `input` and ends a block whose key
    /// has gone quiet.
    fn sync(&mut self, input: &mut InputState, now: Instant) {
        let held = [
            (Action::MoveUp, UP_KEYS),
            (Action::MoveDown, DOWN_KEYS),
            (Action::MoveLeft, LEFT_KEYS),
            (Action::MoveRight, RIGHT_KEYS),
        ];
        input.set_held(
            held.iter()
                .filter(|(_, keys)| self.is_held(keys, now))
                .map(|(action, _)| *action),
        );
        if self.blocking && !self.is_held(BLOCK_KEYS, now) {
            self.blocking = false;
            input.press(Action::BlockStop);
        }
    }

    fn clear(&mut self) {
        self.seen.clear();
        self.blocking = false;
    }
}

const UP_KEYS: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const DOWN_KEYS: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const LEFT_KEYS: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT_KEYS: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const BLOCK_KEYS: &[KeyCode] = &[
    KeyCode::Char('b'),
    KeyCode::Char('B'),
    KeyCode::Char('x'),
    KeyCode::Char('X'),
];

fn movement_action(code: KeyCode) -> Option<Action> {
    [
        (Action::MoveUp, UP_KEYS),
        (Action::MoveDown, DOWN_KEYS),
        (Action::MoveLeft, LEFT_KEYS),
        (Action::MoveRight, RIGHT_KEYS),
    ]
    .into_iter()
    .find(|(_, keys)| keys.contains(&code))
    .map(|(action, _)| action)
}

// ── Key dispatch ──────────────────────────────────────────────────────────────

enum Flow {
    Continue,
    Exit,
}

fn is_quit(code: KeyCode) -> bool {
    matches!(code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
}

fn step_preset(current: Preset, forward: bool) -> Preset {
    let all = Preset::ALL;
    let i = all.iter().position(|&p| p == current).unwrap_or(0);
    let next = if forward {
        (i + 1) % all.len()
    } else {
        (i + all.len() - 1) % all.len()
    };
    all[next]
}

fn on_press(
    session: &mut Session,
    input: &mut InputState,
    held: &mut HeldKeys,
    code: KeyCode,
    now: Instant,
) -> Flow {
    match session.screen() {
        Screen::Splash => match code {
            KeyCode::Enter | KeyCode::Char(' ') => session.start(),
            c if is_quit(c) => return Flow::Exit,
            _ => return Flow::Continue,
        },
        Screen::DifficultySelect => match code {
            KeyCode::Char('1') => session.select_difficulty(Preset::Easy),
            KeyCode::Char('2') => session.select_difficulty(Preset::Normal),
            KeyCode::Char('3') => session.select_difficulty(Preset::Hard),
            KeyCode::Up | KeyCode::Char('w') => {
                session.highlight(step_preset(session.selected(), false))
            }
            KeyCode::Down | KeyCode::Char('s') => {
                session.highlight(step_preset(session.selected(), true))
            }
            KeyCode::Enter => session.select_difficulty(session.selected()),
            c if is_quit(c) => session.quit(),
            _ => return Flow::Continue,
        },
        Screen::Running if is_quit(code) => session.quit(),
        Screen::Running => {
            let _ = held.seen.insert(code, now);
            if let Some(action) = movement_action(code) {
                input.press(action);
                return Flow::Continue;
            }
            match code {
                KeyCode::Char(' ') => input.press(Action::Attack),
                c if BLOCK_KEYS.contains(&c) => {
                    if !held.blocking {
                        held.blocking = true;
                        input.press(Action::BlockStart);
                    }
                }
                KeyCode::Char('p') | KeyCode::Char('P') => input.press(Action::Pause),
                KeyCode::Char('i') | KeyCode::Char('I') => input.press(Action::DebugToggle),
                _ => {}
            }
            return Flow::Continue;
        }
        Screen::Paused => match code {
            KeyCode::Char('p') | KeyCode::Char('P') => {
                input.press(Action::Pause);
                return Flow::Continue;
            }
            KeyCode::Char('i') | KeyCode::Char('I') => {
                input.press(Action::DebugToggle);
                return Flow::Continue;
            }
            c if is_quit(c) => session.quit(),
            _ => return Flow::Continue,
        },
        Screen::GameOver => match code {
            KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::Enter => session.restart(),
            c if is_quit(c) => session.quit(),
            _ => return Flow::Continue,
        },
    }

    // Menu-level transitions land here; start every screen from a clean slate.
    input.clear();
    held.clear();
    session.render();
    Flow::Continue
}

// ── Main loop ─────────────────────────────────────────────────────────────────

fn run(session: &mut Session, rx: &mpsc::Receiver<Event>) -> Result<()> {
    let mut input = InputState::new();
    let mut held = HeldKeys::default();
    let start = Instant::now();
    session.render();

    loop {
        let now = Instant::now();
        while let Ok(ev) = rx.try_recv() {
            let Event::Key(KeyEvent {
                code,
                kind,
                modifiers,
                ..
            }) = ev
            else {
                if let Event::Resize(..) = ev {
                    session.render();
                }
                continue;
            };
            match kind {
                KeyEventKind::Press => {
                    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }
                    if let Flow::Exit = on_press(session, &mut input, &mut held, code, now) {
                        return Ok(());
                    }
                }
                KeyEventKind::Repeat => {
                    let _ = held.seen.insert(code, now);
                }
                KeyEventKind::Release => {
                    let _ = held.seen.remove(&code);
                }
            }
        }

        held.sync(&mut input, now);
        let now_ms = now.duration_since(start).as_secs_f64() * 1000.0;
        let _ = session.frame(now_ms, &mut input);

        thread::sleep(POLL);
    }
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn load_config(args: &Args) -> Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("could not load config from {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(preset) = args.difficulty {
        config.difficulty = preset;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;
    let config = load_config(&args)?;
    info!(seed = ?config.seed, difficulty = %config.difficulty, "starting");

    let best = Rc::new(Cell::new(0));
    let mut session = Session::new(config).context("invalid configuration")?;
    session.add_hooks(Box::new(BestScore { best: Rc::clone(&best) }));

    let mut out: BufWriter<Stdout> = BufWriter::new(stdout());
    terminal::enable_raw_mode().context("failed to enable raw mode")?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Kitty-protocol terminals support this; others fall back to HOLD_WINDOW.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Blocking reads live on their own thread so the loop never waits on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break;
            }
        }
    });

    session.attach_sink(Box::new(TerminalRenderer::new(
        BufWriter::new(stdout()),
        Rc::clone(&best),
    )));
    let result = run(&mut session, &rx);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    info!("exiting");
    result
}
