//! Screen flow and frame pacing around the pure [`tick`](crate::compute::tick).
//!
//! The host owns the real loop: it calls [`Session::frame`] once per display
//! refresh with a millisecond timestamp and the current input. The session
//! decides whether a tick is due, runs it, fires lifecycle hooks and hands a
//! snapshot to the attached [`FrameSink`].

use std::io;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, warn};

use crate::compute::{self, GameEvent, GameState};
use crate::config::GameConfig;
use crate::difficulty::Preset;
use crate::error::ConfigError;
use crate::input::{Action, InputState};

// ── Screens ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Splash,
    DifficultySelect,
    Running,
    Paused,
    GameOver,
}

// ── Frame gate ───────────────────────────────────────────────────────────────

/// Lets a tick through once at least `duration_ms` has passed since the last
/// one. Surplus time is dropped rather than carried into the next frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameGate {
    duration_ms: f64,
    anchor: Option<f64>,
}

impl FrameGate {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            duration_ms,
            anchor: None,
        }
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    /// The first call after a reset only sets the anchor.
    pub fn ready(&mut self, now_ms: f64) -> bool {
        let anchor = *self.anchor.get_or_insert(now_ms);
        if now_ms - anchor >= self.duration_ms {
            self.anchor = Some(now_ms);
            true
        } else {
            false
        }
    }

    /// Forgets the anchor so a resume does not see one huge delta.
    pub fn reset(&mut self) {
        self.anchor = None;
    }
}

// ── Seams to the host ────────────────────────────────────────────────────────

/// Read-only view handed to the renderer.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    pub screen: Screen,
    /// `None` before the first run starts.
    pub state: Option<&'a GameState>,
    pub selected: Preset,
    pub debug: bool,
}

pub trait FrameSink {
    fn draw(&mut self, frame: &Frame<'_>) -> io::Result<()>;
}

/// Observers for the UI layer. Both methods default to no-ops.
pub trait SessionHooks {
    fn on_game_over(&mut self, _score: u32) {}

    fn on_floor_cleared(&mut self, _floor: u32) {}
}

// ── Session ──────────────────────────────────────────────────────────────────

pub struct Session {
    config: GameConfig,
    screen: Screen,
    selected: Preset,
    state: Option<GameState>,
    gate: FrameGate,
    rng: ChaCha8Rng,
    debug: bool,
    sink: Option<Box<dyn FrameSink>>,
    hooks: Vec<Box<dyn SessionHooks>>,
    warned_missing_sink: bool,
}

impl Session {
    /// Builds a session on the splash screen. The config is validated here so
    /// an out-of-range value never reaches the tick.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Self {
            gate: FrameGate::new(config.frame_duration_ms()),
            selected: config.difficulty,
            config,
            screen: Screen::Splash,
            state: None,
            rng,
            debug: false,
            sink: None,
            hooks: Vec::new(),
            warned_missing_sink: false,
        })
    }

    pub fn attach_sink(&mut self, sink: Box<dyn FrameSink>) {
        self.sink = Some(sink);
        self.warned_missing_sink = false;
    }

    pub fn add_hooks(&mut self, hooks: Box<dyn SessionHooks>) {
        self.hooks.push(hooks);
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    pub fn selected(&self) -> Preset {
        self.selected
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    /// Splash → difficulty select.
    pub fn start(&mut self) {
        if self.screen == Screen::Splash {
            self.set_screen(Screen::DifficultySelect);
        }
    }

    /// Moves the menu highlight without starting a run.
    pub fn highlight(&mut self, preset: Preset) {
        if self.screen == Screen::DifficultySelect {
            self.selected = preset;
        }
    }

    /// Difficulty select → running, with a fresh run on `preset`.
    pub fn select_difficulty(&mut self, preset: Preset) {
        if self.screen != Screen::DifficultySelect {
            return;
        }
        self.selected = preset;
        self.new_game();
    }

    /// Discards the current run and starts over on the selected preset.
    pub fn new_game(&mut self) {
        let settings = self.config.settings_for(self.selected);
        info!(difficulty = %self.selected, "starting new game");
        self.state = Some(compute::init_state(
            settings,
            self.config.arena(),
            &mut self.rng,
        ));
        self.gate.reset();
        self.set_screen(Screen::Running);
    }

    pub fn toggle_pause(&mut self) {
        match self.screen {
            Screen::Running => self.pause(),
            Screen::Paused => self.resume(),
            _ => {}
        }
    }

    pub fn pause(&mut self) {
        if self.screen == Screen::Running {
            self.gate.reset();
            self.set_screen(Screen::Paused);
        }
    }

    pub fn resume(&mut self) {
        if self.screen == Screen::Paused {
            self.gate.reset();
            self.set_screen(Screen::Running);
        }
    }

    /// Game over → difficulty select. The finished run stays visible until a
    /// new one starts.
    pub fn restart(&mut self) {
        if self.screen == Screen::GameOver {
            self.set_screen(Screen::DifficultySelect);
        }
    }

    /// Back to the splash screen from anywhere, dropping the run.
    pub fn quit(&mut self) {
        self.gate.reset();
        self.state = None;
        self.set_screen(Screen::Splash);
    }

    pub fn toggle_debug(&mut self) {
        self.debug = !self.debug;
        debug!(enabled = self.debug, "debug overlay toggled");
    }

    fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            debug!(from = ?self.screen, to = ?screen, "screen change");
            self.screen = screen;
        }
    }

    // ── Frame driver ─────────────────────────────────────────────────────────

    /// Called by the host once per refresh. Session-level actions (pause,
    /// debug) are taken out of `input` here; the rest waits for the tick.
    /// Returns whether a tick ran.
    pub fn frame(&mut self, now_ms: f64, input: &mut InputState) -> bool {
        let before = (self.screen, self.debug);
        for action in input.take_matching(|a| matches!(a, Action::Pause | Action::DebugToggle)) {
            match action {
                Action::Pause => self.toggle_pause(),
                Action::DebugToggle => self.toggle_debug(),
                _ => {}
            }
        }
        if (self.screen, self.debug) != before {
            self.render();
        }

        if self.screen != Screen::Running {
            // Presses made on a menu or while paused never reach the run.
            input.drain_events().for_each(drop);
            return false;
        }
        if !self.gate.ready(now_ms) {
            return false;
        }
        let Some(state) = self.state.as_ref() else {
            warn!("running screen without a game state");
            return false;
        };

        let (next, events) = compute::tick(state, input, now_ms, &mut self.rng);
        self.state = Some(next);
        self.dispatch(&events);
        self.render();
        true
    }

    fn dispatch(&mut self, events: &[GameEvent]) {
        for event in events {
            match *event {
                GameEvent::FloorCleared { cleared, .. } => {
                    for hooks in &mut self.hooks {
                        hooks.on_floor_cleared(cleared);
                    }
                }
                GameEvent::PlayerDied { score, .. } => {
                    self.gate.reset();
                    self.set_screen(Screen::GameOver);
                    for hooks in &mut self.hooks {
                        hooks.on_game_over(score);
                    }
                }
                _ => {}
            }
        }
    }

    /// Draws the current screen. A missing sink is reported once; draw
    /// failures are logged and the frame is skipped.
    pub fn render(&mut self) {
        let frame = Frame {
            screen: self.screen,
            state: self.state.as_ref(),
            selected: self.selected,
            debug: self.debug,
        };
        match self.sink.as_mut() {
            Some(sink) => {
                if let Err(err) = sink.draw(&frame) {
                    error!(%err, "draw failed, frame skipped");
                }
            }
            None if !self.warned_missing_sink => {
                warn!("no render surface attached, skipping draw");
                self.warned_missing_sink = true;
            }
            None => {}
        }
    }
}
