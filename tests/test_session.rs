use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use dungeon_runner::config::GameConfig;
use dungeon_runner::difficulty::Preset;
use dungeon_runner::error::ConfigError;
use dungeon_runner::input::{Action, InputState};
use dungeon_runner::session::*;

fn make_config() -> GameConfig {
    GameConfig {
        seed: Some(42),
        ..GameConfig::default()
    }
}

/// 3x3 tile room where every enemy reaches the player within a few ticks.
fn deadly_config() -> GameConfig {
    let mut config = GameConfig {
        canvas_width: 120.0,
        canvas_height: 120.0,
        seed: Some(3),
        ..GameConfig::default()
    };
    config.presets.normal.player_health = Some(1);
    config
}

fn running_session(config: GameConfig) -> Session {
    let mut session = Session::new(config).unwrap();
    session.start();
    session.select_difficulty(Preset::Normal);
    session
}

#[derive(Clone, Default)]
struct Recorder {
    draws: Rc<RefCell<Vec<(Screen, bool)>>>,
    game_overs: Rc<RefCell<Vec<u32>>>,
}

impl FrameSink for Recorder {
    fn draw(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        self.draws
            .borrow_mut()
            .push((frame.screen, frame.debug));
        Ok(())
    }
}

impl SessionHooks for Recorder {
    fn on_game_over(&mut self, score: u32) {
        self.game_overs.borrow_mut().push(score);
    }
}

struct Broken;

impl FrameSink for Broken {
    fn draw(&mut self, _frame: &Frame<'_>) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
    }
}

// ── FrameGate ─────────────────────────────────────────────────────────────────

#[test]
fn gate_first_call_only_anchors() {
    let mut gate = FrameGate::new(16.0);
    assert!(!gate.ready(1000.0));
    assert!(!gate.ready(1015.9));
    assert!(gate.ready(1016.0));
    assert!(!gate.ready(1020.0));
    assert!(gate.ready(1032.0));
}

#[test]
fn gate_drops_surplus_time() {
    let mut gate = FrameGate::new(16.0);
    let _ = gate.ready(0.0);
    // A long stall yields one tick, not a burst.
    assert!(gate.ready(100.0));
    assert!(!gate.ready(101.0));
    assert!(gate.ready(116.0));
}

#[test]
fn gate_reset_forgets_anchor() {
    let mut gate = FrameGate::new(16.0);
    let _ = gate.ready(0.0);
    gate.reset();
    assert!(!gate.ready(500.0));
    assert!(gate.ready(516.0));
}

// ── Construction ──────────────────────────────────────────────────────────────

#[test]
fn session_rejects_out_of_range_override() {
    let mut config = make_config();
    config.presets.normal.pickup_spawn_rate = Some(1.5);
    let err = Session::new(config).err().unwrap();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            field: "pickup_spawn_rate",
            ..
        }
    ));
}

#[test]
fn session_rejects_zero_tile_size() {
    let config = GameConfig {
        tile_size: 0.0,
        ..make_config()
    };
    assert!(matches!(
        Session::new(config),
        Err(ConfigError::Invalid {
            field: "tile_size",
            ..
        })
    ));
}

// ── Screen flow ───────────────────────────────────────────────────────────────

#[test]
fn session_starts_on_splash_and_does_not_tick() {
    let mut session = Session::new(make_config()).unwrap();
    let mut input = InputState::new();
    input.press(Action::Attack);
    assert_eq!(session.screen(), Screen::Splash);
    assert!(!session.frame(0.0, &mut input));
    assert!(!session.frame(100.0, &mut input));
    assert!(session.state().is_none());
    assert!(!input.has_pending());
}

#[test]
fn splash_to_running() {
    let mut session = Session::new(make_config()).unwrap();
    session.start();
    assert_eq!(session.screen(), Screen::DifficultySelect);

    session.highlight(Preset::Easy);
    assert_eq!(session.selected(), Preset::Easy);

    session.select_difficulty(Preset::Hard);
    assert_eq!(session.screen(), Screen::Running);
    assert_eq!(session.selected(), Preset::Hard);
    let state = session.state().unwrap();
    assert_eq!(state.player.health, 75);
    assert_eq!(state.floor, 1);
}

#[test]
fn select_is_ignored_outside_menu() {
    let mut session = Session::new(make_config()).unwrap();
    session.select_difficulty(Preset::Hard);
    assert_eq!(session.screen(), Screen::Splash);
    assert!(session.state().is_none());
}

#[test]
fn running_session_ticks_on_gate() {
    let mut session = running_session(make_config());
    let mut input = InputState::new();
    assert!(!session.frame(0.0, &mut input));
    assert!(!session.frame(10.0, &mut input));
    assert!(session.frame(17.0, &mut input));
    assert_eq!(session.state().unwrap().frame, 1);
    assert!(!session.frame(20.0, &mut input));
    assert!(session.frame(34.0, &mut input));
    assert_eq!(session.state().unwrap().frame, 2);
}

#[test]
fn pause_freezes_and_resume_restarts_gate() {
    let recorder = Recorder::default();
    let mut session = running_session(make_config());
    session.attach_sink(Box::new(recorder.clone()));
    let mut input = InputState::new();
    let _ = session.frame(0.0, &mut input);
    assert!(session.frame(17.0, &mut input));

    input.press(Action::Pause);
    assert!(!session.frame(40.0, &mut input));
    assert_eq!(session.screen(), Screen::Paused);
    assert_eq!(recorder.draws.borrow().last(), Some(&(Screen::Paused, false)));

    input.press(Action::Attack);
    assert!(!session.frame(1000.0, &mut input));
    assert_eq!(session.state().unwrap().frame, 1);
    assert!(!input.has_pending());

    input.press(Action::Pause);
    assert!(!session.frame(5000.0, &mut input));
    assert_eq!(session.screen(), Screen::Running);
    assert!(session.frame(5017.0, &mut input));
    assert_eq!(session.state().unwrap().frame, 2);
}

#[test]
fn debug_toggle_is_handled_by_session() {
    let recorder = Recorder::default();
    let mut session = running_session(make_config());
    session.attach_sink(Box::new(recorder.clone()));
    let mut input = InputState::new();
    input.press(Action::DebugToggle);
    let _ = session.frame(0.0, &mut input);
    assert!(session.debug());
    assert_eq!(recorder.draws.borrow().last(), Some(&(Screen::Running, true)));
}

#[test]
fn quit_returns_to_splash_from_anywhere() {
    let mut session = running_session(make_config());
    session.quit();
    assert_eq!(session.screen(), Screen::Splash);
    assert!(session.state().is_none());

    let mut session = Session::new(make_config()).unwrap();
    session.start();
    session.quit();
    assert_eq!(session.screen(), Screen::Splash);
}

#[test]
fn restart_only_from_game_over() {
    let mut session = running_session(make_config());
    session.restart();
    assert_eq!(session.screen(), Screen::Running);
}

#[test]
fn death_moves_to_game_over_and_fires_hook() {
    let recorder = Recorder::default();
    let mut session = running_session(deadly_config());
    session.add_hooks(Box::new(recorder.clone()));
    session.attach_sink(Box::new(recorder.clone()));
    let mut input = InputState::new();

    let mut now = 0.0;
    while session.screen() == Screen::Running && now < 60_000.0 {
        let _ = session.frame(now, &mut input);
        now += 20.0;
    }

    assert_eq!(session.screen(), Screen::GameOver);
    assert_eq!(recorder.game_overs.borrow().len(), 1);
    assert_eq!(recorder.draws.borrow().last(), Some(&(Screen::GameOver, false)));
    let state = session.state().unwrap();
    assert!(state.is_over());
    let frozen = state.frame;

    // Nothing moves while the game-over screen is up.
    assert!(!session.frame(now + 100.0, &mut input));
    assert_eq!(session.state().unwrap().frame, frozen);

    session.restart();
    assert_eq!(session.screen(), Screen::DifficultySelect);
    session.select_difficulty(Preset::Normal);
    let fresh = session.state().unwrap();
    assert_eq!(fresh.score, 0);
    assert_eq!(fresh.floor, 1);
    assert_eq!(fresh.frame, 0);
    assert!(!fresh.is_over());
}

#[test]
fn same_seed_same_run() {
    let mut a = running_session(make_config());
    let mut b = running_session(make_config());
    let mut input_a = InputState::new();
    let mut input_b = InputState::new();
    for i in 0..120 {
        let now = f64::from(i) * 17.0;
        let _ = a.frame(now, &mut input_a);
        let _ = b.frame(now, &mut input_b);
    }
    let (sa, sb) = (a.state().unwrap(), b.state().unwrap());
    assert_eq!(sa.enemies, sb.enemies);
    assert_eq!(sa.player, sb.player);
    assert_eq!(sa.map, sb.map);
}

#[test]
fn rendering_without_sink_or_with_broken_sink_is_harmless() {
    let mut session = running_session(make_config());
    session.render();
    session.render();
    session.attach_sink(Box::new(Broken));
    let mut input = InputState::new();
    let _ = session.frame(0.0, &mut input);
    assert!(session.frame(17.0, &mut input));
}
