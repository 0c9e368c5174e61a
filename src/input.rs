//! Abstract input: held movement keys plus a queue of one-shot actions.
//!
//! The host fills an [`InputState`] between ticks; the simulation drains it
//! once per tick, so input timing never depends on when a tick happens to
//! run.

use std::collections::{HashSet, VecDeque};

use crate::entities::Direction;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Attack,
    BlockStart,
    BlockStop,
    Pause,
    DebugToggle,
}

impl Action {
    pub fn direction(self) -> Option<Direction> {
        match self {
            Action::MoveUp => Some(Direction::Up),
            Action::MoveDown => Some(Direction::Down),
            Action::MoveLeft => Some(Direction::Left),
            Action::MoveRight => Some(Direction::Right),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputState {
    held: HashSet<Action>,
    events: VecDeque<Action>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a key going down: movement keys become held, and every press
    /// is queued so direction changes and attacks are not lost.
    pub fn press(&mut self, action: Action) {
        if action.direction().is_some() {
            let _ = self.held.insert(action);
        }
        self.events.push_back(action);
    }

    pub fn release(&mut self, action: Action) {
        let _ = self.held.remove(&action);
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    /// Replaces the held movement set wholesale (used by hosts that poll).
    pub fn set_held(&mut self, actions: impl IntoIterator<Item = Action>) {
        self.held = actions
            .into_iter()
            .filter(|a| a.direction().is_some())
            .collect();
    }

    /// Unit-axis movement intent from the held keys, each axis in -1..=1.
    pub fn axis(&self) -> (f32, f32) {
        let mut dx = 0.0;
        let mut dy = 0.0;
        if self.is_held(Action::MoveLeft) {
            dx -= 1.0;
        }
        if self.is_held(Action::MoveRight) {
            dx += 1.0;
        }
        if self.is_held(Action::MoveUp) {
            dy -= 1.0;
        }
        if self.is_held(Action::MoveDown) {
            dy += 1.0;
        }
        (dx, dy)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = Action> + '_ {
        self.events.drain(..)
    }

    /// Pulls every queued action matching `pred` out of the queue, keeping
    /// the rest in order.
    pub fn take_matching(&mut self, pred: impl Fn(Action) -> bool) -> Vec<Action> {
        let (taken, kept): (Vec<Action>, Vec<Action>) =
            self.events.drain(..).partition(|&a| pred(a));
        self.events = kept.into();
        taken
    }

    pub fn has_pending(&self) -> bool {
        !self.events.is_empty()
    }

    /// Forgets everything, as on a new game.
    pub fn clear(&mut self) {
        self.held.clear();
        self.events.clear();
    }
}
