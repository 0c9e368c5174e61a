//! Simulation core for a top-down dungeon crawler: a pure per-tick update
//! over an owned game state, plus the session layer that paces it.

pub mod compute;
pub mod config;
pub mod constants;
pub mod difficulty;
pub mod entities;
pub mod error;
pub mod geometry;
pub mod input;
pub mod map;
pub mod session;
