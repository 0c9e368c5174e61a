//! Error types.
//!
//! Simulation failures are recovered in place and only ever logged; the
//! configuration error is the one type that reaches the host binary.

use std::path::PathBuf;

use thiserror::Error;

/// Reasons a raw tile grid is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("tile grid has no rows or no columns")]
    Empty,
    #[error("row {row} has {actual} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("cell ({x}, {y}) holds {value}, expected 0 or 1")]
    InvalidCell { x: usize, y: usize, value: u8 },
}

/// Failures while assembling a [`GameConfig`](crate::config::GameConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown difficulty preset `{0}` (expected easy, normal or hard)")]
    UnknownPreset(String),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
