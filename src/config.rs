//! Run configuration: arena size, frame rate, seed and difficulty tables.
//!
//! Everything has a default, so a missing config file is not an error. A TOML
//! file may override any subset of fields:
//!
//! ```toml
//! canvas_width = 800
//! canvas_height = 600
//! tile_size = 40
//! frame_rate = 60
//! seed = 7
//! difficulty = "hard"
//!
//! [presets.hard]
//! player_health = 90
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::compute::Arena;
use crate::constants::{CANVAS_HEIGHT, CANVAS_WIDTH, FRAME_RATE, TILE_SIZE};
use crate::difficulty::{DifficultySettings, Preset};
use crate::error::ConfigError;

/// Smallest grid the door placement and safe zone make sense on.
const MIN_GRID_TILES: usize = 3;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub tile_size: f32,
    pub frame_rate: u32,
    pub seed: Option<u64>,
    /// Preset pre-selected on the difficulty screen.
    pub difficulty: Preset,
    pub presets: PresetOverrides,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            tile_size: TILE_SIZE,
            frame_rate: FRAME_RATE,
            seed: None,
            difficulty: Preset::default(),
            presets: PresetOverrides::default(),
        }
    }
}

/// Partial per-preset tables layered over the built-in values.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PresetOverrides {
    pub easy: DifficultyOverride,
    pub normal: DifficultyOverride,
    pub hard: DifficultyOverride,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DifficultyOverride {
    pub player_health: Option<u32>,
    pub block_reduction: Option<f32>,
    pub score_multiplier: Option<f32>,
    pub enemy_modifier: Option<f32>,
    pub enemy_count_modifier: Option<f32>,
    pub pickup_spawn_rate: Option<f64>,
    pub boss_health_modifier: Option<f32>,
    pub boss_damage_modifier: Option<f32>,
}

impl DifficultyOverride {
    pub fn apply(&self, mut base: DifficultySettings) -> DifficultySettings {
        if let Some(v) = self.player_health {
            base.player_health = v;
        }
        if let Some(v) = self.block_reduction {
            base.block_reduction = v;
        }
        if let Some(v) = self.score_multiplier {
            base.score_multiplier = v;
        }
        if let Some(v) = self.enemy_modifier {
            base.enemy_modifier = v;
        }
        if let Some(v) = self.enemy_count_modifier {
            base.enemy_count_modifier = v;
        }
        if let Some(v) = self.pickup_spawn_rate {
            base.pickup_spawn_rate = v;
        }
        if let Some(v) = self.boss_health_modifier {
            base.boss_health_modifier = v;
        }
        if let Some(v) = self.boss_damage_modifier {
            base.boss_damage_modifier = v;
        }
        base
    }
}

impl GameConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GameConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("canvas_width", self.canvas_width)?;
        positive("canvas_height", self.canvas_height)?;
        positive("tile_size", self.tile_size)?;
        if self.frame_rate == 0 {
            return Err(invalid("frame_rate", "must be at least 1"));
        }
        let arena = self.arena();
        if arena.columns() < MIN_GRID_TILES || arena.rows() < MIN_GRID_TILES {
            return Err(invalid(
                "tile_size",
                format!(
                    "canvas must hold at least {MIN_GRID_TILES}x{MIN_GRID_TILES} tiles, got {}x{}",
                    arena.columns(),
                    arena.rows()
                ),
            ));
        }
        for preset in Preset::ALL {
            validate_settings(&self.settings_for(preset))?;
        }
        Ok(())
    }

    pub fn arena(&self) -> Arena {
        Arena {
            width: self.canvas_width,
            height: self.canvas_height,
            tile_size: self.tile_size,
        }
    }

    pub fn frame_duration_ms(&self) -> f64 {
        1000.0 / f64::from(self.frame_rate.max(1))
    }

    /// Built-in preset table with any configured overrides applied.
    pub fn settings_for(&self, preset: Preset) -> DifficultySettings {
        let overrides = match preset {
            Preset::Easy => &self.presets.easy,
            Preset::Normal => &self.presets.normal,
            Preset::Hard => &self.presets.hard,
        };
        overrides.apply(preset.settings())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be a positive number, got {value}")))
    }
}

fn fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("must be within 0..=1, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must not be negative, got {value}")))
    }
}

fn validate_settings(settings: &DifficultySettings) -> Result<(), ConfigError> {
    if settings.player_health == 0 {
        return Err(invalid("player_health", "must be at least 1"));
    }
    fraction("block_reduction", f64::from(settings.block_reduction))?;
    fraction("pickup_spawn_rate", settings.pickup_spawn_rate)?;
    non_negative("score_multiplier", settings.score_multiplier)?;
    non_negative("enemy_modifier", settings.enemy_modifier)?;
    non_negative("enemy_count_modifier", settings.enemy_count_modifier)?;
    non_negative("boss_health_modifier", settings.boss_health_modifier)?;
    non_negative("boss_damage_modifier", settings.boss_damage_modifier)?;
    Ok(())
}
