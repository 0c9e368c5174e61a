//! Difficulty presets and the scoring/spawn arithmetic that depends on them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{BASE_ENEMY_COUNT, SCORE_FLOOR_CLEAR};
use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Easy, Preset::Normal, Preset::Hard];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Easy => "easy",
            Preset::Normal => "normal",
            Preset::Hard => "hard",
        }
    }

    pub fn settings(self) -> DifficultySettings {
        match self {
            Preset::Easy => DifficultySettings {
                player_health: 150,
                block_reduction: 0.75,
                score_multiplier: 0.5,
                enemy_modifier: 0.5,
                enemy_count_modifier: 0.75,
                pickup_spawn_rate: 0.008,
                boss_health_modifier: 0.75,
                boss_damage_modifier: 0.5,
            },
            Preset::Normal => DifficultySettings {
                player_health: 100,
                block_reduction: 0.5,
                score_multiplier: 1.0,
                enemy_modifier: 1.0,
                enemy_count_modifier: 1.0,
                pickup_spawn_rate: 0.005,
                boss_health_modifier: 1.0,
                boss_damage_modifier: 1.0,
            },
            Preset::Hard => DifficultySettings {
                player_health: 75,
                block_reduction: 0.25,
                score_multiplier: 2.0,
                enemy_modifier: 1.5,
                enemy_count_modifier: 1.5,
                pickup_spawn_rate: 0.003,
                boss_health_modifier: 2.0,
                boss_damage_modifier: 1.5,
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

/// Scalar modifiers fixed for a whole run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultySettings {
    pub player_health: u32,
    /// Fraction of incoming projectile damage absorbed while blocking.
    pub block_reduction: f32,
    pub score_multiplier: f32,
    /// Health and damage multiplier for normal enemies.
    pub enemy_modifier: f32,
    pub enemy_count_modifier: f32,
    /// Chance per tick that a health pickup appears.
    pub pickup_spawn_rate: f64,
    pub boss_health_modifier: f32,
    pub boss_damage_modifier: f32,
}

impl Default for DifficultySettings {
    fn default() -> Self {
        Preset::Normal.settings()
    }
}

impl DifficultySettings {
    /// `base × score_multiplier`, rounded down.
    pub fn scaled_score(&self, base: u32) -> u32 {
        scale(base, self.score_multiplier)
    }

    pub fn floor_clear_bonus(&self) -> u32 {
        self.scaled_score(SCORE_FLOOR_CLEAR)
    }

    /// Normal enemies spawned when `floor` begins. Never zero, so a floor is
    /// never cleared before it starts.
    pub fn enemy_count(&self, floor: u32) -> u32 {
        let base = BASE_ENEMY_COUNT + floor / 2;
        scale(base, self.enemy_count_modifier).max(1)
    }

    /// Enemies spawned on the first floor of a fresh run.
    pub fn opening_enemy_count(&self) -> u32 {
        scale(BASE_ENEMY_COUNT, self.enemy_count_modifier).max(1)
    }
}

/// Multiplies and rounds down, saturating at zero for negative factors.
pub fn scale(value: u32, factor: f32) -> u32 {
    (value as f32 * factor).floor().max(0.0) as u32
}
