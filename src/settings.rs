//! Game settings and tuning
//!
//! Read once at startup (JSON, every field optional) and held constant for
//! the whole session. Never written back.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" | "normal" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Points awarded per collected pickup
    pub fn pickup_score(&self) -> u64 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 15,
            Difficulty::Hard => 20,
        }
    }

    /// Multiplier applied to generated enemy base speeds
    pub fn enemy_speed_scale(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Medium => 1.0,
            Difficulty::Hard => 1.25,
        }
    }

    /// Shift applied to troll tag level thresholds (negative = earlier)
    pub fn troll_threshold_offset(&self) -> i32 {
        match self {
            Difficulty::Easy => 2,
            Difficulty::Medium => 0,
            Difficulty::Hard => -2,
        }
    }
}

/// Per-tick physics constants (pixels, pixels/tick)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Horizontal run speed before the troll speed multiplier
    pub move_speed: f32,
    /// Downward acceleration added to vy every tick
    pub gravity: f32,
    /// vx multiplier applied when no single direction is held
    pub friction: f32,
    /// Jump impulse as a fraction of tile size
    pub jump_power_factor: f32,
    /// Jump impulse floor
    pub min_jump_power: f32,
    /// How far below a platform top the player's bottom may be and still land
    pub landing_tolerance: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            move_speed: 4.0,
            gravity: 0.8,
            friction: 0.8,
            jump_power_factor: 0.32,
            min_jump_power: 10.0,
            landing_tolerance: 12.0,
        }
    }
}

impl PhysicsTuning {
    /// Jump impulse for a given tile size
    pub fn jump_power(&self, tile_size: f32) -> f32 {
        (tile_size * self.jump_power_factor).max(self.min_jump_power)
    }
}

/// Troll effect timings (milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrollTuning {
    pub reverse_delay_ms: f64,
    pub reverse_duration_ms: f64,
    pub speed_delay_ms: f64,
    pub speed_duration_ms: f64,
    pub speed_multiplier: f32,
    pub invisible_delay_ms: f64,
    pub invisible_duration_ms: f64,
    /// Decoy exits persist until the level unloads
    pub fake_exit_delay_ms: f64,
    /// How long the HUD shows a troll toast
    pub toast_ms: f64,
    /// Hidden platforms keep colliding (false = player falls through)
    pub invisible_solid: bool,
}

impl Default for TrollTuning {
    fn default() -> Self {
        Self {
            reverse_delay_ms: 3000.0,
            reverse_duration_ms: 5000.0,
            speed_delay_ms: 2000.0,
            speed_duration_ms: 4000.0,
            speed_multiplier: 1.8,
            invisible_delay_ms: 3500.0,
            invisible_duration_ms: 5500.0,
            fake_exit_delay_ms: 500.0,
            toast_ms: 2800.0,
            invisible_solid: true,
        }
    }
}

/// Game settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,
    /// Size of the generated level roster
    pub level_count: u32,
    /// Level select ignores progress (debug)
    pub unlock_all_levels: bool,
    /// Pickup burst particles
    pub particles: bool,
    pub physics: PhysicsTuning,
    pub trolls: TrollTuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            level_count: 19,
            unlock_all_levels: false,
            particles: true,
            physics: PhysicsTuning::default(),
            trolls: TrollTuning::default(),
        }
    }
}

impl Settings {
    /// Smallest and largest supported roster
    pub const MIN_LEVELS: u32 = 5;
    pub const MAX_LEVELS: u32 = 22;

    /// Native config path override
    #[cfg(not(target_arch = "wasm32"))]
    const CONFIG_ENV: &'static str = "NEON_RUNNER_CONFIG";

    /// Parse settings from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.normalized())
    }

    /// Roster size clamped to the supported range
    pub fn normalized(mut self) -> Self {
        self.level_count = self.level_count.clamp(Self::MIN_LEVELS, Self::MAX_LEVELS);
        self
    }

    /// Settings with a given difficulty tier
    pub fn with_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// Load settings from the file named by `NEON_RUNNER_CONFIG`
    /// (default `config/neon_runner.json`)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let path = std::env::var(Self::CONFIG_ENV)
            .unwrap_or_else(|_| "config/neon_runner.json".to_string());
        match Self::read_file(&path) {
            Ok(settings) => {
                log::info!("Loaded settings from {path}");
                settings
            }
            Err(ConfigError::Io(_)) => {
                log::info!("No config at {path}, using defaults");
                Self::default()
            }
            Err(e) => {
                log::warn!("{path}: {e}, using defaults");
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn read_file(path: &str) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings from an inline `<script id="neon-config">` element (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("neon-config"))
            .and_then(|el| el.text_content());

        match json {
            Some(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from page config");
                    settings
                }
                Err(e) => {
                    log::warn!("neon-config: {e}, using defaults");
                    Self::default()
                }
            },
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }
}
