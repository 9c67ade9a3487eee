//! Level generation
//!
//! Every level is a pure function of its 1-based index and the difficulty
//! tier: a ground strip, a staircase of steps climbing toward the exit,
//! enemies interleaved along the stairs, and troll tags unlocked by index
//! thresholds. Nothing here needs a viewport; the loader converts tiles to
//! pixels later.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::settings::Difficulty;

/// Rectangle in tile units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Point in tile units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePoint {
    pub x: u32,
    pub y: u32,
}

/// Enemy spawn parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemySpec {
    pub x: u32,
    pub y: u32,
    /// Pixels per tick before the per-level scale
    pub base_speed: f32,
}

/// Timed gameplay perturbation a level may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerturbationTag {
    Speed,
    Invisible,
    FakeExit,
    Reverse,
}

impl PerturbationTag {
    pub const ALL: [PerturbationTag; 4] = [
        PerturbationTag::Speed,
        PerturbationTag::Invisible,
        PerturbationTag::FakeExit,
        PerturbationTag::Reverse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PerturbationTag::Speed => "speed",
            PerturbationTag::Invisible => "invisible",
            PerturbationTag::FakeExit => "fake_exit",
            PerturbationTag::Reverse => "reverse",
        }
    }

    /// Base level index above which the tag appears (before difficulty offset)
    fn base_threshold(&self) -> i32 {
        match self {
            PerturbationTag::Speed => 6,
            PerturbationTag::Invisible => 10,
            PerturbationTag::FakeExit => 13,
            PerturbationTag::Reverse => 15,
        }
    }
}

/// Immutable level description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    /// Horizontal extent in tiles
    pub width_tiles: u32,
    /// Ground strip first, then steps in ascending order
    pub platforms: Vec<TileRect>,
    pub enemies: Vec<EnemySpec>,
    /// Number of pickups to place
    pub dots: u32,
    pub start: TilePoint,
    pub exit: TilePoint,
    pub tags: BTreeSet<PerturbationTag>,
}

/// Row of the ground strip's top edge
pub const GROUND_ROW: u32 = 18;
/// Thickness of the ground strip
pub const GROUND_HEIGHT: u32 = 2;

pub const MAX_STEPS: u32 = 8;
pub const MAX_ENEMIES: u32 = 6;
pub const MIN_DOTS: u32 = 3;
pub const MAX_DOTS: u32 = 12;
/// Highest the exit climbs above its base row
pub const MAX_EXIT_RISE: u32 = 6;
/// Widest a level may grow, in tiles
pub const MAX_WIDTH_TILES: u32 = 40;

/// Half-width of the level in tiles (the ground spans twice this)
pub fn half_width_tiles(level: u32) -> u32 {
    (14 + level / 2).max(14)
}

/// Full level width in tiles
pub fn width_tiles(level: u32) -> u32 {
    (half_width_tiles(level) * 2).min(MAX_WIDTH_TILES)
}

pub fn step_count(level: u32) -> u32 {
    (3 + level / 3).min(MAX_STEPS)
}

pub fn enemy_count(level: u32) -> u32 {
    (level / 3).min(MAX_ENEMIES)
}

pub fn pickup_count(level: u32) -> u32 {
    (3 + level / 2).clamp(MIN_DOTS, MAX_DOTS)
}

/// Tags unlocked at `level` for the given tier
pub fn tags_for(level: u32, difficulty: Difficulty) -> BTreeSet<PerturbationTag> {
    let level = level as i32;
    let offset = difficulty.troll_threshold_offset();
    PerturbationTag::ALL
        .into_iter()
        .filter(|tag| level > tag.base_threshold() + offset)
        .collect()
}

/// Generate the spec for a single 1-based level index
pub fn generate_level(level: u32, difficulty: Difficulty) -> LevelSpec {
    let width = width_tiles(level);

    let mut platforms = Vec::with_capacity(1 + step_count(level) as usize);
    platforms.push(TileRect {
        x: 0,
        y: GROUND_ROW,
        w: width,
        h: GROUND_HEIGHT,
    });

    // Staircase: each step further right and higher, shifted per level
    for i in 0..step_count(level) {
        let rise = (i * 3) / 2 + level % 4;
        platforms.push(TileRect {
            x: 3 + i * 4 + level % 3,
            y: 14u32.saturating_sub(rise),
            w: 3 + i % 3,
            h: 1,
        });
    }

    let base_speed = (0.6 + level as f32 / 20.0) * difficulty.enemy_speed_scale();
    let enemies = (0..enemy_count(level))
        .map(|e| EnemySpec {
            x: 6 + e * 5,
            y: 15 - (e % 3) * 2,
            base_speed,
        })
        .collect();

    LevelSpec {
        width_tiles: width,
        platforms,
        enemies,
        dots: pickup_count(level),
        start: TilePoint { x: 2, y: 14 },
        exit: TilePoint {
            x: width - 4,
            y: 10 - (level / 4).min(MAX_EXIT_RISE),
        },
        tags: tags_for(level, difficulty),
    }
}

/// Generate the whole roster, index 0 holding level 1
pub fn generate_levels(count: u32, difficulty: Difficulty) -> Vec<LevelSpec> {
    let levels: Vec<_> = (1..=count)
        .map(|level| generate_level(level, difficulty))
        .collect();
    log::info!(
        "Generated {} levels ({})",
        levels.len(),
        difficulty.as_str()
    );
    levels
}

/// Look up a 1-based level
pub fn level_spec(levels: &[LevelSpec], level: u32) -> Result<&LevelSpec, GameError> {
    level
        .checked_sub(1)
        .and_then(|i| levels.get(i as usize))
        .ok_or(GameError::LevelNotFound {
            level,
            available: levels.len() as u32,
        })
}
