//! World state and entity types
//!
//! A `World` is rebuilt from scratch on every level (re)load. Nothing in it
//! survives a reload; score, lives and progress live in the session.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::level::PerturbationTag;
use crate::consts::*;

/// Render surface size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether the surface has a usable size yet
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// The player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub grounded: bool,
    /// Leg-swing animation phase (radians)
    pub run_phase: f32,
}

impl Player {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            size,
            grounded: false,
            run_phase: 0.0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size.x, self.size.y)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    pub fn set_rect(&mut self, rect: &Rect) {
        self.pos = Vec2::new(rect.x, rect.y);
    }
}

/// A solid platform in pixel space. Whether it is drawn is decided by
/// `World::invisible_platforms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub rect: Rect,
}

/// A patrolling enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub rect: Rect,
    /// Speed magnitude (pixels/tick before level scale)
    pub vx: f32,
    /// +1 moving right, -1 moving left
    pub direction: f32,
}

/// A collectible dot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub pos: Vec2,
    pub radius: f32,
    pub collected: bool,
}

/// Transient troll modifiers, neutral after every load
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerturbationState {
    pub controls_reversed: bool,
    pub speed_multiplier: f32,
}

impl Default for PerturbationState {
    fn default() -> Self {
        Self {
            controls_reversed: false,
            speed_multiplier: 1.0,
        }
    }
}

impl PerturbationState {
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32, // 0-1, decreases over time
    pub size: f32,
}

/// Events consumed by the HUD/menu layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    LevelLoaded { level: u32, total_dots: u32 },
    PickupCollected { index: usize, collected: u32, total: u32, points: u64 },
    ScoreChanged { score: u64 },
    LifeLost { lives: u32 },
    LevelCompleted { level: u32, score: u64 },
    GameOver { score: u64 },
    TrollActivated { tag: PerturbationTag, message: &'static str, toast_ms: f64 },
    TrollReverted { tag: PerturbationTag },
}

/// Complete per-level world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    /// 1-based level index
    pub level: u32,
    /// Load generation this world belongs to (troll timers carry the same token)
    pub generation: u64,
    pub viewport: Viewport,
    /// Single pixel scale shared by every entity in this load
    pub tile_size: f32,
    pub player: Player,
    pub platforms: Vec<Platform>,
    pub enemies: Vec<Enemy>,
    pub pickups: Vec<Pickup>,
    pub exit: Rect,
    /// Cosmetic exits spawned by the fake_exit troll
    pub decoy_exits: Vec<Rect>,
    /// Indices into `platforms` currently hidden by the invisible troll
    pub invisible_platforms: BTreeSet<usize>,
    pub perturbation: PerturbationState,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Visual particles (not gameplay-affecting)
    #[serde(skip)]
    pub particles: Vec<Particle>,
}

impl World {
    pub fn total_dots(&self) -> u32 {
        self.pickups.len() as u32
    }

    pub fn collected_count(&self) -> u32 {
        self.pickups.iter().filter(|p| p.collected).count() as u32
    }

    /// The exit only counts once every pickup is collected
    pub fn exit_active(&self) -> bool {
        self.collected_count() == self.total_dots()
    }

    /// True while the invisible troll hides platform `index`
    pub fn is_platform_hidden(&self, index: usize) -> bool {
        self.invisible_platforms.contains(&index)
    }

    /// Player size for a tile size
    pub fn player_size(tile_size: f32) -> Vec2 {
        Vec2::new(
            (tile_size * PLAYER_WIDTH_TILES).floor(),
            (tile_size * PLAYER_HEIGHT_TILES).floor(),
        )
    }

    pub fn pickup_radius(tile_size: f32) -> f32 {
        (tile_size * PICKUP_RADIUS_TILES).floor()
    }

    /// Rightmost x for the exit and pickups. Binds only when `MIN_TILE`
    /// makes the level wider than the viewport; past it the player could
    /// never reach them.
    pub fn reach_limit_x(viewport: Viewport, tile_size: f32) -> f32 {
        (viewport.width - tile_size).max(0.0)
    }

    /// Re-express the world in a new tile size so every entity keeps
    /// sharing one scale after a resize.
    pub fn rescale(&mut self, viewport: Viewport, tile_size: f32) {
        let factor = tile_size / self.tile_size;
        self.viewport = viewport;
        self.tile_size = tile_size;

        for platform in &mut self.platforms {
            platform.rect = platform.rect.scaled(factor);
        }

        let size = Self::player_size(tile_size);
        self.player.pos *= factor;
        self.player.size = size;

        for enemy in &mut self.enemies {
            enemy.rect.x *= factor;
            enemy.rect.y *= factor;
            enemy.rect.w = size.x;
            enemy.rect.h = size.y;
        }

        let limit = Self::reach_limit_x(viewport, tile_size);
        let radius = Self::pickup_radius(tile_size);
        for pickup in &mut self.pickups {
            pickup.pos *= factor;
            pickup.pos.x = pickup.pos.x.min(limit);
            pickup.radius = radius;
        }

        self.exit = self.exit.scaled(factor);
        self.exit.x = self.exit.x.min(limit);
        for decoy in &mut self.decoy_exits {
            *decoy = decoy.scaled(factor);
        }
        for particle in &mut self.particles {
            particle.pos *= factor;
        }

        log::debug!("World rescaled to tile size {tile_size} (x{factor:.3})");
    }
}
