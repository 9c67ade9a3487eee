//! Simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - One fixed step per tick, no substepping
//! - Seeded RNG only (pickup placement and troll targets)
//! - Stable iteration order (insertion order of platforms/enemies/pickups)
//! - No rendering, DOM or timer dependencies

pub mod collision;
pub mod level;
pub mod loader;
pub mod state;
pub mod tick;
pub mod troll;

pub use collision::{Contact, Rect, circle_overlaps_rect, resolve_platform};
pub use level::{
    EnemySpec, LevelSpec, PerturbationTag, TilePoint, TileRect, generate_level, generate_levels,
    level_spec,
};
pub use loader::{load_level, tile_size_for};
pub use state::{
    Enemy, GameEvent, Particle, PerturbationState, Pickup, Platform, Player, Viewport, World,
};
pub use tick::{TickInput, TickOutcome, TickStatus, tick};
pub use troll::TrollScheduler;
