//! Neon Runner - a neon 2D platformer
//!
//! Core modules:
//! - `sim`: Simulation (level generation, loading, physics, troll effects)
//! - `session`: Score/lives/progress and the menu state machine
//! - `renderer`: Draw list built from a read-only world
//! - `input`: Raw key tracking mapped to logical actions
//! - `settings`: Difficulty and tuning

pub mod error;
pub mod input;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, GameError};
pub use session::{Phase, Session, SessionState};
pub use settings::{Difficulty, Settings};

/// Game configuration constants
pub mod consts {
    /// Logical rows the viewport height is divided into
    pub const LOGICAL_ROWS: f32 = 20.0;
    /// Logical columns the viewport width must fit
    pub const LOGICAL_COLUMNS: f32 = 30.0;
    /// Smallest tile size in pixels
    pub const MIN_TILE: f32 = 24.0;

    /// Entity proportions (fractions of a tile, floored to whole pixels)
    pub const PLAYER_WIDTH_TILES: f32 = 0.75;
    pub const PLAYER_HEIGHT_TILES: f32 = 1.0;
    pub const PICKUP_RADIUS_TILES: f32 = 0.22;

    /// Lives at the start of a session
    pub const STARTING_LIVES: u32 = 3;
    /// Bonus for reaching the exit
    pub const LEVEL_COMPLETE_BONUS: u64 = 100;

    /// Pickup placement reject-and-resample cap
    pub const MAX_PICKUP_ATTEMPTS: u32 = 100;
    /// Horizontal inset of a pickup surface from platform edges
    pub const PICKUP_SURFACE_INSET: f32 = 5.0;
    /// Maximum height a pickup may float above its surface
    pub const PICKUP_MAX_LIFT: f32 = 60.0;

    /// Nominal frame length for hosts without a clock (60 Hz)
    pub const FRAME_MS: f64 = 1000.0 / 60.0;

    /// Pickup burst particles
    pub const PICKUP_PARTICLES: u32 = 8;
    pub const MAX_PARTICLES: usize = 128;
}
