//! Error taxonomy
//!
//! Every condition here is locally recoverable. The menu layer turns a
//! `GameError` into user feedback; nothing in the simulation panics.

use thiserror::Error;

use crate::session::Phase;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    /// Requested level index has no generated spec
    #[error("level {level} not found ({available} levels available)")]
    LevelNotFound { level: u32, available: u32 },

    /// Render surface has no usable size yet
    #[error("viewport unavailable ({width}x{height})")]
    ViewportUnavailable { width: f32, height: f32 },

    /// Level select beyond current progress
    #[error("level {level} is locked (unlocked up to {unlocked})")]
    LevelLocked { level: u32, unlocked: u32 },

    /// Command not valid in the current phase
    #[error("cannot {action} while in {phase:?}")]
    InvalidTransition { action: &'static str, phase: Phase },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
