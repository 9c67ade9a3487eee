//! Session and progress state
//!
//! The session owns everything that outlives a single level load: score,
//! lives, progress, the generated level roster and the troll scheduler. It is
//! also the only place phase transitions happen. Menu commands map one-to-one
//! onto the transition methods below; each either succeeds or returns an
//! error with the session left untouched.
//!
//! ```text
//! MainMenu --start/select_level--> Playing
//! Playing  --life lost, lives > 0--> Playing (reload)
//! Playing  --life lost, lives = 0--> GameOver
//! Playing  --exit reached--------> LevelComplete
//! LevelComplete --next_level/select_level/retry--> Playing
//! GameOver --restart--> Playing
//! any      --return_to_menu--> MainMenu
//! ```

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::consts::*;
use crate::error::GameError;
use crate::settings::{Difficulty, Settings};
use crate::sim::{
    GameEvent, LevelSpec, TickInput, TickStatus, TrollScheduler, Viewport, World, generate_levels,
    level_spec, load_level, tick, tile_size_for,
};

/// Top-level screen the game is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    MainMenu,
    Playing,
    LevelComplete,
    GameOver,
}

/// Progress that survives level reloads
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub score: u64,
    pub lives: u32,
    /// 1-based index of the level being (or last) played
    pub current_level: u32,
    /// Highest level the player may select
    pub unlocked_levels: u32,
    pub completed_levels: BTreeSet<u32>,
    pub difficulty: Difficulty,
}

impl SessionState {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            score: 0,
            lives: STARTING_LIVES,
            current_level: 1,
            unlocked_levels: 1,
            completed_levels: BTreeSet::new(),
            difficulty,
        }
    }
}

/// A running game session
pub struct Session {
    settings: Settings,
    levels: Vec<LevelSpec>,
    state: SessionState,
    phase: Phase,
    world: Option<World>,
    scheduler: TrollScheduler,
    rng: Pcg32,
    viewport: Viewport,
    /// Level waiting for a usable viewport
    pending_load: Option<u32>,
}

impl Session {
    /// Create a session in the main menu. `seed` drives pickup placement
    /// and troll targets.
    pub fn new(settings: Settings, seed: u64) -> Self {
        let settings = settings.normalized();
        let levels = generate_levels(settings.level_count, settings.difficulty);
        Self {
            state: SessionState::new(settings.difficulty),
            scheduler: TrollScheduler::new(settings.trolls.clone()),
            rng: Pcg32::seed_from_u64(seed),
            levels,
            settings,
            phase: Phase::MainMenu,
            world: None,
            viewport: Viewport::default(),
            pending_load: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn levels(&self) -> &[LevelSpec] {
        &self.levels
    }

    pub fn total_levels(&self) -> u32 {
        self.levels.len() as u32
    }

    /// The active world, if a level is loaded
    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    /// Mutable world access for hosts and tests (teleports, debug tools)
    pub fn world_mut(&mut self) -> Option<&mut World> {
        self.world.as_mut()
    }

    pub fn scheduler(&self) -> &TrollScheduler {
        &self.scheduler
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Level whose load is waiting for a usable viewport
    pub fn pending_load(&self) -> Option<u32> {
        self.pending_load
    }

    pub fn is_level_unlocked(&self, level: u32) -> bool {
        self.settings.unlock_all_levels || level <= self.state.unlocked_levels
    }

    fn require(&self, action: &'static str, allowed: &[Phase]) -> Result<(), GameError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(GameError::InvalidTransition {
                action,
                phase: self.phase,
            })
        }
    }

    // --- Menu commands ---

    /// Change tier from the main menu; regenerates the roster
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> Result<(), GameError> {
        self.require("change difficulty", &[Phase::MainMenu])?;
        if difficulty != self.state.difficulty {
            self.settings.difficulty = difficulty;
            self.state.difficulty = difficulty;
            self.levels = generate_levels(self.settings.level_count, difficulty);
            log::info!("Difficulty set to {}", difficulty.as_str());
        }
        Ok(())
    }

    /// Start playing from the main menu at the current level
    pub fn start(&mut self) -> Result<Vec<GameEvent>, GameError> {
        self.require("start", &[Phase::MainMenu])?;
        self.enter_level(self.state.current_level)
    }

    /// Jump to an unlocked level from the menu or the level-complete screen
    pub fn select_level(&mut self, level: u32) -> Result<Vec<GameEvent>, GameError> {
        self.require("select a level", &[Phase::MainMenu, Phase::LevelComplete])?;
        level_spec(&self.levels, level)?;
        if !self.is_level_unlocked(level) {
            return Err(GameError::LevelLocked {
                level,
                unlocked: self.state.unlocked_levels,
            });
        }
        self.enter_level(level)
    }

    /// Continue to the level after the one just completed
    pub fn next_level(&mut self) -> Result<Vec<GameEvent>, GameError> {
        self.require("go to the next level", &[Phase::LevelComplete])?;
        self.enter_level(self.state.current_level + 1)
    }

    /// Replay the level just completed
    pub fn retry(&mut self) -> Result<Vec<GameEvent>, GameError> {
        self.require("retry", &[Phase::LevelComplete])?;
        self.enter_level(self.state.current_level)
    }

    /// Reset score, lives and progress and play from level 1. Difficulty is kept.
    pub fn restart(&mut self) -> Result<Vec<GameEvent>, GameError> {
        self.require(
            "restart",
            &[Phase::GameOver, Phase::LevelComplete, Phase::Playing],
        )?;
        self.state = SessionState::new(self.state.difficulty);
        log::info!("Session restarted ({})", self.state.difficulty.as_str());
        let mut events = vec![GameEvent::ScoreChanged { score: 0 }];
        events.extend(self.enter_level(1)?);
        Ok(events)
    }

    /// Leave whatever is running and show the main menu
    pub fn return_to_menu(&mut self) {
        self.scheduler.cancel_all();
        self.world = None;
        self.pending_load = None;
        self.phase = Phase::MainMenu;
    }

    // --- Host hooks ---

    /// New render surface size. Completes a deferred load, or rescales the
    /// live world so every entity keeps sharing one tile size.
    pub fn resize(&mut self, viewport: Viewport) -> Vec<GameEvent> {
        self.viewport = viewport;

        if let Some(level) = self.pending_load {
            if self.phase == Phase::Playing {
                return match self.load(level) {
                    Ok(events) => events,
                    Err(e) => {
                        log::warn!("Deferred load of level {level} failed: {e}");
                        Vec::new()
                    }
                };
            }
            self.pending_load = None;
        }

        if let Some(world) = self.world.as_mut() {
            let width_tiles = self
                .levels
                .get(world.level as usize - 1)
                .map_or(0, |spec| spec.width_tiles);
            match tile_size_for(viewport, width_tiles) {
                Ok(tile) => world.rescale(viewport, tile),
                Err(e) => log::warn!("Keeping previous layout: {e}"),
            }
        }
        Vec::new()
    }

    /// Advance one display frame: due troll timers first, then one physics
    /// tick. Does nothing outside `Playing`.
    pub fn frame(&mut self, dt_ms: f64, input: &TickInput) -> Vec<GameEvent> {
        if self.phase != Phase::Playing {
            return Vec::new();
        }
        let Some(world) = self.world.as_mut() else {
            return Vec::new();
        };

        let mut events = self.scheduler.advance(dt_ms, world, &mut self.rng);
        let outcome = tick(world, input, &self.settings);

        for event in outcome.events {
            let points = match event {
                GameEvent::PickupCollected { points, .. } => Some(points),
                _ => None,
            };
            events.push(event);
            if let Some(points) = points {
                self.state.score += points;
                events.push(GameEvent::ScoreChanged {
                    score: self.state.score,
                });
            }
        }

        match outcome.status {
            TickStatus::Running => {}
            TickStatus::LifeLost => events.extend(self.lose_life()),
            TickStatus::ExitReached => events.extend(self.complete_level()),
        }
        events
    }

    // --- Transitions ---

    fn lose_life(&mut self) -> Vec<GameEvent> {
        self.state.lives = self.state.lives.saturating_sub(1);
        let mut events = vec![GameEvent::LifeLost {
            lives: self.state.lives,
        }];

        if self.state.lives > 0 {
            log::info!(
                "Life lost on level {} ({} left)",
                self.state.current_level,
                self.state.lives
            );
            match self.load(self.state.current_level) {
                Ok(loaded) => events.extend(loaded),
                Err(e) => log::warn!("Reload failed: {e}"),
            }
        } else {
            log::info!("Game over with score {}", self.state.score);
            self.scheduler.cancel_all();
            self.phase = Phase::GameOver;
            events.push(GameEvent::GameOver {
                score: self.state.score,
            });
        }
        events
    }

    fn complete_level(&mut self) -> Vec<GameEvent> {
        let level = self.state.current_level;
        self.scheduler.cancel_all();
        self.state.score += LEVEL_COMPLETE_BONUS;
        self.state.completed_levels.insert(level);
        self.state.unlocked_levels = self
            .state
            .unlocked_levels
            .max(level + 1)
            .min(self.total_levels());
        self.phase = Phase::LevelComplete;

        log::info!(
            "Level {} complete, score {}, unlocked {}",
            level,
            self.state.score,
            self.state.unlocked_levels
        );
        vec![
            GameEvent::ScoreChanged {
                score: self.state.score,
            },
            GameEvent::LevelCompleted {
                level,
                score: self.state.score,
            },
        ]
    }

    /// Validate `level`, make it current and switch to `Playing`
    fn enter_level(&mut self, level: u32) -> Result<Vec<GameEvent>, GameError> {
        level_spec(&self.levels, level)?;
        self.state.current_level = level;
        self.phase = Phase::Playing;
        self.load(level)
    }

    /// (Re)build the world for `level`. An unusable viewport defers the load
    /// until the next resize instead of failing.
    fn load(&mut self, level: u32) -> Result<Vec<GameEvent>, GameError> {
        let spec = level_spec(&self.levels, level)?;
        match load_level(spec, level, self.viewport, &mut self.scheduler, &mut self.rng) {
            Ok(world) => {
                let total_dots = world.total_dots();
                self.world = Some(world);
                self.pending_load = None;
                Ok(vec![GameEvent::LevelLoaded { level, total_dots }])
            }
            Err(GameError::ViewportUnavailable { width, height }) => {
                log::warn!("Viewport {width}x{height} unusable, deferring level {level}");
                self.scheduler.cancel_all();
                self.world = None;
                self.pending_load = Some(level);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}
