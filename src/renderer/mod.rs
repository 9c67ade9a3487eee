//! Rendering module
//!
//! The simulation never draws. Each frame the host turns a read-only
//! `World` into an ordered list of `DrawCommand`s and paints them with
//! whatever backend it has (Canvas 2D in the browser).

pub mod colors;
pub mod shapes;

use glam::Vec2;

use crate::sim::{Rect, World};

pub use colors::Color;
pub use shapes::build_scene;

/// One primitive, in world pixels, painted in list order
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole surface
    Clear { color: Color },
    Rect { rect: Rect, color: Color },
    Circle { center: Vec2, radius: f32, color: Color },
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: Color,
    },
}

/// Anything that can present a world
pub trait Renderer {
    fn render(&mut self, world: &World);
}

/// Renderer that keeps the last frame's commands (headless runs, tests)
#[derive(Debug, Default)]
pub struct CommandRecorder {
    pub commands: Vec<DrawCommand>,
    pub frames: u64,
}

impl Renderer for CommandRecorder {
    fn render(&mut self, world: &World) {
        self.commands = build_scene(world);
        self.frames += 1;
    }
}
