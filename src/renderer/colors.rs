//! Neon palette

/// Linear RGBA, 0-1
pub type Color = [f32; 4];

pub const BACKGROUND: Color = [0.02, 0.01, 0.06, 1.0];
pub const PLATFORM: Color = [0.0, 0.9, 1.0, 1.0]; // Cyan
pub const PLAYER: Color = [1.0, 0.2, 0.8, 1.0]; // Hot pink
pub const ENEMY: Color = [1.0, 0.25, 0.2, 1.0];
pub const PICKUP: Color = [1.0, 0.95, 0.3, 1.0];
pub const EXIT: Color = [0.3, 1.0, 0.4, 1.0];
pub const PARTICLE: Color = [1.0, 0.9, 0.5, 1.0];

/// Alpha for platforms hidden by the invisible troll
pub const GHOST_ALPHA: f32 = 0.08;
/// Alpha for the exit while pickups remain
pub const LOCKED_EXIT_ALPHA: f32 = 0.3;

pub fn with_alpha(color: Color, alpha: f32) -> Color {
    [color[0], color[1], color[2], color[3] * alpha.clamp(0.0, 1.0)]
}

/// CSS `rgba()` string for Canvas 2D fill/stroke styles
pub fn css(color: &Color) -> String {
    format!(
        "rgba({}, {}, {}, {:.3})",
        (color[0].clamp(0.0, 1.0) * 255.0).round() as u8,
        (color[1].clamp(0.0, 1.0) * 255.0).round() as u8,
        (color[2].clamp(0.0, 1.0) * 255.0).round() as u8,
        color[3].clamp(0.0, 1.0)
    )
}
