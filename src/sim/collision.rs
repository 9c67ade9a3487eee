//! Axis-aligned collision detection and response
//!
//! Everything in the world is an axis-aligned rectangle except pickups,
//! which are circles. Pixel space, y grows downward.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Strict overlap test; touching edges do not overlap
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Rectangle with every field multiplied by `factor`
    pub fn scaled(&self, factor: f32) -> Rect {
        Rect::new(
            self.x * factor,
            self.y * factor,
            self.w * factor,
            self.h * factor,
        )
    }
}

/// How a body touching a platform was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// No overlap, or overlap that neither axis claims (rising through from below)
    None,
    /// Snapped on top of the platform
    Landed,
    /// Pushed out of the platform's left or right face
    Side,
}

/// Resolve one body against one platform.
///
/// Landing wins when the body is falling and its bottom edge sits within
/// `tolerance` of the platform top; otherwise horizontal motion decides a
/// side push. Each resolution zeroes the velocity component it claims, so a
/// later platform in the same tick cannot re-claim that axis.
pub fn resolve_platform(body: &mut Rect, vel: &mut Vec2, platform: &Rect, tolerance: f32) -> Contact {
    if !body.overlaps(platform) {
        return Contact::None;
    }

    if vel.y > 0.0 && body.bottom() <= platform.y + tolerance {
        body.y = platform.y - body.h;
        vel.y = 0.0;
        Contact::Landed
    } else if vel.x > 0.0 {
        body.x = platform.x - body.w;
        vel.x = 0.0;
        Contact::Side
    } else if vel.x < 0.0 {
        body.x = platform.right();
        vel.x = 0.0;
        Contact::Side
    } else {
        Contact::None
    }
}

/// Circle-vs-rectangle overlap (strict)
pub fn circle_overlaps_rect(center: Vec2, radius: f32, rect: &Rect) -> bool {
    let closest = Vec2::new(
        center.x.clamp(rect.x, rect.right()),
        center.y.clamp(rect.y, rect.bottom()),
    );
    center.distance_squared(closest) < radius * radius
}
