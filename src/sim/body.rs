//! Axis-aligned bodies and shapes
//!
//! Screen-space coordinates: y grows downward, so "up" is negative y and a
//! body's bottom edge is `center.y + half.y`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle stored as center + half extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half: size * 0.5,
        }
    }

    /// Rectangle from its top-left corner
    pub fn from_corner(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(Vec2::new(x + w * 0.5, y + h * 0.5), Vec2::new(w, h))
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.center.x - self.half.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.center.x + self.half.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.center.y - self.half.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.center.y + self.half.y
    }

    /// Strict overlap (touching edges do not count)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Closest point inside the rectangle to `p`
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.center - self.half, self.center + self.half)
    }
}

/// Collision shape of a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rect { half: Vec2 },
    Circle { radius: f32 },
}

impl Shape {
    /// Bounding half extents
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Shape::Rect { half } => half,
            Shape::Circle { radius } => Vec2::splat(radius),
        }
    }
}

/// Contact flags reported by the physics substrate after integration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contacts {
    pub grounded: bool,
    pub blocked_left: bool,
    pub blocked_right: bool,
    pub blocked_up: bool,
    /// Standing on a one-way platform (enables drop-through)
    pub on_one_way: bool,
}

/// A moving body integrated by the physics substrate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    /// Position before the last integration (one-way platform test)
    pub prev_pos: Vec2,
    pub vel: Vec2,
    pub shape: Shape,
    pub gravity_scale: f32,
    /// Collides with solid geometry
    pub collides: bool,
    /// Ignores one-way platforms (drop-through)
    pub drop_through: bool,
    pub contacts: Contacts,
}

impl Body {
    pub fn rect(pos: Vec2, size: Vec2) -> Self {
        Self::with_shape(pos, Shape::Rect { half: size * 0.5 })
    }

    pub fn circle(pos: Vec2, radius: f32) -> Self {
        Self::with_shape(pos, Shape::Circle { radius })
    }

    fn with_shape(pos: Vec2, shape: Shape) -> Self {
        Self {
            pos,
            prev_pos: pos,
            vel: Vec2::ZERO,
            shape,
            gravity_scale: 1.0,
            collides: true,
            drop_through: false,
            contacts: Contacts::default(),
        }
    }

    /// Bounding box at the current position
    pub fn aabb(&self) -> Aabb {
        Aabb {
            center: self.pos,
            half: self.shape.half_extents(),
        }
    }

    /// Bounding box at the previous position
    pub fn prev_aabb(&self) -> Aabb {
        Aabb {
            center: self.prev_pos,
            half: self.shape.half_extents(),
        }
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.shape.half_extents().y
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y - self.shape.half_extents().y
    }

    #[inline]
    pub fn prev_bottom(&self) -> f32 {
        self.prev_pos.y + self.shape.half_extents().y
    }

    /// Shape-aware overlap test (rect/rect, rect/circle, circle/circle)
    pub fn overlaps(&self, other: &Body) -> bool {
        match (self.shape, other.shape) {
            (Shape::Rect { .. }, Shape::Rect { .. }) => self.aabb().overlaps(&other.aabb()),
            (Shape::Circle { radius: a }, Shape::Circle { radius: b }) => {
                self.pos.distance_squared(other.pos) < (a + b) * (a + b)
            }
            (Shape::Rect { .. }, Shape::Circle { radius }) => {
                circle_rect_overlap(other.pos, radius, &self.aabb())
            }
            (Shape::Circle { radius }, Shape::Rect { .. }) => {
                circle_rect_overlap(self.pos, radius, &other.aabb())
            }
        }
    }

    /// Freeze in place (no motion, no gravity)
    pub fn freeze(&mut self) {
        self.vel = Vec2::ZERO;
        self.gravity_scale = 0.0;
        self.collides = false;
    }

    /// Move without integration (kinematic placement)
    pub fn teleport(&mut self, pos: Vec2) {
        self.prev_pos = self.pos;
        self.pos = pos;
    }
}

pub fn circle_rect_overlap(center: Vec2, radius: f32, rect: &Aabb) -> bool {
    let closest = rect.clamp_point(center);
    center.distance_squared(closest) < radius * radius
}
