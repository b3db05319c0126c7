//! Physics substrate: velocity integration against axis-aligned geometry
//!
//! The movement code only sets velocities and reads back [`Contacts`]; the
//! substrate owns gravity, per-axis resolution and the one-way platform rule.
//! [`TileWorld`] is the built-in substrate used by the simulation and tests.

use glam::Vec2;

use super::body::{Aabb, Body, Contacts};
use super::brick::{PhaseBrick, SolidKind, Tile};
use crate::consts::{GRAVITY, MAX_FALL_SPEED};
use crate::ms_to_secs;

/// Default slack when comparing a body's previous bottom to a platform top
pub const ONE_WAY_TOLERANCE: f32 = 4.0;

/// The collision collaborator consumed by the movement and adversary code
pub trait PhysicsSubstrate {
    /// Integrate `body` over `dt_ms`, resolving against geometry and refreshing its contacts
    fn integrate(&self, body: &mut Body, dt_ms: f32);

    /// Whether any blocking geometry (solid or one-way) covers `point`
    fn is_solid_at(&self, point: Vec2) -> bool;
}

/// One-way platform rule
///
/// Blocks only when the body's bottom edge on the *previous* tick was at or
/// above the platform top (within `tolerance`) and the body is not moving up.
/// Using the previous position keeps fast falls from tunneling.
#[inline]
pub fn one_way_blocks(
    prev_bottom: f32,
    platform_top: f32,
    vel_y: f32,
    tolerance: f32,
    drop_through: bool,
) -> bool {
    !drop_through && vel_y >= 0.0 && prev_bottom <= platform_top + tolerance
}

/// A blocking rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub rect: Aabb,
    pub kind: SolidKind,
}

/// Tile-based substrate: static tiles plus whichever phase bricks are collidable
#[derive(Debug, Clone)]
pub struct TileWorld {
    tiles: Vec<Collider>,
    bricks: Vec<Collider>,
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub one_way_tolerance: f32,
}

impl Default for TileWorld {
    fn default() -> Self {
        Self {
            tiles: Vec::new(),
            bricks: Vec::new(),
            gravity: GRAVITY,
            max_fall_speed: MAX_FALL_SPEED,
            one_way_tolerance: ONE_WAY_TOLERANCE,
        }
    }
}

impl TileWorld {
    pub fn new(tiles: &[Tile]) -> Self {
        Self {
            tiles: tiles
                .iter()
                .map(|t| Collider {
                    rect: t.rect,
                    kind: t.kind,
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Rebuild the brick colliders from current collidability
    ///
    /// Ghost-phase bricks are left out entirely.
    pub fn sync_bricks(&mut self, bricks: &[PhaseBrick]) {
        self.bricks.clear();
        self.bricks.extend(bricks.iter().filter(|b| b.collidable).map(|b| Collider {
            rect: b.rect,
            kind: b.kind,
        }));
    }

    pub fn colliders(&self) -> impl Iterator<Item = &Collider> {
        self.tiles.iter().chain(self.bricks.iter())
    }

    fn resolve_x(&self, body: &mut Body, contacts: &mut Contacts) {
        let half = body.shape.half_extents();
        for collider in self.colliders() {
            if collider.kind == SolidKind::OneWay {
                continue;
            }
            let rect = body.aabb();
            if !rect.overlaps(&collider.rect) {
                continue;
            }
            if body.vel.x > 0.0 {
                body.pos.x = collider.rect.left() - half.x;
                contacts.blocked_right = true;
                body.vel.x = 0.0;
            } else if body.vel.x < 0.0 {
                body.pos.x = collider.rect.right() + half.x;
                contacts.blocked_left = true;
                body.vel.x = 0.0;
            }
        }
    }

    fn resolve_y(&self, body: &mut Body, contacts: &mut Contacts) {
        let half = body.shape.half_extents();
        let prev_bottom = body.prev_bottom();
        for collider in self.colliders() {
            let rect = body.aabb();
            if !rect.overlaps(&collider.rect) {
                continue;
            }
            match collider.kind {
                SolidKind::Solid => {
                    let falling_onto = body.vel.y > 0.0
                        || (body.vel.y == 0.0 && body.pos.y < collider.rect.center.y);
                    if falling_onto {
                        body.pos.y = collider.rect.top() - half.y;
                        contacts.grounded = true;
                    } else {
                        body.pos.y = collider.rect.bottom() + half.y;
                        contacts.blocked_up = true;
                    }
                    body.vel.y = 0.0;
                }
                SolidKind::OneWay => {
                    if one_way_blocks(
                        prev_bottom,
                        collider.rect.top(),
                        body.vel.y,
                        self.one_way_tolerance,
                        body.drop_through,
                    ) {
                        body.pos.y = collider.rect.top() - half.y;
                        body.vel.y = 0.0;
                        contacts.grounded = true;
                        contacts.on_one_way = true;
                    }
                }
            }
        }
    }
}

impl PhysicsSubstrate for TileWorld {
    fn integrate(&self, body: &mut Body, dt_ms: f32) {
        let dt = ms_to_secs(dt_ms);
        body.prev_pos = body.pos;

        if body.gravity_scale != 0.0 {
            let fall = body.vel.y + self.gravity * body.gravity_scale * dt;
            body.vel.y = fall.min(self.max_fall_speed);
        }

        let mut contacts = Contacts::default();
        if !body.collides {
            body.pos += body.vel * dt;
            body.contacts = contacts;
            return;
        }

        body.pos.x += body.vel.x * dt;
        self.resolve_x(body, &mut contacts);

        body.pos.y += body.vel.y * dt;
        self.resolve_y(body, &mut contacts);

        body.contacts = contacts;
    }

    fn is_solid_at(&self, point: Vec2) -> bool {
        self.colliders().any(|c| c.rect.contains_point(point))
    }
}
