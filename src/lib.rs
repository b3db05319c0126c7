//! Phase Runner - movement and timing core of a 2D action-platformer
//!
//! Core modules:
//! - `sim`: Fixed-tick simulation (phase groups, player movement, adversaries, contacts)
//! - `tuning`: Data-driven feel and combat balance

pub mod sim;
pub mod tuning;

pub use tuning::{FeelPreset, Tuning};

use glam::Vec2;

/// Game configuration constants
///
/// Time is in milliseconds, distances in pixels, y axis points down.
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT_MS: f32 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;

    /// World gravity (pixels/s², positive is down)
    pub const GRAVITY: f32 = 1400.0;
    /// Terminal fall speed
    pub const MAX_FALL_SPEED: f32 = 900.0;

    /// Tile size for bricks and platforms
    pub const TILE_SIZE: f32 = 32.0;

    /// Player collision box
    pub const PLAYER_WIDTH: f32 = 20.0;
    pub const PLAYER_HEIGHT: f32 = 28.0;
    pub const PLAYER_MAX_HEALTH: u32 = 3;

    /// Phase group defaults (used for lazily created groups)
    pub const DEFAULT_SOLID_MS: f32 = 2000.0;
    pub const DEFAULT_GHOST_MS: f32 = 2000.0;

    /// Alpha of a brick in its ghost phase
    pub const GHOST_ALPHA: f32 = 0.3;
}

/// Sign of a value with zero mapped to zero (unlike `f32::signum`)
#[inline]
pub fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Move `current` toward `target` by at most `max_delta`
#[inline]
pub fn approach(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + max_delta * sign(delta)
    }
}

/// Convert a millisecond duration to seconds
#[inline]
pub fn ms_to_secs(ms: f32) -> f32 {
    ms / 1000.0
}

/// Unit vector for an angle in radians
#[inline]
pub fn unit_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}
