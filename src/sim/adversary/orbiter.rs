//! Orbiter: follows a parametric path around a fixed center

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::AdversaryCore;
use crate::{ms_to_secs, sign, unit_from_angle};

/// Path shape, parameterized by the orbit angle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum OrbitPattern {
    /// Full ellipse (a circle when both radii match)
    #[default]
    Ellipse,
    /// Pendulum swing below the center, `sweep` radians either side
    Arc { sweep: f32 },
    /// Lemniscate of Gerono
    FigureEight,
}

impl OrbitPattern {
    /// Offset from the center for orbit angle `angle`
    pub fn offset(&self, angle: f32, radii: Vec2) -> Vec2 {
        match *self {
            OrbitPattern::Ellipse => radii * unit_from_angle(angle),
            OrbitPattern::Arc { sweep } => {
                let swing = sweep.min(FRAC_PI_2) * angle.sin();
                Vec2::new(radii.x * swing.sin(), radii.y * swing.cos())
            }
            OrbitPattern::FigureEight => {
                Vec2::new(radii.x * angle.sin(), radii.y * angle.sin() * angle.cos())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Orbiter {
    pub center: Vec2,
    pub radii: Vec2,
    /// Radians per second
    pub angular_speed: f32,
    pub angle: f32,
    pub pattern: OrbitPattern,
}

impl Orbiter {
    pub fn new(center: Vec2, radii: Vec2, angular_speed: f32, pattern: OrbitPattern) -> Self {
        Self {
            center,
            radii,
            angular_speed,
            angle: 0.0,
            pattern,
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn position(&self) -> Vec2 {
        self.center + self.pattern.offset(self.angle, self.radii)
    }

    pub(super) fn update(&mut self, core: &mut AdversaryCore, dt: f32) {
        self.angle = (self.angle + self.angular_speed * ms_to_secs(dt)).rem_euclid(TAU);
        let next = self.position();
        let dx = next.x - core.body.pos.x;
        core.body.teleport(next);
        if dx != 0.0 {
            core.facing = sign(dx);
        }
    }
}
