//! Phase-gated flyer: bobs around an anchor, present only in its group's open phase

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::AdversaryCore;
use crate::sim::phase::Phase;
use crate::{ms_to_secs, sign};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseFlyer {
    pub anchor: Vec2,
    /// Peak offset on each axis
    pub amplitude: Vec2,
    pub frequency_hz: f32,
    /// Radians added to the wave, so neighbours don't bob in sync
    pub wave_offset: f32,
    /// Phase in which the flyer is present
    pub open_phase: Phase,
    pub fade_ms: f32,
    open: bool,
}

impl PhaseFlyer {
    pub fn new(anchor: Vec2, amplitude: Vec2, frequency_hz: f32) -> Self {
        Self {
            anchor,
            amplitude,
            frequency_hz,
            wave_offset: 0.0,
            open_phase: Phase::Solid,
            fade_ms: 250.0,
            open: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Offset from the anchor at simulation time `time` (ms)
    pub fn offset_at(&self, time: f32) -> Vec2 {
        let wave = (TAU * self.frequency_hz * ms_to_secs(time) + self.wave_offset).sin();
        self.amplitude * wave
    }

    pub(super) fn update(&mut self, core: &mut AdversaryCore, time: f32, dt: f32) {
        let target = self.anchor + self.offset_at(time);
        let moved = target.x - core.body.pos.x;
        core.body.teleport(target);
        if moved != 0.0 {
            core.facing = sign(moved);
        }

        let goal = if self.open { 1.0 } else { 0.0 };
        let step = if self.fade_ms > 0.0 { dt / self.fade_ms } else { 1.0 };
        core.alpha = crate::approach(core.alpha, goal, step);
        if !self.open && core.alpha <= 0.0 {
            core.visible = false;
        }
    }

    pub(super) fn set_phase_state(&mut self, core: &mut AdversaryCore, phase: Phase) {
        self.open = phase == self.open_phase;
        // Harmless the moment the gate closes; visibility follows the fade
        core.combat_eligible = self.open;
        if self.open {
            core.visible = true;
        }
    }
}
