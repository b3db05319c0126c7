//! Ground patrol: walk along facing, turn at walls and ledges

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{AdversaryContext, AdversaryCore};
use crate::sim::collision::PhysicsSubstrate;

/// How far below the feet the ledge probe looks
const PROBE_DEPTH: f32 = 4.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patrol {
    pub speed: f32,
    /// Pause after each turn (ms)
    pub turn_pause_ms: f32,
    /// Horizontal distance ahead of the leading edge to probe for ground
    pub probe_ahead: f32,
    pause_remaining: f32,
}

impl Patrol {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            turn_pause_ms: 0.0,
            probe_ahead: 2.0,
            pause_remaining: 0.0,
        }
    }

    pub fn with_turn_pause(mut self, pause_ms: f32) -> Self {
        self.turn_pause_ms = pause_ms;
        self
    }

    pub fn is_paused(&self) -> bool {
        self.pause_remaining > 0.0
    }

    pub(super) fn update(
        &mut self,
        core: &mut AdversaryCore,
        dt: f32,
        ctx: &mut AdversaryContext<'_>,
    ) {
        self.step(core, dt, ctx.physics);
    }

    /// One patrol tick; also driven by the pursuit jumper while grounded
    pub(super) fn step(
        &mut self,
        core: &mut AdversaryCore,
        dt: f32,
        physics: &dyn PhysicsSubstrate,
    ) {
        if self.pause_remaining > 0.0 {
            self.pause_remaining = (self.pause_remaining - dt).max(0.0);
            core.body.vel.x = 0.0;
        } else {
            core.body.vel.x = core.facing * self.speed;
        }

        physics.integrate(&mut core.body, dt);

        if self.should_turn(core, physics) {
            core.reverse();
            core.body.vel.x = 0.0;
            self.pause_remaining = self.turn_pause_ms;
        }
    }

    fn should_turn(&self, core: &AdversaryCore, physics: &dyn PhysicsSubstrate) -> bool {
        let contacts = core.body.contacts;
        let walled = (core.facing < 0.0 && contacts.blocked_left)
            || (core.facing > 0.0 && contacts.blocked_right);
        if walled {
            return true;
        }
        if !contacts.grounded {
            return false;
        }
        !physics.is_solid_at(ledge_probe(core, self.probe_ahead))
    }
}

/// Point just past the leading bottom corner
fn ledge_probe(core: &AdversaryCore, ahead: f32) -> Vec2 {
    let half = core.body.shape.half_extents();
    Vec2::new(
        core.body.pos.x + core.facing * (half.x + ahead),
        core.body.bottom() + PROBE_DEPTH,
    )
}
