//! Ambusher: sits disguised until the player comes close, then chases

use serde::{Deserialize, Serialize};

use super::{AdversaryContext, AdversaryCore};
use crate::sim::state::GameEvent;
use crate::{approach, ms_to_secs, sign};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ambusher {
    /// While true the ambusher can neither hurt nor be hit
    pub disguised: bool,
    pub reveal_radius: f32,
    pub chase_speed: f32,
    /// Horizontal acceleration while chasing (px/s^2)
    pub chase_accel: f32,
}

impl Ambusher {
    pub fn new(reveal_radius: f32) -> Self {
        Self {
            disguised: true,
            reveal_radius,
            chase_speed: 150.0,
            chase_accel: 900.0,
        }
    }

    pub(super) fn update(
        &mut self,
        core: &mut AdversaryCore,
        dt: f32,
        ctx: &mut AdversaryContext<'_>,
    ) {
        if self.disguised {
            if core.body.pos.distance(ctx.player_pos) <= self.reveal_radius {
                self.reveal(core, ctx.events);
            } else {
                core.body.vel.x = 0.0;
                ctx.physics.integrate(&mut core.body, dt);
                return;
            }
        }

        let dx = ctx.player_pos.x - core.body.pos.x;
        if dx != 0.0 {
            core.facing = sign(dx);
        }
        let target = core.facing * self.chase_speed;
        core.body.vel.x = approach(core.body.vel.x, target, self.chase_accel * ms_to_secs(dt));
        ctx.physics.integrate(&mut core.body, dt);
    }

    pub(super) fn reveal(&mut self, core: &mut AdversaryCore, events: &mut Vec<GameEvent>) {
        if !self.disguised {
            return;
        }
        self.disguised = false;
        events.push(GameEvent::AdversaryRevealed { adversary: core.id });
        log::debug!("ambusher {} revealed", core.id);
    }
}
