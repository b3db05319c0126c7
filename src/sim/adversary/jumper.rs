//! Pursuit jumper: patrols, and leaps at a player standing above it

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::patrol::Patrol;
use super::{AdversaryContext, AdversaryCore};
use crate::sim::state::GameEvent;
use crate::sign;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PursuitJumper {
    pub patrol: Patrol,
    /// Max horizontal distance to the player for a leap
    pub range_x: f32,
    /// How far above the jumper the player may be
    pub band_y: f32,
    pub check_interval_ms: f32,
    pub cooldown_ms: f32,
    pub jump_speed: f32,
    /// Horizontal speed toward the player during a leap
    pub bias_speed: f32,
    check_elapsed: f32,
    last_jump_at: Option<f32>,
    airborne: bool,
}

impl PursuitJumper {
    pub fn new(patrol: Patrol) -> Self {
        Self {
            patrol,
            range_x: 160.0,
            band_y: 140.0,
            check_interval_ms: 250.0,
            cooldown_ms: 1200.0,
            jump_speed: 520.0,
            bias_speed: 140.0,
            check_elapsed: 0.0,
            last_jump_at: None,
            airborne: false,
        }
    }

    /// Start the proximity timer part-way through its interval
    pub fn with_check_phase(mut self, elapsed: f32) -> Self {
        self.check_elapsed = elapsed.clamp(0.0, self.check_interval_ms);
        self
    }

    pub fn is_airborne(&self) -> bool {
        self.airborne
    }

    pub(super) fn update(
        &mut self,
        core: &mut AdversaryCore,
        time: f32,
        dt: f32,
        ctx: &mut AdversaryContext<'_>,
    ) {
        if self.airborne {
            ctx.physics.integrate(&mut core.body, dt);
            if core.body.contacts.grounded {
                self.airborne = false;
                core.body.vel.x = 0.0;
            }
            return;
        }

        self.patrol.step(core, dt, ctx.physics);

        self.check_elapsed += dt;
        if self.check_elapsed < self.check_interval_ms {
            return;
        }
        // Jitter the next check so groups of jumpers drift apart
        let jitter = self.check_interval_ms * 0.2;
        self.check_elapsed = if jitter > 0.0 {
            -ctx.rng.random_range(0.0..jitter)
        } else {
            0.0
        };

        if !core.body.contacts.grounded || !self.off_cooldown(time) {
            return;
        }

        let dx = ctx.player_pos.x - core.body.pos.x;
        let rise = core.body.pos.y - ctx.player_pos.y;
        if dx.abs() > self.range_x || rise <= 0.0 || rise > self.band_y {
            return;
        }

        let toward = if dx == 0.0 { core.facing } else { sign(dx) };
        core.facing = toward;
        core.body.vel.x = toward * self.bias_speed;
        core.body.vel.y = -self.jump_speed;
        self.last_jump_at = Some(time);
        self.airborne = true;
        ctx.events.push(GameEvent::AdversaryLeapt { adversary: core.id });
    }

    fn off_cooldown(&self, time: f32) -> bool {
        self.last_jump_at
            .is_none_or(|t| time - t >= self.cooldown_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT_MS;
    use crate::sim::adversary::{Adversary, Behavior};
    use crate::sim::body::{Aabb, Body};
    use crate::sim::brick::{SolidKind, Tile};
    use crate::sim::collision::TileWorld;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn floor() -> TileWorld {
        TileWorld::new(&[Tile {
            rect: Aabb::from_corner(-1000.0, 100.0, 2000.0, 32.0),
            kind: SolidKind::Solid,
        }])
    }

    fn jumper() -> Adversary {
        let core = AdversaryCore::new(
            3,
            Body::rect(Vec2::new(0.0, 88.0), Vec2::new(24.0, 24.0)),
            1,
        );
        Adversary::new(core, Behavior::PursuitJumper(PursuitJumper::new(Patrol::new(30.0))))
    }

    fn leaps(player_pos: Vec2, ticks: u32) -> usize {
        let world = floor();
        let mut enemy = jumper();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut events = Vec::new();
        let mut ctx = AdversaryContext {
            player_pos,
            physics: &world,
            rng: &mut rng,
            events: &mut events,
        };
        for i in 0..ticks {
            enemy.update(i as f32 * SIM_DT_MS, SIM_DT_MS, &mut ctx);
        }
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::AdversaryLeapt { .. }))
            .count()
    }

    #[test]
    fn test_leaps_at_player_above_in_range() {
        assert!(leaps(Vec2::new(80.0, 20.0), 30) >= 1);
    }

    #[test]
    fn test_ignores_player_out_of_range() {
        assert_eq!(leaps(Vec2::new(600.0, 20.0), 60), 0);
        // Level with or below: no leap
        assert_eq!(leaps(Vec2::new(40.0, 120.0), 60), 0);
        // Too far above the band
        assert_eq!(leaps(Vec2::new(40.0, -300.0), 60), 0);
    }

    #[test]
    fn test_cooldown_limits_leaps() {
        // 1s of simulation; cooldown is 1.2s so at most one leap
        assert_eq!(leaps(Vec2::new(60.0, 20.0), 60), 1);
    }
}
