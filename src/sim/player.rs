//! Player movement controller
//!
//! Layered model, run once per tick in a fixed order:
//! invincibility, grounded edge, run + jump, dash, idle friction, integration.
//! Every timestamp is simulation time in milliseconds supplied by the driver.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::collision::PhysicsSubstrate;
use super::state::GameEvent;
use crate::consts::{PLAYER_HEIGHT, PLAYER_MAX_HEALTH, PLAYER_WIDTH};
use crate::tuning::MovementTuning;
use crate::{approach, ms_to_secs, sign};

/// Dash-charge economy owned by the scoring collaborator
pub trait DashCharges {
    fn charges(&self) -> u32;
    /// Spend one charge; `false` (and no change) when the balance is zero
    fn use_charge(&mut self) -> bool;
}

/// Minimal charge balance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeBank {
    charges: u32,
}

impl ChargeBank {
    pub fn new(charges: u32) -> Self {
        Self { charges }
    }

    pub fn add(&mut self, amount: u32) {
        self.charges = self.charges.saturating_add(amount);
    }
}

impl DashCharges for ChargeBank {
    fn charges(&self) -> u32 {
        self.charges
    }

    fn use_charge(&mut self) -> bool {
        if self.charges == 0 {
            return false;
        }
        self.charges -= 1;
        true
    }
}

/// Held buttons for a single tick
///
/// `jump` is the held state; presses are detected as edges by the controller.
/// `dash` is a one-shot request for this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub jump: bool,
    pub dash: bool,
}

impl PlayerInput {
    /// Held horizontal direction (-1, 0, 1)
    pub fn direction(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// The player body plus its movement state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    pub tuning: MovementTuning,
    /// -1 left, 1 right
    pub facing: f32,

    pub grounded: bool,
    pub was_grounded: bool,
    pub last_grounded_at: Option<f32>,
    pub jump_buffered_at: Option<f32>,
    /// Jump eligibility, consumed by a jump and re-armed on landing
    pub can_jump: bool,
    pub jumping: bool,
    pub jump_hold_elapsed: f32,

    pub dashing: bool,
    pub dash_elapsed: f32,
    pub dash_direction: f32,
    pub last_dash_at: Option<f32>,

    pub crouching: bool,
    pub drop_through_remaining: f32,

    pub health: u32,
    pub max_health: u32,
    pub invincible: bool,
    pub invincible_elapsed: f32,
    pub dead: bool,

    jump_held_prev: bool,
}

impl Player {
    pub fn new(spawn: Vec2, tuning: MovementTuning) -> Self {
        Self {
            body: Body::rect(spawn, Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT)),
            tuning,
            facing: 1.0,
            grounded: false,
            was_grounded: false,
            last_grounded_at: None,
            jump_buffered_at: None,
            can_jump: false,
            jumping: false,
            jump_hold_elapsed: 0.0,
            dashing: false,
            dash_elapsed: 0.0,
            dash_direction: 1.0,
            last_dash_at: None,
            crouching: false,
            drop_through_remaining: 0.0,
            health: PLAYER_MAX_HEALTH,
            max_health: PLAYER_MAX_HEALTH,
            invincible: false,
            invincible_elapsed: 0.0,
            dead: false,
            jump_held_prev: false,
        }
    }

    /// Put the player back at `spawn` with full health and cleared timers
    pub fn respawn(&mut self, spawn: Vec2) {
        let tuning = self.tuning.clone();
        let max_health = self.max_health;
        *self = Self::new(spawn, tuning);
        self.max_health = max_health;
        self.health = max_health;
    }

    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    pub fn is_falling(&self) -> bool {
        self.body.vel.y > 0.0
    }

    /// Advance one tick
    pub fn update(
        &mut self,
        time: f32,
        dt: f32,
        input: &PlayerInput,
        physics: &dyn PhysicsSubstrate,
        charges: &mut dyn DashCharges,
        events: &mut Vec<GameEvent>,
    ) {
        if self.dead {
            return;
        }

        self.tick_invincibility(dt);
        self.refresh_grounded(time, events);

        let direction = input.direction();
        let jump_pressed = input.jump && !self.jump_held_prev;
        self.jump_held_prev = input.jump;

        if !self.dashing {
            self.apply_run(direction, input.down, dt);
            self.apply_drop_through(input.down);
            if jump_pressed {
                self.jump_buffered_at = Some(time);
            }
            self.apply_jump(time, dt, input.jump, events);
        }

        if input.dash {
            self.try_dash(time, charges, events);
        }
        self.apply_dash(dt);

        if !self.dashing && (direction == 0.0 || self.crouching) {
            self.apply_friction(dt);
        }

        self.body.drop_through = self.drop_through_remaining > 0.0;
        self.drop_through_remaining = (self.drop_through_remaining - dt).max(0.0);
        physics.integrate(&mut self.body, dt);
    }

    fn tick_invincibility(&mut self, dt: f32) {
        if !self.invincible {
            return;
        }
        self.invincible_elapsed += dt;
        if self.invincible_elapsed >= self.tuning.invincibility_ms {
            self.invincible = false;
            self.invincible_elapsed = 0.0;
        }
    }

    fn refresh_grounded(&mut self, time: f32, events: &mut Vec<GameEvent>) {
        self.grounded = self.body.contacts.grounded;
        if self.grounded {
            self.last_grounded_at = Some(time);
            if !self.was_grounded {
                self.can_jump = true;
                self.jumping = false;
                events.push(GameEvent::Landed);
            }
        }
        self.was_grounded = self.grounded;
    }

    fn apply_run(&mut self, direction: f32, down: bool, dt: f32) {
        self.crouching = down && self.grounded;
        if direction == 0.0 || self.crouching {
            return;
        }
        self.facing = direction;
        let accel = if self.grounded {
            self.tuning.ground_acceleration
        } else {
            self.tuning.air_acceleration
        };
        let target = direction * self.tuning.max_run_speed;
        self.body.vel.x = approach(self.body.vel.x, target, accel * ms_to_secs(dt));
    }

    fn apply_drop_through(&mut self, down: bool) {
        if down
            && self.grounded
            && self.body.contacts.on_one_way
            && self.drop_through_remaining <= 0.0
        {
            self.drop_through_remaining = self.tuning.drop_through_ms;
        }
    }

    fn within_coyote(&self, time: f32) -> bool {
        self.grounded
            || self
                .last_grounded_at
                .is_some_and(|t| time - t <= self.tuning.coyote_ms)
    }

    fn apply_jump(&mut self, time: f32, dt: f32, held: bool, events: &mut Vec<GameEvent>) {
        if let Some(at) = self.jump_buffered_at {
            if time - at > self.tuning.jump_buffer_ms {
                self.jump_buffered_at = None;
            } else if self.can_jump
                && self.within_coyote(time)
                && self.drop_through_remaining <= 0.0
            {
                self.can_jump = false;
                self.jumping = true;
                self.jump_hold_elapsed = 0.0;
                self.jump_buffered_at = None;
                self.body.vel.y = -self.tuning.jump_velocity;
                events.push(GameEvent::Jumped);
                return;
            }
        }

        if !self.jumping {
            return;
        }
        if self.body.vel.y >= 0.0 {
            self.jumping = false;
        } else if !held {
            let floor = -self.tuning.jump_release_velocity;
            if self.body.vel.y < floor {
                self.body.vel.y = floor;
            }
            self.jumping = false;
        } else if self.jump_hold_elapsed < self.tuning.max_jump_hold_ms {
            self.body.vel.y -= self.tuning.jump_hold_boost;
            self.jump_hold_elapsed += dt;
        }
    }

    /// Start a dash; rejected while dashing, on cooldown, or without charge
    pub fn try_dash(
        &mut self,
        time: f32,
        charges: &mut dyn DashCharges,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        if self.dead || self.dashing {
            return false;
        }
        if let Some(last) = self.last_dash_at {
            if time - last < self.tuning.dash_cooldown_ms {
                log::trace!("dash rejected: cooldown ({:.0}ms since last)", time - last);
                return false;
            }
        }
        if charges.charges() == 0 || !charges.use_charge() {
            log::trace!("dash rejected: no charge");
            return false;
        }

        let direction = if self.body.vel.x == 0.0 {
            self.facing
        } else {
            sign(self.body.vel.x)
        };
        self.dashing = true;
        self.dash_elapsed = 0.0;
        self.dash_direction = direction;
        self.last_dash_at = Some(time);
        self.facing = direction;
        self.jumping = false;
        self.crouching = false;
        events.push(GameEvent::Dashed { direction });
        true
    }

    fn apply_dash(&mut self, dt: f32) {
        if !self.dashing {
            self.body.gravity_scale = 1.0;
            return;
        }
        self.body.vel = Vec2::new(self.dash_direction * self.tuning.dash_speed, 0.0);
        self.body.gravity_scale = 0.0;
        self.dash_elapsed += dt;
        if self.dash_elapsed >= self.tuning.dash_duration_ms {
            self.dashing = false;
            self.dash_elapsed = 0.0;
            self.body.gravity_scale = 1.0;
            self.body.vel.x = self.dash_direction * self.tuning.max_run_speed;
        }
    }

    fn apply_friction(&mut self, dt: f32) {
        let friction = if self.grounded {
            self.tuning.ground_friction
        } else {
            self.tuning.air_friction
        };
        self.body.vel.x = approach(self.body.vel.x, 0.0, friction * ms_to_secs(dt));
    }

    /// Apply one point of damage from a source at `source_x`
    ///
    /// A strict no-op while invincible, dead, or once the level is complete.
    pub fn take_damage(
        &mut self,
        source_x: Option<f32>,
        level_complete: bool,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        if self.invincible || self.dead || level_complete {
            return false;
        }
        debug_assert!(self.health > 0, "living player with zero health");

        self.health = self.health.saturating_sub(1);
        events.push(GameEvent::Damaged {
            health: self.health,
        });

        if self.health == 0 {
            self.die(events);
            return true;
        }

        self.invincible = true;
        self.invincible_elapsed = 0.0;
        if let Some(x) = source_x {
            let away = if self.body.pos.x == x {
                -self.facing
            } else {
                sign(self.body.pos.x - x)
            };
            self.body.vel = Vec2::new(away * self.tuning.knockback_x, -self.tuning.knockback_y);
            self.dashing = false;
            self.jumping = false;
        }
        true
    }

    /// Terminal; fires `Died` exactly once
    pub fn die(&mut self, events: &mut Vec<GameEvent>) {
        if self.dead {
            return;
        }
        self.dead = true;
        self.invincible = false;
        self.dashing = false;
        self.jumping = false;
        self.body.vel = Vec2::ZERO;
        log::info!("player died at ({:.0}, {:.0})", self.body.pos.x, self.body.pos.y);
        events.push(GameEvent::Died);
    }

    /// Bounce upward after a stomp
    pub fn bounce(&mut self, speed: f32) {
        self.body.vel.y = -speed;
        self.jumping = false;
    }
}
