//! Adversaries: one shared combat record plus interchangeable movement policies
//!
//! [`AdversaryCore`] carries lifecycle, health and body; [`Behavior`] is the
//! per-variant movement policy. The contract methods on [`Adversary`]
//! (update, stomp/dash checks and hooks, overlap, danger, death) are the
//! only surface the contact resolver and tick driver use.

mod ambusher;
mod flyer;
mod jumper;
mod orbiter;
mod patrol;

pub use ambusher::Ambusher;
pub use flyer::PhaseFlyer;
pub use jumper::PursuitJumper;
pub use orbiter::{OrbitPattern, Orbiter};
pub use patrol::Patrol;

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::collision::PhysicsSubstrate;
use super::phase::{EntityId, GroupId, Phase, PhaseReactive};
use super::state::GameEvent;
use crate::tuning::CombatTuning;

/// Monotonic lifecycle: Active -> Dying -> Dead
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    Active,
    Dying,
    Dead,
}

/// Outcome of a stomp or dash hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitResult {
    /// Survived; non-lethal flash started
    Flashed,
    /// Health reached zero; now dying
    Killed,
    /// Not applicable (already dying)
    Ignored,
}

/// What the overlap hook did with a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapResponse {
    /// Resolve the contact normally
    Continue,
    /// The hook used up this contact
    Consumed,
}

/// Everything an adversary may read or touch during its update
pub struct AdversaryContext<'a> {
    pub player_pos: Vec2,
    pub physics: &'a dyn PhysicsSubstrate,
    pub rng: &'a mut Pcg32,
    pub events: &'a mut Vec<GameEvent>,
}

/// Fields shared by every variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdversaryCore {
    pub id: EntityId,
    pub body: Body,
    /// -1 left, 1 right
    pub facing: f32,
    lifecycle: Lifecycle,
    pub health: u32,
    pub max_health: u32,
    pub flash_remaining: f32,
    pub dying_elapsed: f32,
    pub visible: bool,
    pub combat_eligible: bool,
    pub alpha: f32,
    pub group: Option<GroupId>,
}

impl AdversaryCore {
    pub fn new(id: EntityId, body: Body, health: u32) -> Self {
        debug_assert!(health > 0, "adversary {id} spawned without health");
        Self {
            id,
            body,
            facing: -1.0,
            lifecycle: Lifecycle::Active,
            health: health.max(1),
            max_health: health.max(1),
            flash_remaining: 0.0,
            dying_elapsed: 0.0,
            visible: true,
            combat_eligible: true,
            alpha: 1.0,
            group: None,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    fn set_lifecycle(&mut self, next: Lifecycle) {
        debug_assert!(
            next >= self.lifecycle,
            "adversary {}: lifecycle moved backward {:?} -> {:?}",
            self.id,
            self.lifecycle,
            next
        );
        if next > self.lifecycle {
            self.lifecycle = next;
        }
    }

    pub fn reverse(&mut self) {
        self.facing = -self.facing;
    }
}

/// Per-variant movement policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Behavior {
    Patrol(Patrol),
    PursuitJumper(PursuitJumper),
    PhaseFlyer(PhaseFlyer),
    Orbiter(Orbiter),
    Ambusher(Ambusher),
}

impl Behavior {
    pub fn name(&self) -> &'static str {
        match self {
            Behavior::Patrol(_) => "patroller",
            Behavior::PursuitJumper(_) => "pursuit jumper",
            Behavior::PhaseFlyer(_) => "phase flyer",
            Behavior::Orbiter(_) => "orbiter",
            Behavior::Ambusher(_) => "ambusher",
        }
    }

    /// Length of the variant's death sequence (ms)
    pub fn death_duration(&self) -> f32 {
        match self {
            Behavior::Patrol(_) | Behavior::PursuitJumper(_) => 300.0,
            Behavior::PhaseFlyer(_) => 400.0,
            Behavior::Orbiter(_) => 250.0,
            Behavior::Ambusher(_) => 350.0,
        }
    }

    /// Whether the variant currently accepts stomps and dash tags
    fn hittable(&self, core: &AdversaryCore) -> bool {
        match self {
            Behavior::PhaseFlyer(_) => core.combat_eligible,
            Behavior::Ambusher(a) => !a.disguised,
            _ => true,
        }
    }
}

/// A live adversary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adversary {
    pub core: AdversaryCore,
    pub behavior: Behavior,
}

impl Adversary {
    pub fn new(core: AdversaryCore, behavior: Behavior) -> Self {
        Self { core, behavior }
    }

    pub fn id(&self) -> EntityId {
        self.core.id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.core.lifecycle
    }

    pub fn pos(&self) -> Vec2 {
        self.core.body.pos
    }

    /// Advance one tick; only the death sequence runs outside Active
    pub fn update(&mut self, time: f32, dt: f32, ctx: &mut AdversaryContext<'_>) {
        match self.core.lifecycle {
            Lifecycle::Dead => return,
            Lifecycle::Dying => {
                self.play_death(dt, ctx.physics);
                return;
            }
            Lifecycle::Active => {}
        }

        self.core.flash_remaining = (self.core.flash_remaining - dt).max(0.0);

        match &mut self.behavior {
            Behavior::Patrol(p) => p.update(&mut self.core, dt, ctx),
            Behavior::PursuitJumper(j) => j.update(&mut self.core, time, dt, ctx),
            Behavior::PhaseFlyer(f) => f.update(&mut self.core, time, dt),
            Behavior::Orbiter(o) => o.update(&mut self.core, dt),
            Behavior::Ambusher(a) => a.update(&mut self.core, dt, ctx),
        }
    }

    fn play_death(&mut self, dt: f32, physics: &dyn PhysicsSubstrate) {
        let duration = self.behavior.death_duration();
        self.core.dying_elapsed += dt;
        let progress = (self.core.dying_elapsed / duration).min(1.0);
        self.core.alpha = 1.0 - progress;

        // Flyers drop out of the air as they fade
        if let Behavior::PhaseFlyer(_) = self.behavior {
            self.core.body.gravity_scale = 1.0;
            physics.integrate(&mut self.core.body, dt);
        }

        if progress >= 1.0 {
            self.core.set_lifecycle(Lifecycle::Dead);
            self.core.visible = false;
            log::debug!("{} {} destroyed", self.behavior.name(), self.core.id);
        }
    }

    /// Player landing on top while falling
    ///
    /// Either the feet before this tick's move or the feet now must be within
    /// `tolerance` of the top, so a fast fall that sinks deep in one tick
    /// still counts.
    pub fn check_stomp(&self, player: &Body, tolerance: f32) -> bool {
        let top = self.core.body.top() + tolerance;
        self.core.is_active()
            && self.behavior.hittable(&self.core)
            && player.vel.y > 0.0
            && (player.prev_bottom() <= top || player.bottom() <= top)
    }

    /// Player overlapping while dashing
    pub fn check_dash(&self, player_dashing: bool) -> bool {
        self.core.is_active() && player_dashing && self.behavior.hittable(&self.core)
    }

    pub fn on_stomp(&mut self, combat: &CombatTuning) -> HitResult {
        self.apply_hit(combat)
    }

    pub fn on_dash(&mut self, combat: &CombatTuning) -> HitResult {
        self.apply_hit(combat)
    }

    fn apply_hit(&mut self, combat: &CombatTuning) -> HitResult {
        if !self.core.is_active() {
            return HitResult::Ignored;
        }
        debug_assert!(self.core.health > 0, "active adversary {} with zero health", self.core.id);
        self.core.health = self.core.health.saturating_sub(1);
        if self.core.health == 0 {
            self.die();
            HitResult::Killed
        } else {
            self.core.flash_remaining = combat.hit_flash_ms;
            HitResult::Flashed
        }
    }

    /// Hook run before any other contact test
    pub fn on_overlap(&mut self, events: &mut Vec<GameEvent>) -> OverlapResponse {
        if !self.core.is_active() {
            return OverlapResponse::Continue;
        }
        match &mut self.behavior {
            Behavior::Ambusher(a) if a.disguised => {
                a.reveal(&mut self.core, events);
                OverlapResponse::Consumed
            }
            _ => OverlapResponse::Continue,
        }
    }

    /// Whether touching the player should hurt the player
    pub fn on_player_collision(&self) -> bool {
        self.is_dangerous()
    }

    pub fn is_dangerous(&self) -> bool {
        self.core.is_active() && self.core.combat_eligible && self.behavior.hittable(&self.core)
    }

    /// Stomp bounce multiplier for this variant
    pub fn bounce_multiplier(&self, combat: &CombatTuning) -> f32 {
        match self.behavior {
            Behavior::Orbiter(_) => combat.orbiter_bounce_multiplier,
            _ => 1.0,
        }
    }

    /// Active -> Dying; physics frozen, death sequence starts next update
    pub fn die(&mut self) {
        if !self.core.is_active() {
            return;
        }
        self.core.set_lifecycle(Lifecycle::Dying);
        self.core.body.freeze();
        self.core.combat_eligible = false;
        self.core.flash_remaining = 0.0;
        self.core.dying_elapsed = 0.0;
    }
}

impl PhaseReactive for Adversary {
    fn set_phase_state(&mut self, phase: Phase) {
        if let Behavior::PhaseFlyer(flyer) = &mut self.behavior {
            flyer.set_phase_state(&mut self.core, phase);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::TileWorld;
    use rand::SeedableRng;

    fn patroller(health: u32) -> Adversary {
        let core = AdversaryCore::new(1, Body::rect(Vec2::ZERO, Vec2::new(24.0, 24.0)), health);
        Adversary::new(core, Behavior::Patrol(Patrol::new(60.0)))
    }

    fn falling_player_above(adversary: &Adversary) -> Body {
        let mut player = Body::rect(
            Vec2::new(0.0, adversary.core.body.top() - 12.0),
            Vec2::new(20.0, 28.0),
        );
        player.vel.y = 200.0;
        player
    }

    #[test]
    fn test_two_stomps_kill_and_finish_death() {
        let combat = CombatTuning::default();
        let mut enemy = patroller(2);

        assert_eq!(enemy.on_stomp(&combat), HitResult::Flashed);
        assert_eq!(enemy.lifecycle(), Lifecycle::Active);
        assert_eq!(enemy.core.health, 1);
        assert!(enemy.core.flash_remaining > 0.0);

        assert_eq!(enemy.on_stomp(&combat), HitResult::Killed);
        assert_eq!(enemy.core.health, 0);
        assert_eq!(enemy.lifecycle(), Lifecycle::Dying);

        let world = TileWorld::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut events = Vec::new();
        let mut ctx = AdversaryContext {
            player_pos: Vec2::ZERO,
            physics: &world,
            rng: &mut rng,
            events: &mut events,
        };
        for _ in 0..30 {
            enemy.update(0.0, 16.0, &mut ctx);
        }
        assert_eq!(enemy.lifecycle(), Lifecycle::Dead);
        assert_eq!(enemy.on_stomp(&combat), HitResult::Ignored);
    }

    #[test]
    fn test_stomp_requires_falling_from_above() {
        let enemy = patroller(1);
        let mut player = falling_player_above(&enemy);
        assert!(enemy.check_stomp(&player, 10.0));

        player.vel.y = -50.0;
        assert!(!enemy.check_stomp(&player, 10.0));

        player.vel.y = 50.0;
        player.pos.y = enemy.core.body.pos.y;
        player.prev_pos.y = player.pos.y - 1.0;
        assert!(!enemy.check_stomp(&player, 10.0));
    }

    #[test]
    fn test_fast_fall_stomps_from_previous_feet() {
        let enemy = patroller(1);
        let mut player = falling_player_above(&enemy);
        player.vel.y = 900.0;
        // Feet were on the top last tick and are 14px inside it now
        player.prev_pos.y = enemy.core.body.top() - 14.0;
        player.pos.y = player.prev_pos.y + 14.0;
        assert!(player.bottom() > enemy.core.body.top() + 10.0);
        assert!(enemy.check_stomp(&player, 10.0));
    }

    #[test]
    fn test_dying_adversary_is_harmless_and_frozen() {
        let mut enemy = patroller(1);
        enemy.core.body.vel = Vec2::new(40.0, 10.0);
        enemy.die();
        assert!(!enemy.is_dangerous());
        assert!(!enemy.check_dash(true));
        assert_eq!(enemy.core.body.vel, Vec2::ZERO);
        assert!(!enemy.check_stomp(&falling_player_above(&enemy), 10.0));
    }

    #[test]
    fn test_dash_check_needs_dashing_player() {
        let enemy = patroller(1);
        assert!(enemy.check_dash(true));
        assert!(!enemy.check_dash(false));
    }
}
