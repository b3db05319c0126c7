//! Contact resolution between the player and everything it touches
//!
//! Runs once per tick after all movement. Each overlapping player/adversary
//! pair gets at most one outcome, tested in priority order: the adversary's
//! overlap hook, stomp, dash tag, contact damage. Player/brick pairs are
//! classified from the brick's current collidability.

use super::adversary::{Adversary, HitResult, OverlapResponse};
use super::body::Aabb;
use super::brick::{PhaseBrick, SolidKind};
use super::collision::{ONE_WAY_TOLERANCE, one_way_blocks};
use super::phase::EntityId;
use super::player::Player;
use super::state::{GameEvent, PLAYER_ID};
use crate::tuning::Tuning;

/// Slack so a body resting flush against a brick still counts as touching it
const TOUCH_MARGIN: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Blocked,
    PassedThrough,
    Stomp,
    DashTag,
    Damage,
    /// Touching, but nothing applied (hook consumed it, or no party eligible)
    None,
}

/// One resolved pair; produced and consumed within a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactOutcome {
    pub kind: ContactKind,
    pub actor: EntityId,
    pub target: EntityId,
}

impl ContactOutcome {
    fn player(kind: ContactKind, target: EntityId) -> Self {
        Self {
            kind,
            actor: PLAYER_ID,
            target,
        }
    }
}

pub struct ContactResolver<'a> {
    tuning: &'a Tuning,
    level_complete: bool,
    /// Must match the substrate's, or brick outcomes disagree with the collision
    one_way_tolerance: f32,
}

impl<'a> ContactResolver<'a> {
    pub fn new(tuning: &'a Tuning, level_complete: bool) -> Self {
        Self {
            tuning,
            level_complete,
            one_way_tolerance: ONE_WAY_TOLERANCE,
        }
    }

    pub fn with_one_way_tolerance(mut self, tolerance: f32) -> Self {
        self.one_way_tolerance = tolerance;
        self
    }

    /// Resolve every overlapping player/adversary pair, in adversary-id order
    pub fn resolve_adversaries(
        &self,
        player: &mut Player,
        adversaries: &mut [Adversary],
        events: &mut Vec<GameEvent>,
    ) -> Vec<ContactOutcome> {
        let mut outcomes = Vec::new();
        for enemy in adversaries.iter_mut() {
            if player.dead {
                break;
            }
            if !enemy.core.is_active() || !player.body.overlaps(&enemy.core.body) {
                continue;
            }
            let kind = self.resolve_pair(player, enemy, events);
            outcomes.push(ContactOutcome::player(kind, enemy.id()));
        }
        outcomes
    }

    fn resolve_pair(
        &self,
        player: &mut Player,
        enemy: &mut Adversary,
        events: &mut Vec<GameEvent>,
    ) -> ContactKind {
        let combat = &self.tuning.combat;
        let id = enemy.id();

        if enemy.on_overlap(events) == OverlapResponse::Consumed {
            return ContactKind::None;
        }

        if enemy.check_stomp(&player.body, combat.stomp_tolerance) {
            let bounce = self.tuning.movement.stomp_bounce * enemy.bounce_multiplier(combat);
            let result = enemy.on_stomp(combat);
            // Lift clear of the adversary so the rebound tick can't count as contact
            player.body.pos.y = enemy.core.body.top() - player.body.shape.half_extents().y;
            player.bounce(bounce);
            events.push(GameEvent::Stomped { adversary: id });
            push_hit(result, id, events);
            return ContactKind::Stomp;
        }

        if enemy.check_dash(player.dashing) {
            let result = enemy.on_dash(combat);
            events.push(GameEvent::DashTagged { adversary: id });
            push_hit(result, id, events);
            return ContactKind::DashTag;
        }

        // A dashing player ignores contact damage
        if !player.dashing
            && enemy.on_player_collision()
            && player.take_damage(Some(enemy.pos().x), self.level_complete, events)
        {
            return ContactKind::Damage;
        }
        ContactKind::None
    }

    /// Classify the bricks the player is touching
    ///
    /// Ghost-phase bricks never block; one-way bricks block only under the
    /// previous-bottom rule.
    pub fn resolve_bricks(&self, player: &Player, bricks: &[PhaseBrick]) -> Vec<ContactOutcome> {
        let body = &player.body;
        let reach = Aabb {
            center: body.pos,
            half: body.shape.half_extents() + TOUCH_MARGIN,
        };
        bricks
            .iter()
            .filter(|brick| reach.overlaps(&brick.rect))
            .map(|brick| {
                let blocks = brick.collidable
                    && match brick.kind {
                        SolidKind::Solid => true,
                        SolidKind::OneWay => one_way_blocks(
                            body.prev_bottom(),
                            brick.rect.top(),
                            body.vel.y,
                            self.one_way_tolerance,
                            body.drop_through,
                        ),
                    };
                let kind = if blocks {
                    ContactKind::Blocked
                } else {
                    ContactKind::PassedThrough
                };
                ContactOutcome::player(kind, brick.id)
            })
            .collect()
    }
}

fn push_hit(result: HitResult, adversary: EntityId, events: &mut Vec<GameEvent>) {
    match result {
        HitResult::Killed => {
            log::debug!("adversary {adversary} defeated");
            events.push(GameEvent::EnemyDefeated { adversary });
        }
        HitResult::Flashed => events.push(GameEvent::AdversaryFlashed { adversary }),
        HitResult::Ignored => {}
    }
}
