//! Fixed timestep simulation tick
//!
//! One tick, in a fixed order: phase groups advance and broadcast, brick
//! colliders are rebuilt, the player moves, adversaries move, contacts are
//! resolved, and finished adversaries are removed.

use super::adversary::AdversaryContext;
use super::contact::{ContactOutcome, ContactResolver};
use super::player::PlayerInput;
use super::state::{GameEvent, World};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub player: PlayerInput,
}

/// Advance the world by one fixed timestep of `dt` ms
///
/// Returns this tick's contact outcomes; they are not kept on the world.
pub fn tick(world: &mut World, input: &TickInput, dt: f32) -> Vec<ContactOutcome> {
    // Phase propagation completes before anything moves this tick
    let (registry, mut members) = world.split_members();
    let transitions = registry.advance(dt, &mut members);
    world
        .events
        .extend(transitions.into_iter().map(GameEvent::from));
    world.physics.sync_bricks(&world.bricks);

    let time = world.time;
    world.player.update(
        time,
        dt,
        &input.player,
        &world.physics,
        &mut world.charges,
        &mut world.events,
    );

    let mut ctx = AdversaryContext {
        player_pos: world.player.pos(),
        physics: &world.physics,
        rng: &mut world.rng,
        events: &mut world.events,
    };
    for enemy in world.adversaries.iter_mut() {
        enemy.update(time, dt, &mut ctx);
    }

    let resolver = ContactResolver::new(&world.tuning, world.level_complete)
        .with_one_way_tolerance(world.physics.one_way_tolerance);
    let mut outcomes =
        resolver.resolve_adversaries(&mut world.player, &mut world.adversaries, &mut world.events);
    outcomes.extend(resolver.resolve_bricks(&world.player, &world.bricks));

    world.remove_dead_adversaries();

    world.time += dt;
    world.time_ticks += 1;
    outcomes
}
