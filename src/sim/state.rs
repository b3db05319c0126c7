//! World state and presentation events
//!
//! [`World`] owns everything one level needs: the phase registry, player,
//! adversaries, bricks, physics substrate, dash charges and the seeded RNG.
//! It is built once from [`LevelData`] and torn down with the level.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::adversary::{Adversary, Lifecycle};
use super::brick::PhaseBrick;
use super::collision::TileWorld;
use super::level::LevelData;
use super::phase::{
    EntityId, GroupId, Phase, PhaseCallback, PhaseMembers, PhaseReactive, PhaseRegistry,
    PhaseTransition, SubscriptionId,
};
use super::player::{ChargeBank, DashCharges, Player};
use crate::tuning::Tuning;

/// Id used for the player as a contact actor
pub const PLAYER_ID: EntityId = 0;

/// Named signals for audio and animation; never awaited
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    Landed,
    Jumped,
    Dashed { direction: f32 },
    Damaged { health: u32 },
    Died,
    PhaseChanged {
        group: GroupId,
        new_phase: Phase,
        old_phase: Phase,
    },
    Stomped { adversary: EntityId },
    DashTagged { adversary: EntityId },
    /// Non-lethal hit
    AdversaryFlashed { adversary: EntityId },
    EnemyDefeated { adversary: EntityId },
    AdversaryRevealed { adversary: EntityId },
    AdversaryLeapt { adversary: EntityId },
}

impl From<PhaseTransition> for GameEvent {
    fn from(t: PhaseTransition) -> Self {
        GameEvent::PhaseChanged {
            group: t.group,
            new_phase: t.new_phase,
            old_phase: t.old_phase,
        }
    }
}

/// Phase members of a world, borrowed apart from its registry
pub struct WorldMembers<'a> {
    bricks: &'a mut [PhaseBrick],
    adversaries: &'a mut [Adversary],
}

impl PhaseMembers for WorldMembers<'_> {
    fn member_mut(&mut self, id: EntityId) -> Option<&mut dyn PhaseReactive> {
        // Both lists are kept sorted by id
        if let Ok(index) = self.bricks.binary_search_by_key(&id, |b| b.id) {
            return Some(&mut self.bricks[index]);
        }
        match self.adversaries.binary_search_by_key(&id, |a| a.id()) {
            Ok(index) => Some(&mut self.adversaries[index]),
            Err(_) => None,
        }
    }
}

/// One level's simulation
pub struct World {
    pub tuning: Tuning,
    pub level: LevelData,
    pub registry: PhaseRegistry,
    pub player: Player,
    /// Sorted by id
    pub adversaries: Vec<Adversary>,
    /// Sorted by id
    pub bricks: Vec<PhaseBrick>,
    pub physics: TileWorld,
    pub charges: ChargeBank,
    pub rng: Pcg32,
    pub seed: u64,
    /// Simulation time (ms)
    pub time: f32,
    pub time_ticks: u64,
    pub level_complete: bool,
    pub(crate) events: Vec<GameEvent>,
    next_id: EntityId,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("level", &self.level.name)
            .field("time", &self.time)
            .field("player", &self.player.pos())
            .field("adversaries", &self.adversaries.len())
            .field("bricks", &self.bricks.len())
            .field("registry", &self.registry)
            .finish()
    }
}

impl World {
    pub fn new(level: LevelData, tuning: Tuning, seed: u64) -> Self {
        let mut registry = PhaseRegistry::with_defaults(tuning.phase_defaults);
        for spec in &level.groups {
            registry.create_group_from(spec.id, spec.config);
        }

        let mut next_id = PLAYER_ID + 1;
        let mut bricks = Vec::with_capacity(level.bricks.len());
        for spec in &level.bricks {
            let mut brick = PhaseBrick::new(next_id, spec.group, spec.rect, spec.kind);
            brick.depth = spec.depth;
            registry.register_member(brick.id, &mut brick, spec.group);
            bricks.push(brick);
            next_id += 1;
        }

        let mut physics = TileWorld::new(&level.tiles);
        physics.sync_bricks(&bricks);

        let mut world = Self {
            player: Player::new(level.player_spawn, tuning.movement.clone()),
            charges: ChargeBank::new(level.dash_charges),
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            registry,
            adversaries: Vec::with_capacity(level.adversaries.len()),
            bricks,
            physics,
            seed,
            time: 0.0,
            time_ticks: 0,
            level_complete: false,
            events: Vec::new(),
            next_id,
            level,
        };
        world.spawn_adversaries();

        log::info!(
            "level '{}' loaded: {} groups, {} bricks, {} adversaries",
            world.level.name,
            world.registry.len(),
            world.bricks.len(),
            world.adversaries.len()
        );
        world
    }

    fn spawn_adversaries(&mut self) {
        for spawn in &self.level.adversaries {
            let id = self.next_id;
            self.next_id += 1;
            let mut enemy = spawn.spawn(id, &self.tuning.combat, &mut self.rng);
            if let Some(group) = enemy.core.group {
                self.registry.register_member(id, &mut enemy, group);
            }
            log::debug!(
                "spawned {} {} at ({:.0}, {:.0})",
                enemy.behavior.name(),
                id,
                enemy.pos().x,
                enemy.pos().y
            );
            self.adversaries.push(enemy);
        }
    }

    /// Registry plus a member lookup over this world's entities
    pub fn split_members(&mut self) -> (&mut PhaseRegistry, WorldMembers<'_>) {
        (
            &mut self.registry,
            WorldMembers {
                bricks: &mut self.bricks,
                adversaries: &mut self.adversaries,
            },
        )
    }

    /// Subscribe to a group's transitions; called with `(new_phase, old_phase)`
    pub fn subscribe(&mut self, group: GroupId, callback: PhaseCallback) -> SubscriptionId {
        self.registry.subscribe(group, callback)
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        self.registry.unsubscribe(subscription)
    }

    pub fn brick(&self, id: EntityId) -> Option<&PhaseBrick> {
        self.bricks
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|i| &self.bricks[i])
    }

    pub fn adversary(&self, id: EntityId) -> Option<&Adversary> {
        self.adversaries
            .binary_search_by_key(&id, |a| a.id())
            .ok()
            .map(|i| &self.adversaries[i])
    }

    pub fn adversary_mut(&mut self, id: EntityId) -> Option<&mut Adversary> {
        self.adversaries
            .binary_search_by_key(&id, |a| a.id())
            .ok()
            .map(|i| &mut self.adversaries[i])
    }

    pub fn dash_charges(&self) -> u32 {
        self.charges.charges()
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Hand all pending events to the presentation layer
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// From here on the player can no longer be damaged
    pub fn complete_level(&mut self) {
        if !self.level_complete {
            self.level_complete = true;
            log::info!("level '{}' complete at {:.0}ms", self.level.name, self.time);
        }
    }

    /// Drop adversaries whose death sequence has finished
    pub fn remove_dead_adversaries(&mut self) {
        let registry = &mut self.registry;
        self.adversaries.retain(|enemy| {
            if enemy.lifecycle() != Lifecycle::Dead {
                return true;
            }
            if let Some(group) = enemy.core.group {
                registry.unregister_member(enemy.id(), group);
            }
            false
        });
    }

    /// Restart the level: groups back to their offsets, player at spawn,
    /// adversaries re-spawned, charges restored
    pub fn retry(&mut self) {
        for enemy in self.adversaries.drain(..) {
            if let Some(group) = enemy.core.group {
                self.registry.unregister_member(enemy.id(), group);
            }
        }

        let (registry, mut members) = self.split_members();
        let transitions = registry.reset_all(&mut members);
        self.events.extend(transitions.into_iter().map(GameEvent::from));
        self.physics.sync_bricks(&self.bricks);

        self.spawn_adversaries();
        self.player.respawn(self.level.player_spawn);
        self.charges = ChargeBank::new(self.level.dash_charges);
        self.time = 0.0;
        self.time_ticks = 0;
        self.level_complete = false;
        log::info!("level '{}' restarted", self.level.name);
    }

    pub fn player_pos(&self) -> Vec2 {
        self.player.pos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::Aabb;
    use crate::sim::brick::SolidKind;
    use crate::sim::level::{AdversaryKind, AdversarySpawn, BrickSpec, GroupSpec};
    use crate::sim::phase::GroupConfig;

    fn level() -> LevelData {
        LevelData {
            groups: vec![GroupSpec {
                id: 1,
                config: GroupConfig {
                    offset: 2000.0,
                    ..GroupConfig::default()
                },
            }],
            bricks: vec![
                BrickSpec {
                    rect: Aabb::from_corner(0.0, 0.0, 32.0, 32.0),
                    group: 1,
                    kind: SolidKind::Solid,
                    depth: 2,
                },
                BrickSpec {
                    rect: Aabb::from_corner(32.0, 0.0, 32.0, 32.0),
                    group: 9,
                    kind: SolidKind::Solid,
                    depth: 0,
                },
            ],
            adversaries: vec![AdversarySpawn {
                pos: Vec2::new(200.0, 100.0),
                size: Vec2::splat(24.0),
                health: 1,
                group: Some(1),
                kind: AdversaryKind::PhaseFlyer {
                    amplitude: Vec2::ZERO,
                    frequency_hz: 1.0,
                    wave_offset: 0.0,
                    open_phase: Phase::Solid,
                },
            }],
            ..LevelData::default()
        }
    }

    #[test]
    fn test_members_get_current_phase_at_construction() {
        let world = World::new(level(), Tuning::default(), 1);
        // Offset 2000 under 2000/2000 starts in GHOST
        let brick = world.brick(1).unwrap();
        assert!(!brick.collidable);
        assert_eq!(brick.depth, 2);
        let flyer = world.adversary(3).unwrap();
        assert!(!flyer.is_dangerous());
        // Unconfigured group 9 was created with the defaults
        assert_eq!(world.registry.current_phase(9), Some(Phase::Solid));
        assert!(world.brick(2).unwrap().collidable);
    }

    #[test]
    fn test_member_lookup_spans_bricks_and_adversaries() {
        let mut world = World::new(level(), Tuning::default(), 1);
        let (_, mut members) = world.split_members();
        assert!(members.member_mut(1).is_some());
        assert!(members.member_mut(3).is_some());
        assert!(members.member_mut(PLAYER_ID).is_none());
        assert!(members.member_mut(42).is_none());
    }

    #[test]
    fn test_dead_adversaries_leave_their_group() {
        let mut world = World::new(level(), Tuning::default(), 1);
        world.adversary_mut(3).unwrap().die();
        world.remove_dead_adversaries();
        assert_eq!(world.adversaries.len(), 1);

        let enemy = world.adversary_mut(3).unwrap();
        enemy.core.dying_elapsed = 10_000.0;
        let mut events = Vec::new();
        let mut rng = Pcg32::seed_from_u64(0);
        let physics = TileWorld::default();
        let mut ctx = crate::sim::adversary::AdversaryContext {
            player_pos: Vec2::ZERO,
            physics: &physics,
            rng: &mut rng,
            events: &mut events,
        };
        enemy.update(0.0, 16.0, &mut ctx);
        world.remove_dead_adversaries();
        assert!(world.adversaries.is_empty());
        assert!(!world.registry.group(1).unwrap().members().contains(&3));
    }

    #[test]
    fn test_drain_events_empties_queue() {
        let mut world = World::new(level(), Tuning::default(), 1);
        world.push_event(GameEvent::Landed);
        assert_eq!(world.drain_events(), vec![GameEvent::Landed]);
        assert!(world.events().is_empty());
    }
}
