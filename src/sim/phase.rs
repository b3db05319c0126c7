//! Phase groups and the registry that drives them
//!
//! Each group is an independent cycle: `solid_duration` of SOLID followed by
//! `ghost_duration` of GHOST. Every tick the registry advances all clocks,
//! and on each boundary crossing it pushes the new phase to the group's
//! members and then notifies the group's subscribers, in registration order.
//!
//! The registry is an owned value (one per level/session). Members are held
//! by id; the owner of the entities supplies them through [`PhaseMembers`]
//! whenever state has to be pushed.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::clock::CycleClock;
use crate::consts::{DEFAULT_GHOST_MS, DEFAULT_SOLID_MS};

pub type GroupId = u32;
pub type EntityId = u32;

/// The two mutually exclusive states of a phase group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Solid,
    Ghost,
}

impl Phase {
    pub fn opposite(self) -> Self {
        match self {
            Phase::Solid => Phase::Ghost,
            Phase::Ghost => Phase::Solid,
        }
    }

    pub fn is_solid(self) -> bool {
        self == Phase::Solid
    }
}

/// Anything whose collidability or activity follows a phase group
pub trait PhaseReactive {
    fn set_phase_state(&mut self, phase: Phase);
}

/// Resolves member ids to live entities during a broadcast
pub trait PhaseMembers {
    fn member_mut(&mut self, id: EntityId) -> Option<&mut dyn PhaseReactive>;
}

/// Member lookup for registries without members (tests, subscriber-only use)
pub struct NoMembers;

impl PhaseMembers for NoMembers {
    fn member_mut(&mut self, _id: EntityId) -> Option<&mut dyn PhaseReactive> {
        None
    }
}

/// Group timing configuration, as supplied by level data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    pub solid_duration: f32,
    pub ghost_duration: f32,
    pub offset: f32,
    pub start_phase: Phase,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            solid_duration: DEFAULT_SOLID_MS,
            ghost_duration: DEFAULT_GHOST_MS,
            offset: 0.0,
            start_phase: Phase::Solid,
        }
    }
}

/// A phase boundary crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub group: GroupId,
    pub new_phase: Phase,
    pub old_phase: Phase,
}

/// Subscriber callback, invoked with `(new_phase, old_phase)`
pub type PhaseCallback = Box<dyn FnMut(Phase, Phase)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u32);

/// One independently configured cyclic group
pub struct PhaseGroup {
    id: GroupId,
    config: GroupConfig,
    clock: CycleClock,
    current_phase: Phase,
    subscribers: Vec<(SubscriptionId, PhaseCallback)>,
    members: Vec<EntityId>,
}

impl fmt::Debug for PhaseGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseGroup")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("current_phase", &self.current_phase)
            .field("subscribers", &self.subscribers.len())
            .field("members", &self.members)
            .finish()
    }
}

impl PhaseGroup {
    fn new(id: GroupId, config: GroupConfig) -> Self {
        let period = config.solid_duration + config.ghost_duration;
        debug_assert!(
            config.solid_duration >= 0.0 && config.ghost_duration >= 0.0 && period > 0.0,
            "group {id}: invalid durations {config:?}"
        );
        let mut group = Self {
            id,
            config,
            clock: CycleClock::new(period),
            current_phase: Phase::Solid,
            subscribers: Vec::new(),
            members: Vec::new(),
        };
        group.restart();
        group
    }

    /// Put the clock back at its configured starting point
    fn restart(&mut self) {
        self.clock.set_elapsed(self.start_elapsed());
        self.current_phase = self.phase_at(self.clock.elapsed());
    }

    /// Clock value at creation: start of the chosen phase, pre-advanced by offset
    fn start_elapsed(&self) -> f32 {
        let base = match self.config.start_phase {
            Phase::Solid => 0.0,
            Phase::Ghost => self.config.solid_duration,
        };
        base + self.config.offset
    }

    #[inline]
    fn phase_at(&self, elapsed: f32) -> Phase {
        if elapsed < self.config.solid_duration {
            Phase::Solid
        } else {
            Phase::Ghost
        }
    }

    /// Advance the clock, returning every crossing as `(new, old)` in order
    fn step(&mut self, dt: f32) -> Vec<(Phase, Phase)> {
        let mut crossings = Vec::new();
        let mut remaining = dt.max(0.0);

        loop {
            let boundary = match self.current_phase {
                Phase::Solid => self.config.solid_duration,
                Phase::Ghost => self.clock.period(),
            };
            let to_boundary = boundary - self.clock.elapsed();
            // The sum can round onto the boundary even when `remaining` is short of it
            if remaining < to_boundary && self.clock.elapsed() + remaining < boundary {
                self.clock.advance(remaining);
                break;
            }

            remaining = (remaining - to_boundary).max(0.0);
            // Land exactly on the boundary to keep float drift out of the cycle
            self.clock.set_elapsed(boundary);

            let old = self.current_phase;
            let new = self.phase_at(self.clock.elapsed());
            if new != old {
                self.current_phase = new;
                crossings.push((new, old));
            } else if to_boundary <= 0.0 && remaining <= 0.0 {
                break;
            }
        }

        crossings
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn config(&self) -> &GroupConfig {
        &self.config
    }

    pub fn clock(&self) -> &CycleClock {
        &self.clock
    }

    pub fn current_phase(&self) -> Phase {
        self.current_phase
    }

    pub fn members(&self) -> &[EntityId] {
        &self.members
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Progress through the whole cycle in `[0, 1)`
    pub fn cycle_progress(&self) -> f32 {
        self.clock.progress()
    }

    /// Progress through the current phase in `[0, 1)`
    pub fn phase_progress(&self) -> f32 {
        let elapsed = self.clock.elapsed();
        match self.current_phase {
            Phase::Solid => elapsed / self.config.solid_duration,
            Phase::Ghost => {
                (elapsed - self.config.solid_duration) / self.config.ghost_duration
            }
        }
    }

    fn push_to_members(&self, members: &mut dyn PhaseMembers) {
        for &id in &self.members {
            if let Some(member) = members.member_mut(id) {
                member.set_phase_state(self.current_phase);
            }
        }
    }

    fn notify(&mut self, new: Phase, old: Phase) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback(new, old);
        }
    }
}

/// Owns every phase group of a level
pub struct PhaseRegistry {
    groups: BTreeMap<GroupId, PhaseGroup>,
    defaults: GroupConfig,
    next_subscription: u32,
}

impl Default for PhaseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PhaseRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseRegistry")
            .field("groups", &self.groups)
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl PhaseRegistry {
    pub fn new() -> Self {
        Self::with_defaults(GroupConfig::default())
    }

    /// Registry whose lazily created groups use `defaults`
    pub fn with_defaults(defaults: GroupConfig) -> Self {
        Self {
            groups: BTreeMap::new(),
            defaults,
            next_subscription: 1,
        }
    }

    /// Create or replace a group
    ///
    /// Replacing keeps the group's members and subscribers; call
    /// [`PhaseRegistry::push_state`] afterwards to bring members in line.
    pub fn create_group(
        &mut self,
        id: GroupId,
        solid_duration: f32,
        ghost_duration: f32,
        offset: f32,
        start_phase: Phase,
    ) -> &PhaseGroup {
        self.create_group_from(
            id,
            GroupConfig {
                solid_duration,
                ghost_duration,
                offset,
                start_phase,
            },
        )
    }

    pub fn create_group_from(&mut self, id: GroupId, config: GroupConfig) -> &PhaseGroup {
        let mut group = PhaseGroup::new(id, config);
        if let Some(previous) = self.groups.remove(&id) {
            group.members = previous.members;
            group.subscribers = previous.subscribers;
        }
        log::debug!(
            "phase group {id}: solid={} ghost={} offset={} -> {:?}",
            config.solid_duration,
            config.ghost_duration,
            config.offset,
            group.current_phase
        );
        self.groups.entry(id).or_insert(group)
    }

    /// Group by id, created with the registry defaults if absent
    fn ensure_group(&mut self, id: GroupId) -> &mut PhaseGroup {
        let defaults = self.defaults;
        self.groups.entry(id).or_insert_with(|| {
            log::warn!("phase group {id} referenced before configuration; using defaults");
            PhaseGroup::new(id, defaults)
        })
    }

    /// Advance every group by `dt`
    ///
    /// For each crossing the group's members are updated first, then its
    /// subscribers are called. Returns all crossings in group-id order.
    pub fn advance(&mut self, dt: f32, members: &mut dyn PhaseMembers) -> Vec<PhaseTransition> {
        let mut transitions = Vec::new();
        for (&id, group) in self.groups.iter_mut() {
            for (new_phase, old_phase) in group.step(dt) {
                for &member_id in &group.members {
                    if let Some(member) = members.member_mut(member_id) {
                        member.set_phase_state(new_phase);
                    }
                }
                group.notify(new_phase, old_phase);
                transitions.push(PhaseTransition {
                    group: id,
                    new_phase,
                    old_phase,
                });
            }
        }
        transitions
    }

    /// Add `id` to a group and push the group's current phase to `entity` now
    pub fn register_member(
        &mut self,
        id: EntityId,
        entity: &mut dyn PhaseReactive,
        group_id: GroupId,
    ) -> Phase {
        let group = self.ensure_group(group_id);
        if !group.members.contains(&id) {
            group.members.push(id);
        }
        entity.set_phase_state(group.current_phase);
        group.current_phase
    }

    pub fn unregister_member(&mut self, id: EntityId, group_id: GroupId) -> bool {
        match self.groups.get_mut(&group_id) {
            Some(group) => {
                let before = group.members.len();
                group.members.retain(|&m| m != id);
                group.members.len() != before
            }
            None => false,
        }
    }

    pub fn subscribe(&mut self, group_id: GroupId, callback: PhaseCallback) -> SubscriptionId {
        let subscription = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.ensure_group(group_id)
            .subscribers
            .push((subscription, callback));
        subscription
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        for group in self.groups.values_mut() {
            if let Some(index) = group.subscribers.iter().position(|(s, _)| *s == subscription) {
                group.subscribers.remove(index);
                return true;
            }
        }
        false
    }

    /// Re-push a group's current phase to all of its members
    pub fn push_state(&self, group_id: GroupId, members: &mut dyn PhaseMembers) {
        if let Some(group) = self.groups.get(&group_id) {
            group.push_to_members(members);
        }
    }

    /// Restore a group's clock to its original offset and re-push state
    ///
    /// Subscribers hear about it only if the phase actually changed.
    pub fn reset(
        &mut self,
        group_id: GroupId,
        members: &mut dyn PhaseMembers,
    ) -> Option<PhaseTransition> {
        let group = self.groups.get_mut(&group_id)?;
        let old_phase = group.current_phase;
        group.restart();
        group.push_to_members(members);

        let new_phase = group.current_phase;
        if new_phase != old_phase {
            group.notify(new_phase, old_phase);
            Some(PhaseTransition {
                group: group_id,
                new_phase,
                old_phase,
            })
        } else {
            None
        }
    }

    pub fn reset_all(&mut self, members: &mut dyn PhaseMembers) -> Vec<PhaseTransition> {
        let ids: Vec<GroupId> = self.groups.keys().copied().collect();
        ids.into_iter()
            .filter_map(|id| self.reset(id, members))
            .collect()
    }

    pub fn group(&self, id: GroupId) -> Option<&PhaseGroup> {
        self.groups.get(&id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &PhaseGroup> {
        self.groups.values()
    }

    pub fn current_phase(&self, id: GroupId) -> Option<Phase> {
        self.groups.get(&id).map(|g| g.current_phase)
    }

    pub fn cycle_progress(&self, id: GroupId) -> Option<f32> {
        self.groups.get(&id).map(|g| g.cycle_progress())
    }

    pub fn phase_progress(&self, id: GroupId) -> Option<f32> {
        self.groups.get(&id).map(|g| g.phase_progress())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Tile {
        phase: Option<Phase>,
        pushes: u32,
    }

    impl PhaseReactive for Tile {
        fn set_phase_state(&mut self, phase: Phase) {
            self.phase = Some(phase);
            self.pushes += 1;
        }
    }

    struct Tiles(BTreeMap<EntityId, Tile>);

    impl PhaseMembers for Tiles {
        fn member_mut(&mut self, id: EntityId) -> Option<&mut dyn PhaseReactive> {
            self.0.get_mut(&id).map(|t| t as &mut dyn PhaseReactive)
        }
    }

    #[test]
    fn test_boundary_at_solid_duration() {
        let mut registry = PhaseRegistry::new();
        registry.create_group(1, 2000.0, 2000.0, 0.0, Phase::Solid);

        registry.advance(1999.0, &mut NoMembers);
        assert_eq!(registry.current_phase(1), Some(Phase::Solid));

        let transitions = registry.advance(2.0, &mut NoMembers);
        assert_eq!(registry.current_phase(1), Some(Phase::Ghost));
        assert_eq!(
            transitions,
            vec![PhaseTransition {
                group: 1,
                new_phase: Phase::Ghost,
                old_phase: Phase::Solid,
            }]
        );
    }

    #[test]
    fn test_step_rounding_onto_period_wraps_to_solid() {
        let mut registry = PhaseRegistry::new();
        registry.create_group(1, 2000.0, 2000.0, 0.0, Phase::Solid);
        registry.advance(3999.9998, &mut NoMembers);
        assert_eq!(registry.current_phase(1), Some(Phase::Ghost));

        // Short of the boundary in exact arithmetic, but the f32 sum lands on 4000
        let transitions = registry.advance(0.00015, &mut NoMembers);
        let group = registry.group(1).unwrap();
        assert_eq!(group.clock().elapsed(), 0.0);
        assert_eq!(group.current_phase(), Phase::Solid);
        assert_eq!(
            transitions,
            vec![PhaseTransition {
                group: 1,
                new_phase: Phase::Solid,
                old_phase: Phase::Ghost,
            }]
        );
    }

    #[test]
    fn test_offset_starts_in_ghost() {
        let mut registry = PhaseRegistry::new();
        let group = registry.create_group(7, 2000.0, 2000.0, 2000.0, Phase::Solid);
        assert_eq!(group.current_phase(), Phase::Ghost);
    }

    #[test]
    fn test_start_phase_ghost_begins_at_ghost() {
        let mut registry = PhaseRegistry::new();
        let group = registry.create_group(2, 1000.0, 500.0, 0.0, Phase::Ghost);
        assert_eq!(group.current_phase(), Phase::Ghost);
        assert!((group.clock().elapsed() - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn test_register_member_pushes_current_phase_immediately() {
        let mut registry = PhaseRegistry::new();
        registry.create_group(3, 1000.0, 1000.0, 1500.0, Phase::Solid);

        let mut tile = Tile::default();
        let phase = registry.register_member(10, &mut tile, 3);
        assert_eq!(phase, Phase::Ghost);
        assert_eq!(tile.phase, Some(Phase::Ghost));
    }

    #[test]
    fn test_unknown_group_is_created_with_defaults() {
        let mut registry = PhaseRegistry::new();
        let mut tile = Tile::default();
        registry.register_member(1, &mut tile, 99);

        let group = registry.group(99).expect("group auto-created");
        assert_eq!(*group.config(), GroupConfig::default());
        assert_eq!(tile.phase, Some(Phase::Solid));
    }

    #[test]
    fn test_members_update_before_subscribers() {
        let mut registry = PhaseRegistry::new();
        registry.create_group(1, 100.0, 100.0, 0.0, Phase::Solid);

        let mut tiles = Tiles(BTreeMap::new());
        let mut tile = Tile::default();
        registry.register_member(5, &mut tile, 1);
        tiles.0.insert(5, tile);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        registry.subscribe(1, Box::new(move |new, old| sink.borrow_mut().push((new, old))));

        registry.advance(100.0, &mut tiles);
        assert_eq!(tiles.0[&5].phase, Some(Phase::Ghost));
        assert_eq!(*seen.borrow(), vec![(Phase::Ghost, Phase::Solid)]);
    }

    #[test]
    fn test_subscribers_called_in_registration_order() {
        let mut registry = PhaseRegistry::new();
        registry.create_group(1, 50.0, 50.0, 0.0, Phase::Solid);

        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = order.clone();
            registry.subscribe(1, Box::new(move |_, _| order.borrow_mut().push(tag)));
        }

        registry.advance(60.0, &mut NoMembers);
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut registry = PhaseRegistry::new();
        registry.create_group(1, 50.0, 50.0, 0.0, Phase::Solid);

        let count = Rc::new(RefCell::new(0));
        let counter = count.clone();
        let sub = registry.subscribe(1, Box::new(move |_, _| *counter.borrow_mut() += 1));

        registry.advance(50.0, &mut NoMembers);
        assert!(registry.unsubscribe(sub));
        registry.advance(50.0, &mut NoMembers);
        assert_eq!(*count.borrow(), 1);
        assert!(!registry.unsubscribe(sub));
    }

    #[test]
    fn test_large_step_broadcasts_every_crossing() {
        let mut registry = PhaseRegistry::new();
        registry.create_group(1, 100.0, 100.0, 0.0, Phase::Solid);

        // Solid -> Ghost -> Solid -> Ghost
        let transitions = registry.advance(350.0, &mut NoMembers);
        let phases: Vec<Phase> = transitions.iter().map(|t| t.new_phase).collect();
        assert_eq!(phases, vec![Phase::Ghost, Phase::Solid, Phase::Ghost]);
        assert_eq!(registry.current_phase(1), Some(Phase::Ghost));
    }

    #[test]
    fn test_groups_are_independent() {
        let mut registry = PhaseRegistry::new();
        registry.create_group(1, 100.0, 100.0, 0.0, Phase::Solid);
        registry.create_group(2, 100.0, 100.0, 50.0, Phase::Solid);

        let transitions = registry.advance(60.0, &mut NoMembers);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].group, 2);
        assert_eq!(registry.current_phase(1), Some(Phase::Solid));
        assert_eq!(registry.current_phase(2), Some(Phase::Ghost));
    }

    #[test]
    fn test_progress_accessors() {
        let mut registry = PhaseRegistry::new();
        registry.create_group(1, 300.0, 100.0, 0.0, Phase::Solid);
        registry.advance(150.0, &mut NoMembers);
        assert!((registry.cycle_progress(1).unwrap() - 0.375).abs() < 1e-5);
        assert!((registry.phase_progress(1).unwrap() - 0.5).abs() < 1e-5);

        registry.advance(200.0, &mut NoMembers);
        assert!((registry.phase_progress(1).unwrap() - 0.5).abs() < 1e-5);
        assert_eq!(registry.cycle_progress(42), None);
    }

    #[test]
    fn test_reset_restores_offset_and_repushes() {
        let mut registry = PhaseRegistry::new();
        registry.create_group(1, 100.0, 100.0, 0.0, Phase::Solid);

        let mut tiles = Tiles(BTreeMap::new());
        let mut tile = Tile::default();
        registry.register_member(1, &mut tile, 1);
        tiles.0.insert(1, tile);

        registry.advance(120.0, &mut tiles);
        assert_eq!(tiles.0[&1].phase, Some(Phase::Ghost));

        let transition = registry.reset(1, &mut tiles);
        assert_eq!(transition.map(|t| t.new_phase), Some(Phase::Solid));
        assert_eq!(tiles.0[&1].phase, Some(Phase::Solid));
        assert_eq!(registry.group(1).unwrap().clock().elapsed(), 0.0);
    }

    #[test]
    fn test_replacing_group_keeps_members() {
        let mut registry = PhaseRegistry::new();
        let mut tiles = Tiles(BTreeMap::new());
        let mut tile = Tile::default();
        registry.register_member(4, &mut tile, 9);
        tiles.0.insert(4, tile);

        registry.create_group(9, 500.0, 500.0, 600.0, Phase::Solid);
        registry.push_state(9, &mut tiles);
        assert_eq!(registry.group(9).unwrap().members(), &[4]);
        assert_eq!(tiles.0[&4].phase, Some(Phase::Ghost));
    }

    proptest! {
        #[test]
        fn prop_phase_matches_clock(
            solid in 1u32..5000,
            ghost in 1u32..5000,
            offset in 0u32..10000,
            steps in proptest::collection::vec(0u32..3000, 1..40),
        ) {
            let mut registry = PhaseRegistry::new();
            registry.create_group(1, solid as f32, ghost as f32, offset as f32, Phase::Solid);
            for dt in steps {
                registry.advance(dt as f32, &mut NoMembers);
                let group = registry.group(1).unwrap();
                let elapsed = group.clock().elapsed();
                prop_assert!(elapsed >= 0.0 && elapsed < group.clock().period());
                let expect_solid = elapsed < solid as f32;
                prop_assert_eq!(group.current_phase() == Phase::Solid, expect_solid);
            }
        }

        #[test]
        fn prop_transitions_alternate(
            solid in 1u32..500,
            ghost in 1u32..500,
            steps in proptest::collection::vec(0u32..2000, 1..20),
        ) {
            let mut registry = PhaseRegistry::new();
            registry.create_group(1, solid as f32, ghost as f32, 0.0, Phase::Solid);
            let mut last = Phase::Solid;
            for dt in steps {
                for t in registry.advance(dt as f32, &mut NoMembers) {
                    prop_assert_eq!(t.old_phase, last);
                    prop_assert_eq!(t.new_phase, last.opposite());
                    last = t.new_phase;
                }
            }
        }
    }
}
