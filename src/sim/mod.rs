//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod adversary;
pub mod body;
pub mod brick;
pub mod clock;
pub mod collision;
pub mod contact;
pub mod level;
pub mod phase;
pub mod player;
pub mod state;
pub mod tick;

pub use adversary::{Adversary, AdversaryCore, Behavior, HitResult, Lifecycle};
pub use body::{Aabb, Body, Contacts, Shape};
pub use brick::{PhaseBrick, SolidKind, Tile};
pub use clock::CycleClock;
pub use collision::{PhysicsSubstrate, TileWorld, one_way_blocks};
pub use contact::{ContactKind, ContactOutcome, ContactResolver};
pub use level::{AdversaryKind, AdversarySpawn, LevelData};
pub use phase::{
    EntityId, GroupConfig, GroupId, Phase, PhaseMembers, PhaseReactive, PhaseRegistry,
    PhaseTransition,
};
pub use player::{ChargeBank, DashCharges, Player, PlayerInput};
pub use state::{GameEvent, World};
pub use tick::{TickInput, tick};
