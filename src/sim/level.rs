//! Level data consumed once when a [`World`](super::state::World) is built
//!
//! Groups, tiles, bricks and adversary spawns. Everything is serde so a level
//! can be written as JSON; omitted fields take their defaults.

use std::path::Path;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::adversary::{
    Adversary, AdversaryCore, Ambusher, Behavior, OrbitPattern, Orbiter, Patrol, PhaseFlyer,
    PursuitJumper,
};
use super::body::{Aabb, Body};
use super::brick::{SolidKind, Tile};
use super::phase::{EntityId, GroupConfig, GroupId, Phase};
use crate::consts::TILE_SIZE;
use crate::tuning::{CombatTuning, LoadError};

/// A configured phase group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    pub id: GroupId,
    #[serde(flatten)]
    pub config: GroupConfig,
}

/// A phase brick placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrickSpec {
    pub rect: Aabb,
    pub group: GroupId,
    #[serde(default)]
    pub kind: SolidKind,
    #[serde(default)]
    pub depth: i32,
}

/// Per-variant spawn parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdversaryKind {
    Patroller {
        speed: f32,
        #[serde(default)]
        turn_pause_ms: f32,
    },
    PursuitJumper {
        speed: f32,
        #[serde(default = "default_jump_range")]
        range_x: f32,
        #[serde(default = "default_jump_band")]
        band_y: f32,
    },
    PhaseFlyer {
        amplitude: Vec2,
        frequency_hz: f32,
        #[serde(default)]
        wave_offset: f32,
        #[serde(default)]
        open_phase: Phase,
    },
    Orbiter {
        radii: Vec2,
        angular_speed: f32,
        #[serde(default)]
        pattern: OrbitPattern,
        /// Random when omitted
        #[serde(default)]
        start_angle: Option<f32>,
    },
    Ambusher {
        reveal_radius: f32,
        #[serde(default = "default_chase_speed")]
        chase_speed: f32,
    },
}

fn default_jump_range() -> f32 {
    160.0
}

fn default_jump_band() -> f32 {
    140.0
}

fn default_chase_speed() -> f32 {
    150.0
}

fn default_size() -> Vec2 {
    Vec2::splat(24.0)
}

fn default_health() -> u32 {
    1
}

/// An adversary placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdversarySpawn {
    /// Center position; the anchor or orbit center for airborne variants
    pub pos: Vec2,
    #[serde(default = "default_size")]
    pub size: Vec2,
    #[serde(default = "default_health")]
    pub health: u32,
    /// Phase group the adversary follows (flyers)
    #[serde(default)]
    pub group: Option<GroupId>,
    #[serde(flatten)]
    pub kind: AdversaryKind,
}

impl AdversarySpawn {
    /// Build the live adversary
    ///
    /// `rng` fills in the values the level leaves open: the jumper's first
    /// proximity check and the orbiter's start angle.
    pub fn spawn(&self, id: EntityId, combat: &CombatTuning, rng: &mut Pcg32) -> Adversary {
        let rect = Body::rect(self.pos, self.size);
        let (body, behavior) = match &self.kind {
            AdversaryKind::Patroller {
                speed,
                turn_pause_ms,
            } => (
                rect,
                Behavior::Patrol(Patrol::new(*speed).with_turn_pause(*turn_pause_ms)),
            ),
            AdversaryKind::PursuitJumper {
                speed,
                range_x,
                band_y,
            } => {
                let mut jumper = PursuitJumper::new(Patrol::new(*speed));
                jumper.range_x = *range_x;
                jumper.band_y = *band_y;
                let phase = rng.random_range(0.0..jumper.check_interval_ms);
                (rect, Behavior::PursuitJumper(jumper.with_check_phase(phase)))
            }
            AdversaryKind::PhaseFlyer {
                amplitude,
                frequency_hz,
                wave_offset,
                open_phase,
            } => {
                let mut flyer = PhaseFlyer::new(self.pos, *amplitude, *frequency_hz);
                flyer.wave_offset = *wave_offset;
                flyer.open_phase = *open_phase;
                flyer.fade_ms = combat.flyer_fade_ms;
                let mut body = rect;
                body.gravity_scale = 0.0;
                body.collides = false;
                (body, Behavior::PhaseFlyer(flyer))
            }
            AdversaryKind::Orbiter {
                radii,
                angular_speed,
                pattern,
                start_angle,
            } => {
                let angle =
                    start_angle.unwrap_or_else(|| rng.random_range(0.0..std::f32::consts::TAU));
                let orbiter =
                    Orbiter::new(self.pos, *radii, *angular_speed, *pattern).with_angle(angle);
                let mut body = Body::circle(orbiter.position(), self.size.x * 0.5);
                body.gravity_scale = 0.0;
                body.collides = false;
                (body, Behavior::Orbiter(orbiter))
            }
            AdversaryKind::Ambusher {
                reveal_radius,
                chase_speed,
            } => {
                let mut ambusher = Ambusher::new(*reveal_radius);
                ambusher.chase_speed = *chase_speed;
                (rect, Behavior::Ambusher(ambusher))
            }
        };

        let mut core = AdversaryCore::new(id, body, self.health);
        core.group = self.group;
        Adversary::new(core, behavior)
    }
}

fn default_dash_charges() -> u32 {
    1
}

/// Everything a level supplies to the simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelData {
    pub name: String,
    pub player_spawn: Vec2,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
    #[serde(default)]
    pub tiles: Vec<Tile>,
    #[serde(default)]
    pub bricks: Vec<BrickSpec>,
    #[serde(default)]
    pub adversaries: Vec<AdversarySpawn>,
    /// Starting dash-charge balance
    #[serde(default = "default_dash_charges")]
    pub dash_charges: u32,
}

impl Default for LevelData {
    fn default() -> Self {
        Self {
            name: String::from("untitled"),
            player_spawn: Vec2::ZERO,
            groups: Vec::new(),
            tiles: Vec::new(),
            bricks: Vec::new(),
            adversaries: Vec::new(),
            dash_charges: default_dash_charges(),
        }
    }
}

impl LevelData {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }

    /// Small built-in level: a floor, a phasing bridge, a one-way ledge and
    /// one of each adversary
    pub fn sample() -> Self {
        let floor = |x: f32, w: f32| Tile {
            rect: Aabb::from_corner(x, 400.0, w, TILE_SIZE),
            kind: SolidKind::Solid,
        };
        Self {
            name: String::from("sample"),
            player_spawn: Vec2::new(64.0, 386.0),
            groups: vec![
                GroupSpec {
                    id: 1,
                    config: GroupConfig::default(),
                },
                GroupSpec {
                    id: 2,
                    config: GroupConfig {
                        offset: 1000.0,
                        ..GroupConfig::default()
                    },
                },
            ],
            tiles: vec![
                floor(0.0, 480.0),
                floor(672.0, 480.0),
                Tile {
                    rect: Aabb::from_corner(160.0, 320.0, 96.0, 8.0),
                    kind: SolidKind::OneWay,
                },
            ],
            bricks: (0..6)
                .map(|i| BrickSpec {
                    rect: Aabb::from_corner(
                        480.0 + i as f32 * TILE_SIZE,
                        400.0,
                        TILE_SIZE,
                        TILE_SIZE,
                    ),
                    group: if i < 3 { 1 } else { 2 },
                    kind: SolidKind::Solid,
                    depth: 0,
                })
                .collect(),
            adversaries: vec![
                AdversarySpawn {
                    pos: Vec2::new(360.0, 388.0),
                    size: default_size(),
                    health: 2,
                    group: None,
                    kind: AdversaryKind::Patroller {
                        speed: 60.0,
                        turn_pause_ms: 250.0,
                    },
                },
                AdversarySpawn {
                    pos: Vec2::new(800.0, 388.0),
                    size: default_size(),
                    health: 1,
                    group: None,
                    kind: AdversaryKind::PursuitJumper {
                        speed: 40.0,
                        range_x: default_jump_range(),
                        band_y: default_jump_band(),
                    },
                },
                AdversarySpawn {
                    pos: Vec2::new(576.0, 300.0),
                    size: default_size(),
                    health: 1,
                    group: Some(1),
                    kind: AdversaryKind::PhaseFlyer {
                        amplitude: Vec2::new(0.0, 40.0),
                        frequency_hz: 0.5,
                        wave_offset: 0.0,
                        open_phase: Phase::Ghost,
                    },
                },
                AdversarySpawn {
                    pos: Vec2::new(960.0, 300.0),
                    size: default_size(),
                    health: 1,
                    group: None,
                    kind: AdversaryKind::Orbiter {
                        radii: Vec2::new(64.0, 32.0),
                        angular_speed: 2.0,
                        pattern: OrbitPattern::FigureEight,
                        start_angle: None,
                    },
                },
                AdversarySpawn {
                    pos: Vec2::new(1080.0, 388.0),
                    size: default_size(),
                    health: 2,
                    group: None,
                    kind: AdversaryKind::Ambusher {
                        reveal_radius: 96.0,
                        chase_speed: default_chase_speed(),
                    },
                },
            ],
            dash_charges: 3,
        }
    }
}
