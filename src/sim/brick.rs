//! Level geometry: static tiles, one-way platforms and phase bricks

use serde::{Deserialize, Serialize};

use super::body::Aabb;
use super::phase::{EntityId, GroupId, Phase, PhaseReactive};
use crate::consts::GHOST_ALPHA;

/// How a piece of geometry blocks bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolidKind {
    /// Blocks from every side
    #[default]
    Solid,
    /// Blocks only from above while falling or resting
    OneWay,
}

/// Geometry that never changes state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub rect: Aabb,
    pub kind: SolidKind,
}

/// A tile whose solidity follows a phase group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseBrick {
    pub id: EntityId,
    pub group: GroupId,
    pub rect: Aabb,
    pub kind: SolidKind,
    pub collidable: bool,
    pub visual_alpha: f32,
    /// Draw order hint, kept in both phases
    pub depth: i32,
}

impl PhaseBrick {
    pub fn new(id: EntityId, group: GroupId, rect: Aabb, kind: SolidKind) -> Self {
        Self {
            id,
            group,
            rect,
            kind,
            collidable: true,
            visual_alpha: 1.0,
            depth: 0,
        }
    }
}

impl PhaseReactive for PhaseBrick {
    fn set_phase_state(&mut self, phase: Phase) {
        match phase {
            Phase::Solid => {
                self.collidable = true;
                self.visual_alpha = 1.0;
            }
            Phase::Ghost => {
                self.collidable = false;
                self.visual_alpha = GHOST_ALPHA;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ghost_brick_is_not_collidable() {
        let mut brick = PhaseBrick::new(
            1,
            1,
            Aabb::from_corner(0.0, 0.0, 32.0, 32.0),
            SolidKind::Solid,
        );
        brick.set_phase_state(Phase::Ghost);
        assert!(!brick.collidable);
        assert!(brick.visual_alpha < 1.0);

        brick.set_phase_state(Phase::Solid);
        assert!(brick.collidable);
        assert_eq!(brick.visual_alpha, 1.0);
    }
}
