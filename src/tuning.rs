//! Data-driven feel and combat tuning
//!
//! Every field has a default, so a tuning file only needs the values it
//! overrides. Durations are milliseconds, speeds pixels/second.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::phase::GroupConfig;

/// Timing-window presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FeelPreset {
    #[default]
    Standard,
    /// Wider grace windows
    Assisted,
    /// Tighter grace windows
    Precise,
}

impl FeelPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeelPreset::Standard => "Standard",
            FeelPreset::Assisted => "Assisted",
            FeelPreset::Precise => "Precise",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" | "std" => Some(FeelPreset::Standard),
            "assisted" | "assist" => Some(FeelPreset::Assisted),
            "precise" => Some(FeelPreset::Precise),
            _ => None,
        }
    }

    /// Multiplier on coyote, jump-buffer and invincibility windows
    pub fn window_scale(&self) -> f32 {
        match self {
            FeelPreset::Standard => 1.0,
            FeelPreset::Assisted => 1.5,
            FeelPreset::Precise => 0.6,
        }
    }
}

/// Player movement tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    // === Horizontal ===
    pub max_run_speed: f32,
    pub ground_acceleration: f32,
    pub air_acceleration: f32,
    /// Deceleration when no direction is held (pixels/s²)
    pub ground_friction: f32,
    pub air_friction: f32,

    // === Jump ===
    pub jump_velocity: f32,
    /// Upward speed added each tick while jump is held
    pub jump_hold_boost: f32,
    pub max_jump_hold_ms: f32,
    /// Upward speed cap applied when jump is released early
    pub jump_release_velocity: f32,
    pub coyote_ms: f32,
    pub jump_buffer_ms: f32,

    // === Dash ===
    pub dash_speed: f32,
    pub dash_duration_ms: f32,
    pub dash_cooldown_ms: f32,

    // === Damage ===
    pub invincibility_ms: f32,
    pub knockback_x: f32,
    pub knockback_y: f32,

    // === Platforms ===
    pub drop_through_ms: f32,
    pub stomp_bounce: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            max_run_speed: 220.0,
            ground_acceleration: 1800.0,
            air_acceleration: 1100.0,
            ground_friction: 1600.0,
            air_friction: 400.0,

            jump_velocity: 460.0,
            jump_hold_boost: 14.0,
            max_jump_hold_ms: 180.0,
            jump_release_velocity: 160.0,
            coyote_ms: 100.0,
            jump_buffer_ms: 120.0,

            dash_speed: 600.0,
            dash_duration_ms: 200.0,
            dash_cooldown_ms: 300.0,

            invincibility_ms: 1500.0,
            knockback_x: 160.0,
            knockback_y: 220.0,

            drop_through_ms: 200.0,
            stomp_bounce: 380.0,
        }
    }
}

/// Adversary interaction tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Slack when comparing the player's bottom to an adversary's top
    pub stomp_tolerance: f32,
    /// Non-lethal hit flash
    pub hit_flash_ms: f32,
    /// Stomp bounce multiplier for orbiters
    pub orbiter_bounce_multiplier: f32,
    /// Alpha tween length for phase-gated flyers
    pub flyer_fade_ms: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            stomp_tolerance: 10.0,
            hit_flash_ms: 120.0,
            orbiter_bounce_multiplier: 1.5,
            flyer_fade_ms: 250.0,
        }
    }
}

/// Errors from loading a tuning or level file
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Complete tuning set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Tuning {
    pub preset: FeelPreset,
    pub movement: MovementTuning,
    pub combat: CombatTuning,
    /// Timing for phase groups the level references but never configures
    pub phase_defaults: GroupConfig,
}

impl Tuning {
    /// Tuning with a preset's windows applied
    pub fn from_preset(preset: FeelPreset) -> Self {
        let mut tuning = Self::default();
        tuning.apply_preset(preset);
        tuning
    }

    /// Scale grace windows from the standard values
    pub fn apply_preset(&mut self, preset: FeelPreset) {
        let base = MovementTuning::default();
        let scale = preset.window_scale();
        self.preset = preset;
        self.movement.coyote_ms = base.coyote_ms * scale;
        self.movement.jump_buffer_ms = base.jump_buffer_ms * scale;
        self.movement.invincibility_ms = base.invincibility_ms * scale;
    }

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

    /// Load from a file, falling back to defaults on any error
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::read(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Using default tuning ({}: {e})", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "movement": { "dash_speed": 750.0 } }"#).unwrap();
        assert_eq!(tuning.movement.dash_speed, 750.0);
        assert_eq!(tuning.movement.coyote_ms, MovementTuning::default().coyote_ms);
        assert_eq!(tuning.combat, CombatTuning::default());
    }

    #[test]
    fn test_preset_scales_windows() {
        let assisted = Tuning::from_preset(FeelPreset::Assisted);
        let standard = Tuning::default();
        assert!(assisted.movement.coyote_ms > standard.movement.coyote_ms);
        assert!(assisted.movement.jump_buffer_ms > standard.movement.jump_buffer_ms);

        let precise = Tuning::from_preset(FeelPreset::Precise);
        assert!(precise.movement.coyote_ms < standard.movement.coyote_ms);
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!(FeelPreset::parse("ASSIST"), Some(FeelPreset::Assisted));
        assert_eq!(FeelPreset::parse("nope"), None);
        assert_eq!(FeelPreset::Precise.as_str(), "Precise");
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let tuning = Tuning::load("/definitely/not/here.json");
        assert_eq!(tuning, Tuning::default());
    }

    #[test]
    fn test_read_reports_io_and_parse_errors() {
        let missing = Tuning::read("/definitely/not/here.json").unwrap_err();
        assert!(matches!(missing, LoadError::Io(_)));
        assert!(missing.to_string().starts_with("read failed"));
        assert!(std::error::Error::source(&missing).is_some());

        let bad = Tuning::from_json("{ not json").unwrap_err();
        let err = LoadError::from(bad);
        assert!(matches!(err, LoadError::Parse(_)));
        assert!(err.to_string().starts_with("parse failed"));
    }

    #[test]
    fn test_json_roundtrip_preserves_phase_defaults() {
        let mut tuning = Tuning::default();
        tuning.phase_defaults.solid_duration = 1234.0;
        let back = Tuning::from_json(&tuning.to_json().unwrap()).unwrap();
        assert_eq!(back.phase_defaults.solid_duration, 1234.0);
    }
}
