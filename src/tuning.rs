//! Game balance values
//!
//! Everything here is a tuning knob rather than structure. Hosts can ship a
//! JSON file with any subset of the fields; missing fields take the defaults
//! the game was balanced with.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{PATROL_EDGE_INSET, PLATFORM_WIDTH, PLAYFIELD_WIDTH};

/// Companions must stay this close (vertically) to their anchor platform
pub const MAX_COMPANION_OFFSET: f32 = 100.0;

/// One step of the combo multiplier table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboTier {
    /// Combo count at which this tier starts
    pub min_count: u32,
    /// Score multiplier while in this tier
    pub multiplier: f32,
}

/// Errors raised while loading or validating tuning
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed tuning json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("{name} must be within [0, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        max: f64,
    },
    #[error("platform spacing {spacing} is below the overlap distance {distance}")]
    SpacingBelowOverlap { spacing: f32, distance: f32 },
    #[error("playfield width {width} leaves no room inside margin {margin}")]
    PlayfieldTooNarrow { width: f32, margin: f32 },
    #[error("{name} offset {offset} exceeds the reachable bound {max}")]
    CompanionTooFar {
        name: &'static str,
        offset: f32,
        max: f32,
    },
    #[error("combo tiers must have ascending counts and non-decreasing multipliers >= 1")]
    ComboTiersUnordered,
}

/// Game balance configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Difficulty ===
    /// Time before the difficulty ramp starts
    pub grace_ms: f64,
    /// Time from end of grace until maximum difficulty
    pub ramp_ms: f64,
    /// Number of discrete levels reported alongside the factor
    pub max_level: u32,

    // === Playfield ===
    pub playfield_width: f32,
    /// Lateral keep-out band for spawned content
    pub spawn_margin: f32,
    /// Generate when the frontier is within this distance above the camera
    pub generate_ahead: f32,
    /// Content this far below the camera is despawned
    pub despawn_margin: f32,
    /// Player this far below the camera has fallen out of the run
    pub fall_margin: f32,

    // === Platforms ===
    /// Base gap between platforms (the easiest spacing)
    pub platform_spacing: f32,
    /// Hardest spacing as a multiple of the base gap
    pub max_gap_ratio: f32,
    /// Minimum distance between platform spawn points
    pub min_platform_distance: f32,
    /// Placement attempts before a tick's generation is skipped
    pub placement_attempts: u32,
    /// Platforms seeded above the start platform
    pub initial_platforms: u32,
    pub moving_platform_speed: f32,
    pub spring_bounce_multiplier: f32,
    /// Base type mix for the seeded platforms (percent: normal, breaking, moving)
    pub initial_normal_chance: u32,
    pub initial_breaking_chance: u32,
    pub initial_moving_chance: u32,
    /// Delay before a normal platform breaks after its last touch
    pub normal_break_delay_ms: f64,
    /// Delay before a breaking platform breaks after being stepped on
    pub breaking_break_delay_ms: f64,
    /// How long the low-durability warning stays visible
    pub warning_flash_ms: f64,

    // === Enemies ===
    /// No enemies spawn before this much run time
    pub enemy_grace_ms: f64,
    /// Percent chance per platform at zero difficulty
    pub enemy_spawn_chance: f32,
    pub bouncer_min_factor: f32,
    pub bouncer_chance: u32,
    pub boss_min_factor: f32,
    pub boss_chance: u32,
    /// Percent of the remaining draws that are flyers (rest patrol)
    pub flyer_share: u32,
    pub boss_health: u8,
    /// Boss ignores stomps for this long after being hit
    pub boss_flash_ms: f64,

    // === Coins & power-ups (percent) ===
    pub common_coin_chance: f32,
    pub rare_coin_chance: f32,
    /// Coin weight multiplier while the jester hat is active
    pub hat_coin_multiplier: f32,
    pub jetpack_chance: f32,
    pub jester_hat_chance: f32,

    // === Companion placement (pixels above the anchor platform) ===
    pub patrol_offset: f32,
    pub flyer_offset: f32,
    pub boss_offset: f32,
    pub coin_offset: f32,
    pub jetpack_offset: f32,
    pub jester_hat_offset: f32,

    // === Player ===
    pub jump_power: f32,
    pub start_grace_ms: f64,
    pub honey_boost_ms: f64,
    pub honey_boost_power: f32,
    pub jester_hat_ms: f64,
    pub jester_hat_jump_multiplier: f32,
    pub jetpack_capacity_ms: f32,
    /// Fraction of capacity charged on every new press
    pub jetpack_press_cost: f32,
    pub jetpack_thrust: f32,
    /// Upward kick when grabbing a coin mid-thrust
    pub jetpack_coin_boost: f32,

    // === Combo ===
    pub combo_tiers: Vec<ComboTier>,

    // === Score ===
    pub enemy_stomp_points: u32,
    pub boss_hit_points: u32,
    pub common_coin_points: u32,
    pub rare_coin_points: u32,
    pub jetpack_points: u32,
    pub jester_hat_points: u32,
    pub height_unit_points: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            grace_ms: 5_000.0,
            ramp_ms: 120_000.0,
            max_level: 20,

            playfield_width: PLAYFIELD_WIDTH,
            spawn_margin: 80.0,
            generate_ahead: 200.0,
            despawn_margin: 300.0,
            fall_margin: 200.0,

            platform_spacing: 80.0,
            max_gap_ratio: 1.5,
            min_platform_distance: 60.0,
            placement_attempts: 10,
            initial_platforms: 5,
            moving_platform_speed: 60.0,
            spring_bounce_multiplier: 1.6,
            initial_normal_chance: 60,
            initial_breaking_chance: 20,
            initial_moving_chance: 15,
            normal_break_delay_ms: 150.0,
            breaking_break_delay_ms: 100.0,
            warning_flash_ms: 100.0,

            enemy_grace_ms: 8_000.0,
            enemy_spawn_chance: 15.0,
            bouncer_min_factor: 0.3,
            bouncer_chance: 20,
            boss_min_factor: 0.6,
            boss_chance: 15,
            flyer_share: 70,
            boss_health: 3,
            boss_flash_ms: 200.0,

            common_coin_chance: 20.0,
            rare_coin_chance: 5.0,
            hat_coin_multiplier: 1.5,
            jetpack_chance: 2.0,
            jester_hat_chance: 1.0,

            patrol_offset: 5.0,
            flyer_offset: 80.0,
            boss_offset: 100.0,
            coin_offset: 60.0,
            jetpack_offset: 80.0,
            jester_hat_offset: 90.0,

            jump_power: 550.0,
            start_grace_ms: 1_500.0,
            honey_boost_ms: 5_000.0,
            honey_boost_power: 1.5,
            jester_hat_ms: 7_500.0,
            jester_hat_jump_multiplier: 1.3,
            jetpack_capacity_ms: 1_200.0,
            jetpack_press_cost: 0.25,
            jetpack_thrust: 650.0,
            jetpack_coin_boost: 400.0,

            combo_tiers: vec![
                ComboTier { min_count: 5, multiplier: 2.0 },
                ComboTier { min_count: 10, multiplier: 3.0 },
                ComboTier { min_count: 15, multiplier: 5.0 },
            ],

            enemy_stomp_points: 100,
            boss_hit_points: 50,
            common_coin_points: 50,
            rare_coin_points: 100,
            jetpack_points: 100,
            jester_hat_points: 200,
            height_unit_points: 1,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Read, parse and validate a tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| TuningError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load a tuning file, falling back to defaults on any problem
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(e) => {
                log::warn!("{}, using default tuning", e);
                Self::default()
            }
        }
    }

    /// Reject values that would break the director's invariants
    pub fn validate(&self) -> Result<(), TuningError> {
        positive("ramp_ms", self.ramp_ms)?;
        positive("platform_spacing", self.platform_spacing as f64)?;
        positive("min_platform_distance", self.min_platform_distance as f64)?;
        positive("jetpack_capacity_ms", self.jetpack_capacity_ms as f64)?;
        positive("placement_attempts", self.placement_attempts as f64)?;
        positive("boss_health", self.boss_health as f64)?;
        non_negative("grace_ms", self.grace_ms)?;
        non_negative("enemy_grace_ms", self.enemy_grace_ms)?;
        non_negative("start_grace_ms", self.start_grace_ms)?;

        in_range("jetpack_press_cost", self.jetpack_press_cost as f64, 1.0)?;
        for (name, value) in [
            ("enemy_spawn_chance", self.enemy_spawn_chance),
            ("common_coin_chance", self.common_coin_chance),
            ("rare_coin_chance", self.rare_coin_chance),
            ("jetpack_chance", self.jetpack_chance),
            ("jester_hat_chance", self.jester_hat_chance),
        ] {
            in_range(name, value as f64, 100.0)?;
        }
        for (name, value) in [
            ("bouncer_chance", self.bouncer_chance),
            ("boss_chance", self.boss_chance),
            ("flyer_share", self.flyer_share),
            (
                "initial platform mix",
                self.initial_normal_chance
                    + self.initial_breaking_chance
                    + self.initial_moving_chance,
            ),
        ] {
            in_range(name, value as f64, 100.0)?;
        }

        if self.max_gap_ratio < 1.0 {
            return Err(TuningError::NotPositive {
                name: "max_gap_ratio - 1",
                value: self.max_gap_ratio as f64 - 1.0,
            });
        }
        if self.platform_spacing < self.min_platform_distance {
            return Err(TuningError::SpacingBelowOverlap {
                spacing: self.platform_spacing,
                distance: self.min_platform_distance,
            });
        }
        let margin = self.spawn_margin.max(PLATFORM_WIDTH / 2.0);
        if self.playfield_width <= margin * 2.0 {
            return Err(TuningError::PlayfieldTooNarrow {
                width: self.playfield_width,
                margin,
            });
        }

        for (name, offset) in [
            ("patrol", self.patrol_offset),
            ("flyer", self.flyer_offset),
            ("boss", self.boss_offset),
            ("coin", self.coin_offset),
            ("jetpack", self.jetpack_offset),
            ("jester hat", self.jester_hat_offset),
        ] {
            if !(0.0..=MAX_COMPANION_OFFSET).contains(&offset) {
                return Err(TuningError::CompanionTooFar {
                    name,
                    offset,
                    max: MAX_COMPANION_OFFSET,
                });
            }
        }

        let ordered = self.combo_tiers.windows(2).all(|w| {
            w[0].min_count < w[1].min_count && w[0].multiplier <= w[1].multiplier
        });
        let above_one = self.combo_tiers.iter().all(|t| t.multiplier >= 1.0);
        if !ordered || !above_one {
            return Err(TuningError::ComboTiersUnordered);
        }

        Ok(())
    }

    /// Highest difficulty-independent spacing between platforms
    pub fn max_gap(&self) -> f32 {
        self.platform_spacing * self.max_gap_ratio
    }

    /// Half-width of the strip a patrolling enemy may walk on
    pub fn patrol_half_width(&self) -> f32 {
        (PLATFORM_WIDTH / 2.0 - PATROL_EDGE_INSET).max(0.0)
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), TuningError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), TuningError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::OutOfRange {
            name,
            value,
            max: f64::INFINITY,
        })
    }
}

fn in_range(name: &'static str, value: f64, max: f64) -> Result<(), TuningError> {
    if (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::OutOfRange { name, value, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        Tuning::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "grace_ms": 2000.0, "ramp_ms": 60000.0 }"#).unwrap();
        assert_eq!(tuning.grace_ms, 2000.0);
        assert_eq!(tuning.ramp_ms, 60000.0);
        assert_eq!(tuning.platform_spacing, Tuning::default().platform_spacing);
        assert_eq!(tuning.combo_tiers.len(), 3);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            Tuning::from_json("{ grace_ms: }"),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_zero_ramp() {
        let err = Tuning::from_json(r#"{ "ramp_ms": 0.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::NotPositive { name: "ramp_ms", .. }));
    }

    #[test]
    fn test_rejects_tight_spacing() {
        let err = Tuning::from_json(r#"{ "platform_spacing": 40.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::SpacingBelowOverlap { .. }));
    }

    #[test]
    fn test_rejects_unreachable_companion() {
        let err = Tuning::from_json(r#"{ "coin_offset": 250.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::CompanionTooFar { name: "coin", .. }));
    }

    #[test]
    fn test_rejects_unordered_combo_tiers() {
        let json = r#"{ "combo_tiers": [
            { "min_count": 10, "multiplier": 3.0 },
            { "min_count": 5, "multiplier": 2.0 }
        ] }"#;
        assert!(matches!(
            Tuning::from_json(json),
            Err(TuningError::ComboTiersUnordered)
        ));
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let tuning = Tuning::load_or_default("/nonexistent/tuning.json");
        assert_eq!(tuning, Tuning::default());
    }
}
