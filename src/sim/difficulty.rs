//! Time-driven difficulty curve
//!
//! Elapsed run time maps to a factor in [0, 1]: flat during the grace period,
//! then an ease-in-quadratic ramp. Every gameplay knob the spawner reads is a
//! clamped function of that factor.

use serde::{Deserialize, Serialize};

use crate::clamp_finite;
use crate::tuning::Tuning;

/// Difficulty curve parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyModel {
    pub grace_ms: f64,
    pub ramp_ms: f64,
    pub max_level: u32,
}

impl DifficultyModel {
    pub fn new(grace_ms: f64, ramp_ms: f64) -> Self {
        Self {
            grace_ms: grace_ms.max(0.0),
            ramp_ms: ramp_ms.max(1.0),
            max_level: 20,
        }
    }

    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            max_level: tuning.max_level,
            ..Self::new(tuning.grace_ms, tuning.ramp_ms)
        }
    }

    /// Difficulty factor for the given run time
    ///
    /// Negative or NaN input counts as the start of the run.
    pub fn factor(&self, elapsed_ms: f64) -> f32 {
        let elapsed = sanitize_elapsed(elapsed_ms);
        let t = (elapsed - self.grace_ms).max(0.0);
        let u = (t / self.ramp_ms.max(1.0)).clamp(0.0, 1.0);
        (u * u) as f32
    }

    /// Discrete level for the given factor
    pub fn level(&self, factor: f32) -> u32 {
        let factor = clamp_finite(factor, 0.0, 1.0);
        ((factor * self.max_level as f32).floor() as u32).min(self.max_level)
    }

    /// Parameter vector for the given run time
    pub fn update(&self, elapsed_ms: f64) -> ParameterVector {
        ParameterVector::from_factor(self.factor(elapsed_ms))
    }
}

impl Default for DifficultyModel {
    fn default() -> Self {
        Self::new(5_000.0, 120_000.0)
    }
}

/// Map any clock reading onto a usable elapsed time
pub fn sanitize_elapsed(elapsed_ms: f64) -> f64 {
    if elapsed_ms.is_nan() || elapsed_ms < 0.0 {
        0.0
    } else {
        elapsed_ms.min(f64::MAX)
    }
}

/// Gameplay knobs derived from the difficulty factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterVector {
    /// The factor these values were derived from (clamped)
    pub factor: f32,
    /// Blend between the easiest and hardest platform gap
    pub platform_gap_blend: f32,
    pub breaking_chance: f32,
    pub moving_chance: f32,
    pub spring_chance: f32,
    pub enemy_spawn_chance_mul: f32,
    pub enemy_speed_mul: f32,
    /// Rare coins get rarer as the run goes on
    pub rare_coin_chance_mul: f32,
    pub jetpack_chance_mul: f32,
    pub moving_platform_speed_mul: f32,
    /// Landings a normal platform survives
    pub normal_platform_max_touches: u8,
}

impl ParameterVector {
    pub fn from_factor(factor: f32) -> Self {
        let f = clamp_finite(factor, 0.0, 1.0);
        Self {
            factor: f,
            platform_gap_blend: clamp_finite(f, 0.0, 1.0),
            breaking_chance: clamp_finite(0.10 + 0.50 * f, 0.10, 0.60),
            moving_chance: clamp_finite(0.08 + 0.17 * f, 0.08, 0.25),
            spring_chance: 0.05,
            enemy_spawn_chance_mul: clamp_finite(1.0 + 1.5 * f, 1.0, 2.5),
            enemy_speed_mul: clamp_finite(1.0 + 0.8 * f, 1.0, 1.8),
            rare_coin_chance_mul: clamp_finite(1.0 - 0.3 * f, 0.7, 1.0),
            jetpack_chance_mul: clamp_finite(1.0 - 0.5 * f, 0.5, 1.0),
            moving_platform_speed_mul: clamp_finite(1.0 + 0.6 * f, 1.0, 1.6),
            normal_platform_max_touches: if f < 0.5 { 2 } else { 1 },
        }
    }
}

impl Default for ParameterVector {
    fn default() -> Self {
        Self::from_factor(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_zero_during_grace() {
        let model = DifficultyModel::default();
        assert_eq!(model.factor(0.0), 0.0);
        assert_eq!(model.factor(4_999.0), 0.0);
        assert_eq!(model.factor(5_000.0), 0.0);
    }

    #[test]
    fn test_factor_eases_in() {
        let model = DifficultyModel::default();
        // Halfway through the ramp: 0.5^2
        assert!((model.factor(65_000.0) - 0.25).abs() < 1e-6);
        assert_eq!(model.factor(125_000.0), 1.0);
        assert_eq!(model.factor(10_000_000.0), 1.0);
    }

    #[test]
    fn test_bad_clock_treated_as_zero() {
        let model = DifficultyModel::default();
        assert_eq!(model.factor(-500.0), 0.0);
        assert_eq!(model.factor(f64::NAN), 0.0);
        assert_eq!(model.factor(f64::INFINITY), 1.0);
    }

    #[test]
    fn test_base_parameters_at_start() {
        let params = DifficultyModel::default().update(0.0);
        assert_eq!(params.breaking_chance, 0.10);
        assert_eq!(params.moving_chance, 0.08);
        assert_eq!(params.spring_chance, 0.05);
        assert_eq!(params.enemy_spawn_chance_mul, 1.0);
        assert_eq!(params.rare_coin_chance_mul, 1.0);
        assert_eq!(params.jetpack_chance_mul, 1.0);
        assert_eq!(params.normal_platform_max_touches, 2);
    }

    #[test]
    fn test_max_parameters_after_ramp() {
        let params = DifficultyModel::default().update(125_000.0);
        assert_eq!(params.factor, 1.0);
        assert!((params.breaking_chance - 0.60).abs() < 1e-6);
        assert!((params.moving_chance - 0.25).abs() < 1e-6);
        assert!((params.enemy_spawn_chance_mul - 2.5).abs() < 1e-6);
        assert!((params.rare_coin_chance_mul - 0.7).abs() < 1e-6);
        assert!((params.jetpack_chance_mul - 0.5).abs() < 1e-6);
        assert_eq!(params.normal_platform_max_touches, 1);
    }

    #[test]
    fn test_out_of_range_factor_is_clamped() {
        let high = ParameterVector::from_factor(7.0);
        assert_eq!(high, ParameterVector::from_factor(1.0));
        let low = ParameterVector::from_factor(-3.0);
        assert_eq!(low, ParameterVector::from_factor(0.0));
        let nan = ParameterVector::from_factor(f32::NAN);
        assert_eq!(nan, ParameterVector::from_factor(0.0));
    }

    #[test]
    fn test_touches_drop_at_half_difficulty() {
        assert_eq!(ParameterVector::from_factor(0.49).normal_platform_max_touches, 2);
        assert_eq!(ParameterVector::from_factor(0.5).normal_platform_max_touches, 1);
    }

    #[test]
    fn test_levels() {
        let model = DifficultyModel::default();
        assert_eq!(model.level(0.0), 0);
        assert_eq!(model.level(0.5), 10);
        assert_eq!(model.level(1.0), 20);
        assert_eq!(model.level(3.0), 20);
    }
}
