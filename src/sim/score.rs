//! Score aggregation
//!
//! The total only ever grows: every award is `floor(base * multiplier)` with a
//! non-negative multiplier, and height bonuses are paid once per newly
//! reached unit.

use serde::{Deserialize, Serialize};

use crate::consts::HEIGHT_UNIT_PX;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub total: u64,
    /// Highest height unit reached so far
    pub peak_units: u32,
    /// Highest climb in pixels (for the summary)
    pub max_climb_px: f32,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `floor(base_points * multiplier)` and return the new total
    pub fn award(&mut self, base_points: u32, multiplier: f32) -> u64 {
        self.total = self.total.saturating_add(points(base_points, multiplier));
        self.total
    }

    /// Track the climb and pay the per-unit bonus for each new unit
    ///
    /// Returns how many units were newly reached. Units saturate at
    /// `u32::MAX`; the bonus is paid in one step however many units a
    /// single reading skips.
    pub fn record_climb(&mut self, climbed_px: f32, unit_points: u32, multiplier: f32) -> u32 {
        if !climbed_px.is_finite() || climbed_px <= 0.0 {
            return 0;
        }
        self.max_climb_px = self.max_climb_px.max(climbed_px);

        let units = (climbed_px / HEIGHT_UNIT_PX).floor() as u32;
        if units <= self.peak_units {
            return 0;
        }
        let gained = units - self.peak_units;
        let per_unit = points(unit_points, multiplier);
        self.total = self
            .total
            .saturating_add(per_unit.saturating_mul(gained as u64));
        self.peak_units = units;
        gained
    }
}

/// `floor(base * multiplier)`; non-finite multipliers count as 1, negatives as 0
fn points(base_points: u32, multiplier: f32) -> u64 {
    let multiplier = if multiplier.is_finite() {
        multiplier.max(0.0) as f64
    } else {
        1.0
    };
    (base_points as f64 * multiplier).floor() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_award_floors_after_multiplying() {
        let mut score = Score::new();
        assert_eq!(score.award(100, 2.0), 200);
        assert_eq!(score.award(100, 3.0), 500);
        assert_eq!(score.award(1, 1.5), 501);
        assert_eq!(score.award(7, 5.0), 536);
    }

    #[test]
    fn test_award_never_decreases() {
        let mut score = Score::new();
        score.award(100, 1.0);
        assert_eq!(score.award(100, -4.0), 100);
        assert_eq!(score.award(100, f32::NAN), 200);
    }

    #[test]
    fn test_height_paid_once_per_unit() {
        let mut score = Score::new();
        assert_eq!(score.record_climb(35.0, 1, 1.0), 3);
        assert_eq!(score.total, 3);
        // Same height again, or lower: nothing
        assert_eq!(score.record_climb(39.0, 1, 1.0), 0);
        assert_eq!(score.record_climb(12.0, 1, 1.0), 0);
        assert_eq!(score.total, 3);
        // Back above the old peak: only the new units
        assert_eq!(score.record_climb(52.0, 1, 2.0), 2);
        assert_eq!(score.total, 7);
        assert_eq!(score.peak_units, 5);
        assert_eq!(score.max_climb_px, 52.0);
    }

    #[test]
    fn test_huge_climb_pays_in_one_step() {
        let mut score = Score::new();
        let started = std::time::Instant::now();
        let gained = score.record_climb(1.0e12, 1, 1.0);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(gained, u32::MAX);
        assert_eq!(score.peak_units, u32::MAX);
        assert_eq!(score.total, u32::MAX as u64);
        // Nothing left to pay above the saturated peak
        assert_eq!(score.record_climb(f32::MAX, 1, 1.0), 0);
        assert_eq!(score.total, u32::MAX as u64);
    }

    #[test]
    fn test_climb_bonus_floors_per_unit() {
        let mut score = Score::new();
        // floor(3 * 1.5) = 4 per unit, as if awarded one unit at a time
        assert_eq!(score.record_climb(50.0, 3, 1.5), 5);
        assert_eq!(score.total, 20);
    }

    #[test]
    fn test_descending_below_start_is_ignored() {
        let mut score = Score::new();
        assert_eq!(score.record_climb(-80.0, 1, 1.0), 0);
        assert_eq!(score.total, 0);
    }
}
