//! Bear Jumpventure - difficulty and spawn director for an endless climber
//!
//! Core modules:
//! - `sim`: Deterministic run simulation (difficulty, spawning, power-ups, scoring)
//! - `tuning`: Data-driven game balance
//! - `highscores`: Leaderboard ranking model
//! - `platform`: Browser bridge (wasm32 only)

pub mod highscores;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Host tick rate the tuning values were balanced against
    pub const TICK_HZ: u32 = 60;
    /// Nominal tick length in milliseconds
    pub const TICK_MS: f64 = 1000.0 / TICK_HZ as f64;

    /// Playfield dimensions (world units = pixels)
    pub const PLAYFIELD_WIDTH: f32 = 480.0;
    pub const PLAYFIELD_HEIGHT: f32 = 800.0;

    /// Rendered platform width
    pub const PLATFORM_WIDTH: f32 = 110.0;
    /// Patrolling enemies turn around this far from a platform edge
    pub const PATROL_EDGE_INSET: f32 = 20.0;

    /// Pixels of climb per height unit
    pub const HEIGHT_UNIT_PX: f32 = 10.0;

    /// Vertical velocity that separates the rising/falling/idle poses
    pub const POSE_VELOCITY_THRESHOLD: f32 = 50.0;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp that also maps NaN to `min`
#[inline]
pub fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}
