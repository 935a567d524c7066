//! Time-boxed player modifiers
//!
//! Each modifier is a small state machine. Windows (Honey boost, jester hat,
//! start grace) expire by comparing the run clock against an absolute time,
//! never by counting down, so variable tick lengths cannot make them drift.
//! All timers run independently of each other.

use serde::{Deserialize, Serialize};

use crate::clamp_finite;
use crate::consts::POSE_VELOCITY_THRESHOLD;
use crate::tuning::{ComboTier, Tuning};

/// Coarse jetpack state, derived from the fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JetpackState {
    /// No booster
    Idle,
    /// Booster held with fuel, not thrusting
    Armed,
    Thrusting,
}

/// What the jetpack did during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JetpackTick {
    /// Thrust was applied this tick
    pub thrusting: bool,
    /// This tick started a new press (press cost charged)
    pub new_press: bool,
    /// Fuel ran out and the booster was revoked this tick
    pub depleted: bool,
}

/// Fuel-limited jetpack
///
/// A new press costs a fixed share of capacity on top of the per-tick drain,
/// so tapping is never cheaper than holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jetpack {
    pub has_booster: bool,
    pub fuel_ms: f32,
    pub total_ms: f32,
    /// Thrusting during the last advanced tick
    pub active: bool,
    pub last_press_was_new: bool,
    press_cost: f32,
}

impl Jetpack {
    pub fn new(total_ms: f32, press_cost: f32) -> Self {
        Self {
            has_booster: false,
            fuel_ms: 0.0,
            total_ms: total_ms.max(0.0),
            active: false,
            last_press_was_new: false,
            press_cost: clamp_finite(press_cost, 0.0, 1.0),
        }
    }

    pub fn state(&self) -> JetpackState {
        if !self.has_booster {
            JetpackState::Idle
        } else if self.active {
            JetpackState::Thrusting
        } else {
            JetpackState::Armed
        }
    }

    /// Fuel remaining as a fraction of capacity
    pub fn fuel_ratio(&self) -> f32 {
        if self.total_ms <= 0.0 {
            0.0
        } else {
            clamp_finite(self.fuel_ms / self.total_ms, 0.0, 1.0)
        }
    }

    /// Give the player a booster; tops up by a full charge, capped
    pub fn grant(&mut self) {
        self.has_booster = true;
        self.set_fuel(self.fuel_ms + self.total_ms);
    }

    /// Advance one tick with the given input and elapsed time
    pub fn advance(&mut self, thrust_held: bool, delta_ms: f32) -> JetpackTick {
        let delta = clamp_finite(delta_ms, 0.0, self.total_ms);
        let mut tick = JetpackTick::default();

        if self.has_booster && self.fuel_ms > 0.0 && thrust_held {
            // Edge-triggered: only the first tick of a press pays the press cost
            tick.new_press = !self.active;
            if tick.new_press {
                self.set_fuel(self.fuel_ms - self.total_ms * self.press_cost);
            }
            self.active = true;
            self.set_fuel(self.fuel_ms - delta);
            tick.thrusting = true;
        } else {
            self.active = false;
        }
        self.last_press_was_new = tick.new_press;

        if self.has_booster && self.fuel_ms <= 0.0 {
            self.revoke();
            tick.depleted = true;
        }
        tick
    }

    /// Cut thrust without touching fuel (run ended)
    pub fn halt(&mut self) {
        self.active = false;
        self.last_press_was_new = false;
    }

    fn revoke(&mut self) {
        self.has_booster = false;
        self.active = false;
        self.fuel_ms = 0.0;
    }

    fn set_fuel(&mut self, fuel_ms: f32) {
        self.fuel_ms = clamp_finite(fuel_ms, 0.0, self.total_ms);
    }
}

/// Honey boost: jump-power bonus for a fixed window after a rare coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoneyBoost {
    pub active: bool,
    pub start_ms: f64,
    pub duration_ms: f64,
    pub power: f32,
}

impl HoneyBoost {
    pub fn new(duration_ms: f64, power: f32) -> Self {
        Self {
            active: false,
            start_ms: 0.0,
            duration_ms,
            power,
        }
    }

    /// Start (or restart) the window
    pub fn activate(&mut self, now_ms: f64) {
        self.active = true;
        self.start_ms = now_ms;
    }

    /// Returns true if the window closed on this call
    pub fn update(&mut self, now_ms: f64) -> bool {
        if self.active && now_ms - self.start_ms > self.duration_ms {
            self.active = false;
            return true;
        }
        false
    }

    pub fn jump_multiplier(&self) -> f32 {
        if self.active { self.power } else { 1.0 }
    }
}

/// Jester hat: invincibility plus a jump multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JesterHat {
    pub active: bool,
    pub end_ms: f64,
    pub duration_ms: f64,
    pub jump_multiplier: f32,
}

impl JesterHat {
    pub fn new(duration_ms: f64, jump_multiplier: f32) -> Self {
        Self {
            active: false,
            end_ms: 0.0,
            duration_ms,
            jump_multiplier,
        }
    }

    /// Put the hat on. No-op while already wearing it (no refresh).
    pub fn activate(&mut self, now_ms: f64) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.end_ms = now_ms + self.duration_ms;
        true
    }

    /// Returns true if the hat came off on this call
    pub fn update(&mut self, now_ms: f64) -> bool {
        if self.active && now_ms >= self.end_ms {
            self.active = false;
            return true;
        }
        false
    }

    pub fn jump_multiplier(&self) -> f32 {
        if self.active { self.jump_multiplier } else { 1.0 }
    }
}

/// Consecutive-landing counter driving the score multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combo {
    pub count: u32,
    /// Best streak this run
    pub max: u32,
    pub multiplier: f32,
    tiers: Vec<ComboTier>,
}

impl Combo {
    pub fn new(tiers: Vec<ComboTier>) -> Self {
        Self {
            count: 0,
            max: 0,
            multiplier: 1.0,
            tiers,
        }
    }

    /// Multiplier for a given count under these tiers
    pub fn multiplier_for(&self, count: u32) -> f32 {
        self.tiers
            .iter()
            .rev()
            .find(|tier| count >= tier.min_count)
            .map_or(1.0, |tier| tier.multiplier)
    }

    /// Count a landing and return the new multiplier
    pub fn land(&mut self) -> f32 {
        self.count = self.count.saturating_add(1);
        self.max = self.max.max(self.count);
        self.multiplier = self.multiplier_for(self.count);
        self.multiplier
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.multiplier = self.multiplier_for(0);
    }

    /// HUD line, empty until the first multiplier tier
    pub fn text(&self) -> String {
        if self.multiplier <= 1.0 {
            String::new()
        } else {
            format!("{} COMBO! {}X SCORE", self.count, self.multiplier)
        }
    }
}

/// Default-sprite pose from vertical velocity (screen y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pose {
    Rising,
    Falling,
    Idle,
}

impl Pose {
    pub fn from_velocity(vy: f32) -> Self {
        if vy < -POSE_VELOCITY_THRESHOLD {
            Pose::Rising
        } else if vy > POSE_VELOCITY_THRESHOLD {
            Pose::Falling
        } else {
            Pose::Idle
        }
    }
}

/// Player look, resolved by priority each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppearanceMode {
    HatWithJetpack,
    JesterHat,
    Jetpack,
    Plain(Pose),
}

impl AppearanceMode {
    pub fn resolve(hat_active: bool, has_jetpack: bool, vy: f32) -> Self {
        match (hat_active, has_jetpack) {
            (true, true) => AppearanceMode::HatWithJetpack,
            (true, false) => AppearanceMode::JesterHat,
            (false, true) => AppearanceMode::Jetpack,
            (false, false) => AppearanceMode::Plain(Pose::from_velocity(vy)),
        }
    }
}

/// What changed while advancing the power state for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerTick {
    pub jetpack: JetpackTick,
    pub boost_expired: bool,
    pub hat_expired: bool,
    pub grace_ended: bool,
}

/// Every player modifier for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPowerState {
    pub jetpack: Jetpack,
    pub boost: HoneyBoost,
    pub jester_hat: JesterHat,
    /// Start-of-run invincibility ends here
    pub start_grace_end_ms: f64,
    pub combo: Combo,
    start_grace_over: bool,
}

impl PlayerPowerState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            jetpack: Jetpack::new(tuning.jetpack_capacity_ms, tuning.jetpack_press_cost),
            boost: HoneyBoost::new(tuning.honey_boost_ms, tuning.honey_boost_power),
            jester_hat: JesterHat::new(tuning.jester_hat_ms, tuning.jester_hat_jump_multiplier),
            start_grace_end_ms: tuning.start_grace_ms,
            combo: Combo::new(tuning.combo_tiers.clone()),
            start_grace_over: tuning.start_grace_ms <= 0.0,
        }
    }

    /// Advance every timer to `now_ms`
    pub fn advance(&mut self, now_ms: f64, delta_ms: f32, thrust_held: bool) -> PowerTick {
        let grace_ended = !self.start_grace_over && now_ms >= self.start_grace_end_ms;
        if grace_ended {
            self.start_grace_over = true;
        }
        PowerTick {
            boost_expired: self.boost.update(now_ms),
            hat_expired: self.jester_hat.update(now_ms),
            jetpack: self.jetpack.advance(thrust_held, delta_ms),
            grace_ended,
        }
    }

    /// Immune to enemy contact
    pub fn invincible(&self, now_ms: f64) -> bool {
        now_ms < self.start_grace_end_ms || self.jester_hat.active
    }

    /// Combined jump multiplier, applied once per jump
    pub fn jump_multiplier(&self) -> f32 {
        self.jester_hat.jump_multiplier() * self.boost.jump_multiplier()
    }

    pub fn appearance(&self, vy: f32) -> AppearanceMode {
        AppearanceMode::resolve(self.jester_hat.active, self.jetpack.has_booster, vy)
    }

    /// Run ended: stop everything that still acts on the player
    pub fn end_run(&mut self) {
        self.jetpack.halt();
        self.combo.reset();
    }
}
