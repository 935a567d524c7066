//! Run state and lifecycle types
//!
//! Everything a run needs lives in one exclusively owned `RunState`. Same seed
//! plus the same tick inputs always yields the same run.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::{DifficultyModel, ParameterVector, sanitize_elapsed};
use super::director::{Director, Spawned};
use super::ledger::{EnemyKind, EntityId, EntityKind, PlatformKind, SpawnLedger};
use super::powerups::{AppearanceMode, PlayerPowerState, Pose};
use super::schedule::DeferredQueue;
use super::score::Score;
use super::world::{Cue, SpawnAttributes, UiSnapshot, World};
use crate::tuning::Tuning;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Playing,
    /// Clock frozen until the next pause toggle
    Paused,
    /// Run ended; further ticks do nothing
    GameOver,
}

/// Per-platform landing bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformWear {
    pub kind: PlatformKind,
    pub touches: u8,
    pub max_touches: u8,
    /// Break already scheduled; later landings are ignored
    pub spent: bool,
}

/// Multi-hit enemy bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossState {
    pub health: u8,
    /// Recently hit and immune to further stomps
    pub flashing: bool,
}

/// Final numbers for a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub score: u64,
    /// Highest climb above the start point, in pixels
    pub max_height: u32,
    pub height_units: u32,
    pub max_combo: u32,
    pub duration_ms: u64,
    pub difficulty_level: u32,
    pub platforms_placed: u64,
}

/// Complete state of one run (deterministic, exclusively owned by the tick)
#[derive(Debug, Clone)]
pub struct RunState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub difficulty: DifficultyModel,
    /// Parameters derived from the current difficulty factor
    pub params: ParameterVector,
    /// Last logged difficulty level
    pub level: u32,
    pub rng: Pcg32,
    pub phase: RunPhase,
    /// Run clock, excluding time spent paused
    pub clock_ms: f64,
    /// Total host time spent paused
    pub paused_ms: f64,
    last_host_ms: f64,
    /// Simulation tick counter (ticks while playing)
    pub time_ticks: u64,
    pub ledger: SpawnLedger,
    pub deferred: DeferredQueue,
    pub director: Director,
    pub power: PlayerPowerState,
    pub score: Score,
    /// Player y at run start; height is measured from here
    pub start_y: f32,
    pub platforms: BTreeMap<EntityId, PlatformWear>,
    pub bosses: BTreeMap<EntityId, BossState>,
    pub appearance: AppearanceMode,
    pub summary: Option<RunSummary>,
}

impl RunState {
    /// Start a run and seed the opening platforms into `world`
    pub fn new(seed: u64, tuning: Tuning, world: &mut impl World) -> Self {
        let start = Director::player_start(&tuning);
        let mut state = Self {
            seed,
            difficulty: DifficultyModel::from_tuning(&tuning),
            params: ParameterVector::default(),
            level: 0,
            rng: Pcg32::seed_from_u64(seed),
            phase: RunPhase::Playing,
            clock_ms: 0.0,
            paused_ms: 0.0,
            last_host_ms: 0.0,
            time_ticks: 0,
            ledger: SpawnLedger::new(),
            deferred: DeferredQueue::new(),
            director: Director::new(start.y),
            power: PlayerPowerState::new(&tuning),
            score: Score::new(),
            start_y: start.y,
            platforms: BTreeMap::new(),
            bosses: BTreeMap::new(),
            appearance: AppearanceMode::Plain(Pose::Idle),
            summary: None,
            tuning,
        };

        let seeded = state.director.seed_initial(
            &state.tuning,
            &mut state.rng,
            &mut state.ledger,
            world,
        );
        for spawned in &seeded {
            state.register(spawned);
        }

        log::info!("Run started with seed {}", seed);
        state
    }

    /// Start tracking whatever per-entity state a new spawn needs
    pub fn register(&mut self, spawned: &Spawned) {
        match (spawned.kind, spawned.attributes) {
            (EntityKind::Platform(kind), SpawnAttributes::Platform { max_touches, .. }) => {
                self.platforms.insert(
                    spawned.id,
                    PlatformWear {
                        kind,
                        touches: 0,
                        max_touches: max_touches.max(1),
                        spent: false,
                    },
                );
            }
            (EntityKind::Enemy(EnemyKind::Boss), SpawnAttributes::Enemy { health, .. }) => {
                self.bosses.insert(
                    spawned.id,
                    BossState {
                        health: health.max(1),
                        flashing: false,
                    },
                );
            }
            _ => {}
        }
    }

    /// Drop all bookkeeping for an entity the ledger no longer holds
    pub fn forget(&mut self, id: EntityId) {
        self.platforms.remove(&id);
        self.bosses.remove(&id);
        self.deferred.cancel_target(id);
    }

    /// Remove a live entity from the run and the world
    ///
    /// Returns false (and does nothing) for stale ids.
    pub fn remove_entity(&mut self, id: EntityId, world: &mut impl World) -> bool {
        if self.ledger.remove(id).is_none() {
            return false;
        }
        self.forget(id);
        world.remove_entity(id);
        true
    }

    /// Advance the run clock to the host reading `host_ms`
    ///
    /// Host time that goes backwards is ignored; time spent paused is banked
    /// and never reaches the run clock. Returns the run-clock delta.
    pub fn advance_clock(&mut self, host_ms: f64) -> f64 {
        let host_ms = sanitize_elapsed(host_ms);
        let delta = (host_ms - self.last_host_ms).max(0.0);
        self.last_host_ms = self.last_host_ms.max(host_ms);

        match self.phase {
            RunPhase::Playing => {
                self.clock_ms += delta;
                delta
            }
            RunPhase::Paused => {
                self.paused_ms += delta;
                0.0
            }
            RunPhase::GameOver => 0.0,
        }
    }

    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            RunPhase::Playing => {
                log::info!("Run paused at {:.0}ms", self.clock_ms);
                RunPhase::Paused
            }
            RunPhase::Paused => {
                log::info!("Run resumed after {:.0}ms paused", self.paused_ms);
                RunPhase::Playing
            }
            RunPhase::GameOver => RunPhase::GameOver,
        };
    }

    pub fn is_over(&self) -> bool {
        self.phase == RunPhase::GameOver
    }

    /// End the run: stop the jetpack, drop the combo and pending effects
    pub fn end_run(&mut self, world: &mut impl World) -> &RunSummary {
        self.power.end_run();
        self.deferred.clear();
        self.phase = RunPhase::GameOver;
        let summary = self.build_summary();
        log::info!(
            "Run over: score {}, height {}, best combo {}, level {}",
            summary.score,
            summary.height_units,
            summary.max_combo,
            summary.difficulty_level
        );
        world.notify(Cue::RunEnded);
        self.summary.insert(summary)
    }

    fn build_summary(&self) -> RunSummary {
        RunSummary {
            seed: self.seed,
            score: self.score.total,
            max_height: self.score.max_climb_px.round().max(0.0) as u32,
            height_units: self.score.peak_units,
            max_combo: self.power.combo.max,
            duration_ms: self.clock_ms.round() as u64,
            difficulty_level: self.difficulty.level(self.params.factor),
            platforms_placed: self.director.placed_platforms,
        }
    }

    /// HUD values for the current state
    pub fn ui_snapshot(&self, horizontal: i8) -> UiSnapshot {
        let boost = &self.power.boost;
        let boost_status = if boost.active {
            let remaining = (boost.duration_ms - (self.clock_ms - boost.start_ms)).max(0.0);
            format!("HONEY BOOST {:.1}s", remaining / 1000.0)
        } else {
            String::new()
        };
        UiSnapshot {
            score: self.score.total,
            height: self.score.peak_units,
            combo_text: self.power.combo.text(),
            combo: self.power.combo.count,
            multiplier: self.power.combo.multiplier,
            jetpack_fuel_ratio: self.power.jetpack.fuel_ratio(),
            jetpack_visible: self.power.jetpack.has_booster,
            boost_status,
            horizontal,
        }
    }

    /// Vertical velocity for a jump off a platform or enemy
    pub fn jump_velocity(&self, extra: f32) -> f32 {
        -(self.tuning.jump_power * self.power.jump_multiplier() * extra)
    }
}
