//! Per-frame director update
//!
//! Fixed order every tick: clock, difficulty, deferred effects, power-ups,
//! trigger events, generation, height, fall check, cleanup, appearance, HUD.

use serde::{Deserialize, Serialize};

use super::director::{Generation, SpawnContext};
use super::ledger::{CoinKind, EnemyKind, EntityId, EntityKind, PlatformKind, PowerupKind};
use super::schedule::DeferredAction;
use super::state::{RunPhase, RunState};
use super::world::{Cue, World};

/// Host inputs for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Host time since run start (ms); sanitized before use
    pub elapsed_ms: f64,
    pub moving_left: bool,
    pub moving_right: bool,
    pub thrust_held: bool,
    /// Pause toggle
    pub pause: bool,
    pub player_y: f32,
    /// Vertical velocity (negative is up)
    pub player_vy: f32,
    pub camera_top: f32,
    pub camera_bottom: f32,
}

impl TickInput {
    /// -1 left, 1 right, 0 idle; left wins when both are held
    pub fn horizontal(&self) -> i8 {
        if self.moving_left {
            -1
        } else if self.moving_right {
            1
        } else {
            0
        }
    }
}

/// Discrete gameplay events reported by the host's physics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerEvent {
    LandedOnPlatform { platform: EntityId },
    EnemyStomped { enemy: EntityId },
    EnemyContact { enemy: EntityId },
    /// Boss projectile or any other hazard
    HazardContact,
    CoinCollected { coin: EntityId },
    PowerupCollected { powerup: EntityId },
    PlayerDied,
}

/// Advance the run by one tick
pub fn tick(
    state: &mut RunState,
    input: &TickInput,
    events: &[TriggerEvent],
    world: &mut impl World,
) {
    if state.is_over() {
        return;
    }
    if input.pause {
        state.toggle_pause();
    }
    let delta_ms = state.advance_clock(input.elapsed_ms);
    if state.phase != RunPhase::Playing {
        return;
    }
    state.time_ticks += 1;
    let now = state.clock_ms;

    update_difficulty(state);
    fire_deferred(state, world);
    advance_powers(state, delta_ms, input.thrust_held, world);

    for event in events {
        handle_event(state, *event, world);
        if state.is_over() {
            world.set_ui(&state.ui_snapshot(input.horizontal()));
            return;
        }
    }

    let ctx = SpawnContext {
        tuning: &state.tuning,
        params: &state.params,
        elapsed_ms: now,
        camera_top: input.camera_top,
        hat_active: state.power.jester_hat.active,
        tick: state.time_ticks,
    };
    if let Generation::Placed(placement) =
        state
            .director
            .generate(&ctx, &mut state.rng, &mut state.ledger, world)
    {
        state.register(&placement.platform);
        for companion in &placement.companions {
            state.register(companion);
        }
    }

    state.score.record_climb(
        state.start_y - input.player_y,
        state.tuning.height_unit_points,
        state.power.combo.multiplier,
    );

    if input.player_y > input.camera_bottom + state.tuning.fall_margin {
        log::info!("Player fell out of view at y {:.0}", input.player_y);
        state.end_run(world);
        world.set_ui(&state.ui_snapshot(input.horizontal()));
        return;
    }

    let removed = state
        .director
        .cleanup(input.camera_bottom, &state.tuning, &mut state.ledger, world);
    for entry in &removed {
        state.forget(entry.id);
    }

    let appearance = state.power.appearance(input.player_vy);
    if appearance != state.appearance {
        state.appearance = appearance;
        world.notify(Cue::AppearanceChanged(appearance));
    }

    world.set_ui(&state.ui_snapshot(input.horizontal()));
}

fn update_difficulty(state: &mut RunState) {
    state.params = state.difficulty.update(state.clock_ms);
    let level = state.difficulty.level(state.params.factor);
    if level > state.level {
        state.level = level;
        log::info!(
            "Difficulty level {} (factor {:.2}) at {:.0}ms",
            level,
            state.params.factor,
            state.clock_ms
        );
    }
}

fn fire_deferred(state: &mut RunState, world: &mut impl World) {
    let ledger = &state.ledger;
    let fired = state.deferred.fire_due(state.clock_ms, |id| ledger.is_live(id));
    for effect in fired {
        match effect.action {
            DeferredAction::BreakPlatform => {
                log::debug!("Platform {:?} broke", effect.target);
                state.remove_entity(effect.target, world);
            }
            DeferredAction::ClearWarning => {
                world.notify(Cue::PlatformWarning {
                    platform: effect.target,
                    active: false,
                });
            }
            DeferredAction::EndBossFlash => {
                if let Some(boss) = state.bosses.get_mut(&effect.target) {
                    boss.flashing = false;
                }
            }
        }
    }
}

fn advance_powers(state: &mut RunState, delta_ms: f64, thrust_held: bool, world: &mut impl World) {
    let power = state.power.advance(state.clock_ms, delta_ms as f32, thrust_held);

    if power.jetpack.thrusting {
        world.notify(Cue::Thrust {
            velocity_y: -state.tuning.jetpack_thrust,
        });
    }
    if power.jetpack.depleted {
        log::debug!("Jetpack out of fuel");
        world.notify(Cue::JetpackDepleted);
    }
    if power.boost_expired {
        world.notify(Cue::BoostEnded);
    }
    if power.hat_expired {
        world.notify(Cue::HatOff);
    }
    if power.grace_ended {
        world.notify(Cue::GraceEnded);
    }
}

/// Apply one trigger event; stale ids are ignored
pub fn handle_event(state: &mut RunState, event: TriggerEvent, world: &mut impl World) {
    match event {
        TriggerEvent::LandedOnPlatform { platform } => land_on_platform(state, platform, world),
        TriggerEvent::EnemyStomped { enemy } => stomp_enemy(state, enemy, world),
        TriggerEvent::EnemyContact { enemy } => {
            // Already defeated enemies can't hurt anyone
            if state.ledger.is_live(enemy) {
                hurt_player(state, world);
            }
        }
        TriggerEvent::HazardContact => hurt_player(state, world),
        TriggerEvent::CoinCollected { coin } => collect_coin(state, coin, world),
        TriggerEvent::PowerupCollected { powerup } => collect_powerup(state, powerup, world),
        TriggerEvent::PlayerDied => {
            state.end_run(world);
        }
    }
}

/// Every landing on a live platform counts toward the combo. A spent
/// platform (breaking, or out of touches) gives no jump and no reaction.
fn land_on_platform(state: &mut RunState, platform: EntityId, world: &mut impl World) {
    if !state.ledger.is_live(platform) {
        return;
    }
    let Some(wear) = state.platforms.get(&platform).copied() else {
        return;
    };
    state.power.combo.land();
    if wear.spent {
        return;
    }

    let now = state.clock_ms;
    let tuning = &state.tuning;
    let mut bounce = 1.0;

    match wear.kind {
        PlatformKind::Normal => {
            let touches = wear.touches.saturating_add(1);
            let spent = touches >= wear.max_touches;
            if touches >= wear.max_touches.saturating_sub(1) {
                world.notify(Cue::PlatformWarning {
                    platform,
                    active: true,
                });
                state.deferred.schedule(
                    now + tuning.warning_flash_ms,
                    platform,
                    DeferredAction::ClearWarning,
                );
            }
            if spent {
                state.deferred.schedule(
                    now + tuning.normal_break_delay_ms,
                    platform,
                    DeferredAction::BreakPlatform,
                );
            }
            if let Some(entry) = state.platforms.get_mut(&platform) {
                entry.touches = touches;
                entry.spent = spent;
            }
        }
        PlatformKind::Breaking => {
            state.deferred.schedule(
                now + tuning.breaking_break_delay_ms,
                platform,
                DeferredAction::BreakPlatform,
            );
            if let Some(entry) = state.platforms.get_mut(&platform) {
                entry.touches = 1;
                entry.spent = true;
            }
        }
        PlatformKind::Moving => {}
        PlatformKind::Spring => bounce = state.tuning.spring_bounce_multiplier,
    }

    world.notify(Cue::Jump {
        velocity_y: state.jump_velocity(bounce),
    });
}

fn stomp_enemy(state: &mut RunState, enemy: EntityId, world: &mut impl World) {
    let Some(entry) = state.ledger.get(enemy) else {
        return;
    };
    let EntityKind::Enemy(kind) = entry.kind else {
        return;
    };
    let multiplier = state.power.combo.multiplier;

    if kind == EnemyKind::Boss {
        let flash_ms = state.tuning.boss_flash_ms;
        let points = state.tuning.boss_hit_points;
        let now = state.clock_ms;
        if let Some(boss) = state.bosses.get_mut(&enemy) {
            if !boss.flashing {
                boss.health = boss.health.saturating_sub(1);
                let health = boss.health;
                state.score.award(points, multiplier);
                world.notify(Cue::BossHit { boss: enemy, health });
                if health == 0 {
                    log::debug!("Boss {:?} defeated", enemy);
                    state.remove_entity(enemy, world);
                } else {
                    boss.flashing = true;
                    state.deferred.schedule(now + flash_ms, enemy, DeferredAction::EndBossFlash);
                }
            }
        }
    } else {
        state.score.award(state.tuning.enemy_stomp_points, multiplier);
        state.remove_entity(enemy, world);
    }

    // Stomping always bounces, even off a flashing boss
    world.notify(Cue::Jump {
        velocity_y: state.jump_velocity(1.0),
    });
}

fn hurt_player(state: &mut RunState, world: &mut impl World) {
    if state.power.invincible(state.clock_ms) {
        return;
    }
    state.end_run(world);
}

fn collect_coin(state: &mut RunState, coin: EntityId, world: &mut impl World) {
    let Some(entry) = state.ledger.get(coin) else {
        return;
    };
    let EntityKind::Coin(kind) = entry.kind else {
        return;
    };
    let multiplier = state.power.combo.multiplier;

    match kind {
        CoinKind::Common => {
            state.score.award(state.tuning.common_coin_points, multiplier);
        }
        CoinKind::Rare => {
            state.score.award(state.tuning.rare_coin_points, multiplier);
            state.power.boost.activate(state.clock_ms);
            world.notify(Cue::BoostStarted);
        }
    }
    if state.power.jetpack.active {
        world.notify(Cue::CoinBoost {
            velocity_y: -state.tuning.jetpack_coin_boost,
        });
    }
    state.remove_entity(coin, world);
}

fn collect_powerup(state: &mut RunState, powerup: EntityId, world: &mut impl World) {
    let Some(entry) = state.ledger.get(powerup) else {
        return;
    };
    let EntityKind::Powerup(kind) = entry.kind else {
        return;
    };
    let multiplier = state.power.combo.multiplier;

    match kind {
        PowerupKind::Jetpack => {
            state.power.jetpack.grant();
            state.score.award(state.tuning.jetpack_points, multiplier);
            world.notify(Cue::JetpackGranted);
        }
        PowerupKind::JesterHat => {
            if state.power.jester_hat.activate(state.clock_ms) {
                world.notify(Cue::HatOn);
            }
            state.score.award(state.tuning.jester_hat_points, multiplier);
        }
    }
    state.remove_entity(powerup, world);
}
