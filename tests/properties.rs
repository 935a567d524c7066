//! Property tests for the run invariants

use proptest::prelude::*;

use bear_jumpventure::Tuning;
use bear_jumpventure::sim::{
    Combo, DifficultyModel, EntityKind, Jetpack, ParameterVector, RecordingWorld, RunState, Score,
    TickInput, TriggerEvent, tick,
};

/// Drive a run upward at a steady climb rate with no trigger events
fn climb(seed: u64, ticks: u32, tick_ms: f64, px_per_tick: f32) -> (RunState, RecordingWorld) {
    let mut world = RecordingWorld::new();
    let mut state = RunState::new(seed, Tuning::default(), &mut world);
    for i in 1..=ticks {
        let climbed = i as f32 * px_per_tick;
        let input = TickInput {
            elapsed_ms: i as f64 * tick_ms,
            player_y: 700.0 - climbed,
            camera_top: -climbed,
            camera_bottom: 800.0 - climbed,
            ..Default::default()
        };
        tick(&mut state, &input, &[], &mut world);
    }
    (state, world)
}

proptest! {
    #[test]
    fn factor_is_monotonic(a in -1.0e6f64..1.0e7, b in -1.0e6f64..1.0e7) {
        let model = DifficultyModel::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(model.factor(lo) <= model.factor(hi));
    }

    #[test]
    fn factor_pinned_outside_ramp(
        grace in 0.0f64..60_000.0,
        ramp in 1.0f64..300_000.0,
        t in 0.0f64..1.0
    ) {
        let model = DifficultyModel::new(grace, ramp);
        prop_assert_eq!(model.factor(grace * t * 0.999), 0.0);
        prop_assert_eq!(model.factor(grace + ramp + 1.0 + t * 1000.0), 1.0);
    }

    #[test]
    fn parameters_stay_in_range(factor in prop::num::f32::ANY) {
        let p = ParameterVector::from_factor(factor);
        prop_assert!((0.10..=0.60).contains(&p.breaking_chance));
        prop_assert!((0.08..=0.25).contains(&p.moving_chance));
        prop_assert!((1.0..=2.5).contains(&p.enemy_spawn_chance_mul));
        prop_assert!((1.0..=1.8).contains(&p.enemy_speed_mul));
        prop_assert!((0.7..=1.0).contains(&p.rare_coin_chance_mul));
        prop_assert!((0.5..=1.0).contains(&p.jetpack_chance_mul));
        prop_assert!((1.0..=1.6).contains(&p.moving_platform_speed_mul));
        prop_assert!(p.normal_platform_max_touches == 1 || p.normal_platform_max_touches == 2);
    }

    #[test]
    fn combo_multiplier_is_a_step_function(landings in 0u32..60) {
        let mut combo = Combo::new(Tuning::default().combo_tiers);
        let mut last = 1.0;
        for _ in 0..landings {
            let m = combo.land();
            prop_assert!([1.0, 2.0, 3.0, 5.0].contains(&m));
            prop_assert!(m >= last);
            last = m;
        }
    }

    #[test]
    fn award_floors_product(base in 0u32..100_000, tier in 0usize..4) {
        let multiplier = [1.0f32, 2.0, 3.0, 5.0][tier];
        let mut score = Score::new();
        let total = score.award(base, multiplier);
        prop_assert_eq!(total, (base as f64 * multiplier as f64).floor() as u64);
    }

    #[test]
    fn fuel_never_exceeds_capacity(
        ops in prop::collection::vec((any::<bool>(), any::<bool>(), -50.0f32..200.0), 1..200)
    ) {
        let mut jetpack = Jetpack::new(1200.0, 0.25);
        for (grant, thrust, delta) in ops {
            if grant {
                jetpack.grant();
            }
            jetpack.advance(thrust, delta);
            prop_assert!(jetpack.fuel_ms >= 0.0 && jetpack.fuel_ms <= jetpack.total_ms);
            if !jetpack.has_booster {
                prop_assert_eq!(jetpack.fuel_ms, 0.0);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn platforms_never_overlap(seed in any::<u64>()) {
        let (state, _) = climb(seed, 1500, 100.0, 6.0);
        let platforms: Vec<_> = state.ledger.platforms().map(|e| e.pos).collect();
        for (i, a) in platforms.iter().enumerate() {
            for b in &platforms[i + 1..] {
                prop_assert!(a.distance(*b) >= 60.0, "{:?} and {:?} overlap", a, b);
            }
        }
    }

    #[test]
    fn no_enemies_before_grace(seed in any::<u64>()) {
        // 8000ms of play at a brisk climb, plenty of generation
        let (state, world) = climb(seed, 499, 16.0, 8.0);
        prop_assert!(state.clock_ms < 8000.0);
        prop_assert!(world.spawns().all(|(_, kind, _, _)| !matches!(kind, EntityKind::Enemy(_))));
    }

    #[test]
    fn score_never_decreases(seed in any::<u64>()) {
        let mut world = RecordingWorld::new();
        let mut state = RunState::new(seed, Tuning::default(), &mut world);
        let mut last = 0;
        for i in 1..=400u32 {
            let climbed = (i as f32 * 5.0).min(900.0);
            let events: Vec<TriggerEvent> = state
                .ledger
                .iter()
                .filter(|e| !e.kind.is_platform())
                .take(1)
                .map(|e| match e.kind {
                    EntityKind::Coin(_) => TriggerEvent::CoinCollected { coin: e.id },
                    EntityKind::Powerup(_) => TriggerEvent::PowerupCollected { powerup: e.id },
                    _ => TriggerEvent::EnemyStomped { enemy: e.id },
                })
                .collect();
            let input = TickInput {
                elapsed_ms: i as f64 * 50.0,
                player_y: 700.0 - climbed,
                camera_top: -climbed,
                camera_bottom: 800.0 - climbed,
                ..Default::default()
            };
            tick(&mut state, &input, &events, &mut world);
            prop_assert!(state.score.total >= last);
            last = state.score.total;
        }
    }
}

#[test]
fn late_run_is_at_full_difficulty() {
    let model = DifficultyModel::default();
    let params = model.update(125_000.0);
    assert_eq!(params.factor, 1.0);
    assert_eq!(params.breaking_chance, 0.60);
    assert_eq!(model.level(params.factor), 20);

    let start = model.update(0.0);
    assert_eq!(start.factor, 0.0);
    assert_eq!(start.breaking_chance, 0.10);
    assert_eq!(start.moving_chance, 0.08);
    assert_eq!(start.enemy_spawn_chance_mul, 1.0);
}

#[test]
fn long_run_spawns_enemies_after_grace() {
    let (state, world) = climb(99, 3000, 50.0, 4.0);
    assert!(state.clock_ms > 100_000.0);
    assert!(world.spawns().any(|(_, kind, _, _)| matches!(kind, EntityKind::Enemy(_))));
    // Content far below the camera was cleaned up as the run climbed
    assert!(world.removals().count() > 0);
    assert!(state.ledger.len() < 100);
}
