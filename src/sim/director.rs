//! Procedural content placement
//!
//! Keeps the generation frontier (the highest placed platform) ahead of the
//! camera. Each tick at most one platform is placed, with independent draws
//! for the companions that ride along with it. Screen coordinates: y grows
//! downward, so climbing means decreasing y.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::ParameterVector;
use super::ledger::{
    CoinKind, EnemyKind, EntityId, EntityKind, LedgerEntry, PlatformKind, PowerupKind, SpawnLedger,
};
use super::world::{Cue, PatrolBounds, SpawnAttributes, World};
use crate::clamp_finite;
use crate::consts::PLAYFIELD_HEIGHT;
use crate::lerp;
use crate::tuning::Tuning;

/// Run-time inputs for one generation step
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext<'a> {
    pub tuning: &'a Tuning,
    pub params: &'a ParameterVector,
    /// Run clock in ms
    pub elapsed_ms: f64,
    /// Top edge of the visible area
    pub camera_top: f32,
    /// Jester hat running (coins are more common)
    pub hat_active: bool,
    pub tick: u64,
}

/// One placed entity and how it was configured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spawned {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub attributes: SpawnAttributes,
}

/// A platform and its companions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub platform: Spawned,
    pub companions: Vec<Spawned>,
}

/// Result of one generation step
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    /// Frontier is far enough ahead of the camera
    NotNeeded,
    Placed(Placement),
    /// Every candidate overlapped; nothing placed this tick
    Skipped { attempts: u32 },
}

/// Decides what to spawn next and where
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Director {
    /// y of the highest platform placed so far
    pub frontier_y: f32,
    pub placed_platforms: u64,
    pub skipped_generations: u64,
}

impl Director {
    pub fn new(frontier_y: f32) -> Self {
        Self {
            frontier_y,
            placed_platforms: 0,
            skipped_generations: 0,
        }
    }

    /// Player spawn point for a fresh run
    pub fn player_start(tuning: &Tuning) -> Vec2 {
        Vec2::new(tuning.playfield_width / 2.0, PLAYFIELD_HEIGHT - 100.0)
    }

    /// Lay out the start platform and the first few above it
    pub fn seed_initial(
        &mut self,
        tuning: &Tuning,
        rng: &mut Pcg32,
        ledger: &mut SpawnLedger,
        world: &mut impl World,
    ) -> Vec<Spawned> {
        let params = ParameterVector::default();
        let start = Vec2::new(tuning.playfield_width / 2.0, PLAYFIELD_HEIGHT - 50.0);
        let mut placed = vec![place_platform(
            PlatformKind::Normal,
            start,
            &params,
            tuning,
            rng,
            ledger,
            0,
            world,
        )];

        for i in 1..=tuning.initial_platforms {
            let x = random_x(tuning, rng);
            let y = start.y - i as f32 * tuning.platform_spacing;
            let kind = base_platform_kind(tuning, rng);
            let pos = Vec2::new(x, y);
            placed.push(place_platform(kind, pos, &params, tuning, rng, ledger, 0, world));
        }

        self.frontier_y = placed.iter().map(|s| s.pos.y).fold(start.y, f32::min);
        self.placed_platforms += placed.len() as u64;
        log::info!(
            "Seeded {} platforms, frontier at {}",
            placed.len(),
            self.frontier_y
        );
        placed
    }

    /// Place the next platform if the frontier is close to the camera
    pub fn generate(
        &mut self,
        ctx: &SpawnContext,
        rng: &mut Pcg32,
        ledger: &mut SpawnLedger,
        world: &mut impl World,
    ) -> Generation {
        let tuning = ctx.tuning;
        let threshold = ctx.camera_top - tuning.generate_ahead;
        if self.frontier_y <= threshold {
            return Generation::NotNeeded;
        }

        let spacing = lerp(
            tuning.platform_spacing,
            tuning.max_gap(),
            clamp_finite(ctx.params.platform_gap_blend, 0.0, 1.0),
        );

        // Every attempt advances the frontier, as a failed spot means the
        // band at that height is crowded.
        let mut candidate = None;
        for _ in 0..tuning.placement_attempts {
            self.frontier_y -= spacing;
            let pos = Vec2::new(random_x(tuning, rng), self.frontier_y);
            if !ledger.any_within(pos, tuning.min_platform_distance, EntityKind::is_platform) {
                candidate = Some(pos);
                break;
            }
        }

        let Some(pos) = candidate else {
            self.skipped_generations += 1;
            log::info!(
                "Skipped platform generation after {} attempts (frontier {})",
                tuning.placement_attempts,
                self.frontier_y
            );
            world.notify(Cue::GenerationSkipped {
                attempts: tuning.placement_attempts,
            });
            return Generation::Skipped {
                attempts: tuning.placement_attempts,
            };
        };

        let kind = scaled_platform_kind(ctx.params, rng.random::<f32>());
        let platform = place_platform(kind, pos, ctx.params, tuning, rng, ledger, ctx.tick, world);
        self.placed_platforms += 1;

        let mut companions = Vec::new();
        if let Some(enemy) = self.maybe_enemy(ctx, &platform, rng, ledger, world) {
            companions.push(enemy);
        }
        if let Some(coin) = maybe_coin(ctx, pos, rng, ledger, world) {
            companions.push(coin);
        }
        if let Some(powerup) = maybe_powerups(ctx, pos, rng, ledger, world) {
            companions.extend(powerup);
        }

        log::debug!(
            "Placed {:?} at ({:.0}, {:.0}) with {} companions, factor {:.2}",
            kind,
            pos.x,
            pos.y,
            companions.len(),
            ctx.params.factor
        );
        Generation::Placed(Placement {
            platform,
            companions,
        })
    }

    fn maybe_enemy(
        &self,
        ctx: &SpawnContext,
        platform: &Spawned,
        rng: &mut Pcg32,
        ledger: &mut SpawnLedger,
        world: &mut impl World,
    ) -> Option<Spawned> {
        let tuning = ctx.tuning;
        if ctx.elapsed_ms < tuning.enemy_grace_ms {
            return None;
        }
        let chance = clamp_finite(
            tuning.enemy_spawn_chance * ctx.params.enemy_spawn_chance_mul,
            0.0,
            100.0,
        );
        if roll_percent(rng) as f32 > chance {
            return None;
        }

        let kind = pick_enemy_kind(ctx.params.factor, tuning, rng);
        let direction = random_direction(rng);
        let (pos, anchor, patrol) = if kind.is_anchored() {
            let half = tuning.patrol_half_width();
            let bounds = PatrolBounds {
                left: platform.pos.x - half,
                right: platform.pos.x + half,
            };
            let pos = Vec2::new(platform.pos.x, platform.pos.y - tuning.patrol_offset);
            (pos, Some(platform.id), Some(bounds))
        } else {
            let offset = match kind {
                EnemyKind::Boss => tuning.boss_offset,
                _ => tuning.flyer_offset,
            };
            (Vec2::new(random_x(tuning, rng), platform.pos.y - offset), None, None)
        };

        let attributes = SpawnAttributes::Enemy {
            speed_mul: ctx.params.enemy_speed_mul,
            direction,
            anchor,
            patrol,
            health: if kind == EnemyKind::Boss { tuning.boss_health } else { 1 },
        };
        Some(spawn(EntityKind::Enemy(kind), pos, attributes, ledger, ctx.tick, world))
    }

    /// Drop content that fell far below the camera
    pub fn cleanup(
        &self,
        camera_bottom: f32,
        tuning: &Tuning,
        ledger: &mut SpawnLedger,
        world: &mut impl World,
    ) -> Vec<LedgerEntry> {
        let removed = ledger.remove_below(camera_bottom + tuning.despawn_margin);
        for entry in &removed {
            world.remove_entity(entry.id);
        }
        if !removed.is_empty() {
            log::debug!("Despawned {} entities below {}", removed.len(), camera_bottom);
        }
        removed
    }
}

fn maybe_coin(
    ctx: &SpawnContext,
    anchor: Vec2,
    rng: &mut Pcg32,
    ledger: &mut SpawnLedger,
    world: &mut impl World,
) -> Option<Spawned> {
    let tuning = ctx.tuning;
    let power_mul = if ctx.hat_active { tuning.hat_coin_multiplier } else { 1.0 };
    let kind = pick_coin_kind(
        tuning.rare_coin_chance * ctx.params.rare_coin_chance_mul * power_mul,
        tuning.common_coin_chance * power_mul,
        roll_percent(rng),
    )?;
    let pos = Vec2::new(random_x(tuning, rng), anchor.y - tuning.coin_offset);
    Some(spawn(EntityKind::Coin(kind), pos, SpawnAttributes::Plain, ledger, ctx.tick, world))
}

fn maybe_powerups(
    ctx: &SpawnContext,
    anchor: Vec2,
    rng: &mut Pcg32,
    ledger: &mut SpawnLedger,
    world: &mut impl World,
) -> Option<Vec<Spawned>> {
    let tuning = ctx.tuning;
    let mut spawned = Vec::new();

    let jetpack_chance = tuning.jetpack_chance * ctx.params.jetpack_chance_mul;
    if roll_permille(rng) as f32 <= clamp_finite(jetpack_chance * 10.0, 0.0, 1000.0) {
        let pos = Vec2::new(random_x(tuning, rng), anchor.y - tuning.jetpack_offset);
        let kind = EntityKind::Powerup(PowerupKind::Jetpack);
        spawned.push(spawn(kind, pos, SpawnAttributes::Plain, ledger, ctx.tick, world));
    }

    if roll_permille(rng) as f32 <= clamp_finite(tuning.jester_hat_chance * 10.0, 0.0, 1000.0) {
        let pos = Vec2::new(random_x(tuning, rng), anchor.y - tuning.jester_hat_offset);
        let kind = EntityKind::Powerup(PowerupKind::JesterHat);
        spawned.push(spawn(kind, pos, SpawnAttributes::Plain, ledger, ctx.tick, world));
    }

    (!spawned.is_empty()).then_some(spawned)
}

#[allow(clippy::too_many_arguments)]
fn place_platform(
    kind: PlatformKind,
    pos: Vec2,
    params: &ParameterVector,
    tuning: &Tuning,
    rng: &mut Pcg32,
    ledger: &mut SpawnLedger,
    tick: u64,
    world: &mut impl World,
) -> Spawned {
    let direction = random_direction(rng);
    let speed = if kind == PlatformKind::Moving {
        tuning.moving_platform_speed * params.moving_platform_speed_mul
    } else {
        0.0
    };
    let attributes = SpawnAttributes::Platform {
        max_touches: params.normal_platform_max_touches,
        speed,
        direction,
    };
    spawn(EntityKind::Platform(kind), pos, attributes, ledger, tick, world)
}

fn spawn(
    kind: EntityKind,
    pos: Vec2,
    attributes: SpawnAttributes,
    ledger: &mut SpawnLedger,
    tick: u64,
    world: &mut impl World,
) -> Spawned {
    let id = ledger.insert(kind, pos, tick);
    world.spawn_entity(id, kind, pos, attributes);
    Spawned {
        id,
        kind,
        pos,
        attributes,
    }
}

/// Cumulative draw: breaking, then moving, then spring, else normal
pub fn scaled_platform_kind(params: &ParameterVector, roll: f32) -> PlatformKind {
    let roll = clamp_finite(roll, 0.0, 1.0);
    let mut cumulative = 0.0;

    cumulative += clamp_finite(params.breaking_chance, 0.0, 1.0);
    if roll < cumulative {
        return PlatformKind::Breaking;
    }
    cumulative += clamp_finite(params.moving_chance, 0.0, 1.0);
    if roll < cumulative {
        return PlatformKind::Moving;
    }
    cumulative += clamp_finite(params.spring_chance, 0.0, 1.0);
    if roll < cumulative {
        return PlatformKind::Spring;
    }
    PlatformKind::Normal
}

/// Difficulty-independent mix used for the seeded platforms
fn base_platform_kind(tuning: &Tuning, rng: &mut Pcg32) -> PlatformKind {
    let roll = roll_percent(rng);
    let normal = tuning.initial_normal_chance;
    let breaking = normal + tuning.initial_breaking_chance;
    let moving = breaking + tuning.initial_moving_chance;
    if roll <= normal {
        PlatformKind::Normal
    } else if roll <= breaking {
        PlatformKind::Breaking
    } else if roll <= moving {
        PlatformKind::Moving
    } else {
        PlatformKind::Spring
    }
}

/// Boss only late and rarely, bouncers from mid-run, else flyers or patrols
pub fn pick_enemy_kind(factor: f32, tuning: &Tuning, rng: &mut Pcg32) -> EnemyKind {
    if factor > tuning.boss_min_factor && roll_percent(rng) <= tuning.boss_chance {
        return EnemyKind::Boss;
    }
    if factor > tuning.bouncer_min_factor && roll_percent(rng) <= tuning.bouncer_chance {
        return EnemyKind::Bouncer;
    }
    if roll_percent(rng) <= tuning.flyer_share {
        EnemyKind::Flyer
    } else {
        EnemyKind::Patrol
    }
}

/// One roll decides between rare, common and no coin
pub fn pick_coin_kind(rare_chance: f32, common_chance: f32, roll: u32) -> Option<CoinKind> {
    let rare = clamp_finite(rare_chance, 0.0, 100.0);
    let total = clamp_finite(rare + clamp_finite(common_chance, 0.0, 100.0), 0.0, 100.0);
    let roll = roll as f32;
    if roll <= rare {
        Some(CoinKind::Rare)
    } else if roll <= total {
        Some(CoinKind::Common)
    } else {
        None
    }
}

fn random_x(tuning: &Tuning, rng: &mut Pcg32) -> f32 {
    let margin = tuning.spawn_margin;
    let right = (tuning.playfield_width - margin).max(margin);
    rng.random_range(margin..=right)
}

fn random_direction(rng: &mut Pcg32) -> f32 {
    if rng.random_bool(0.5) { -1.0 } else { 1.0 }
}

fn roll_percent(rng: &mut Pcg32) -> u32 {
    rng.random_range(1..=100)
}

fn roll_permille(rng: &mut Pcg32) -> u32 {
    rng.random_range(1..=1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::RecordingWorld;
    use rand::SeedableRng;

    fn setup(seed: u64) -> (Tuning, Pcg32, SpawnLedger, RecordingWorld) {
        (
            Tuning::default(),
            Pcg32::seed_from_u64(seed),
            SpawnLedger::new(),
            RecordingWorld::new(),
        )
    }

    fn ctx<'a>(
        tuning: &'a Tuning,
        params: &'a ParameterVector,
        elapsed_ms: f64,
        camera_top: f32,
    ) -> SpawnContext<'a> {
        SpawnContext {
            tuning,
            params,
            elapsed_ms,
            camera_top,
            hat_active: false,
            tick: 1,
        }
    }

    #[test]
    fn test_platform_kind_cumulative() {
        let params = ParameterVector::from_factor(0.0);
        assert_eq!(scaled_platform_kind(&params, 0.05), PlatformKind::Breaking);
        assert_eq!(scaled_platform_kind(&params, 0.15), PlatformKind::Moving);
        assert_eq!(scaled_platform_kind(&params, 0.20), PlatformKind::Spring);
        assert_eq!(scaled_platform_kind(&params, 0.25), PlatformKind::Normal);
        assert_eq!(scaled_platform_kind(&params, 0.99), PlatformKind::Normal);

        let hard = ParameterVector::from_factor(1.0);
        assert_eq!(scaled_platform_kind(&hard, 0.55), PlatformKind::Breaking);
        assert_eq!(scaled_platform_kind(&hard, 0.80), PlatformKind::Moving);
    }

    #[test]
    fn test_coin_draw() {
        assert_eq!(pick_coin_kind(5.0, 20.0, 5), Some(CoinKind::Rare));
        assert_eq!(pick_coin_kind(5.0, 20.0, 6), Some(CoinKind::Common));
        assert_eq!(pick_coin_kind(5.0, 20.0, 25), Some(CoinKind::Common));
        assert_eq!(pick_coin_kind(5.0, 20.0, 26), None);
        // Hat multiplier widens both bands
        assert_eq!(pick_coin_kind(7.5, 30.0, 37), Some(CoinKind::Common));
    }

    #[test]
    fn test_no_boss_or_bouncer_early() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..500 {
            let kind = pick_enemy_kind(0.2, &tuning, &mut rng);
            assert!(matches!(kind, EnemyKind::Flyer | EnemyKind::Patrol));
        }
    }

    #[test]
    fn test_boss_is_rarest_late() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut counts = [0u32; 4];
        for _ in 0..4000 {
            let idx = match pick_enemy_kind(1.0, &tuning, &mut rng) {
                EnemyKind::Flyer => 0,
                EnemyKind::Patrol => 1,
                EnemyKind::Bouncer => 2,
                EnemyKind::Boss => 3,
            };
            counts[idx] += 1;
        }
        assert!(counts[3] > 0);
        assert!(counts[3] < counts[0]);
        assert!(counts[3] < counts[1]);
    }

    #[test]
    fn test_seed_initial_layout() {
        let (tuning, mut rng, mut ledger, mut world) = setup(1);
        let mut director = Director::new(0.0);
        let placed = director.seed_initial(&tuning, &mut rng, &mut ledger, &mut world);

        assert_eq!(placed.len(), 6);
        assert_eq!(placed[0].kind, EntityKind::Platform(PlatformKind::Normal));
        assert_eq!(placed[0].pos, Vec2::new(240.0, 750.0));
        assert_eq!(director.frontier_y, 750.0 - 5.0 * 80.0);
        assert_eq!(world.spawns().count(), 6);
    }

    #[test]
    fn test_not_needed_when_frontier_ahead() {
        let (tuning, mut rng, mut ledger, mut world) = setup(2);
        let params = ParameterVector::default();
        let mut director = Director::new(-500.0);
        let result = director.generate(
            &ctx(&tuning, &params, 0.0, 0.0),
            &mut rng,
            &mut ledger,
            &mut world,
        );
        assert_eq!(result, Generation::NotNeeded);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_no_enemies_during_grace() {
        let (tuning, mut rng, mut ledger, mut world) = setup(3);
        let params = ParameterVector::from_factor(1.0);
        let mut director = Director::new(0.0);
        let mut camera_top = 0.0;
        for _ in 0..300 {
            director.generate(
                &ctx(&tuning, &params, 7_999.0, camera_top),
                &mut rng,
                &mut ledger,
                &mut world,
            );
            camera_top -= 100.0;
        }
        assert!(director.placed_platforms > 100);
        assert!(!ledger.iter().any(|e| matches!(e.kind, EntityKind::Enemy(_))));
    }

    #[test]
    fn test_anchored_enemies_stay_on_platform() {
        let (tuning, mut rng, mut ledger, mut world) = setup(4);
        let params = ParameterVector::from_factor(1.0);
        let mut director = Director::new(0.0);
        let mut camera_top = 0.0;
        let mut anchored = 0;
        for _ in 0..500 {
            let result = director.generate(
                &ctx(&tuning, &params, 200_000.0, camera_top),
                &mut rng,
                &mut ledger,
                &mut world,
            );
            camera_top -= 100.0;
            let Generation::Placed(placement) = result else {
                continue;
            };
            for companion in &placement.companions {
                // Every companion is within reach of its platform
                let dy = placement.platform.pos.y - companion.pos.y;
                assert!((0.0..=crate::tuning::MAX_COMPANION_OFFSET).contains(&dy));

                if let SpawnAttributes::Enemy {
                    anchor: Some(anchor),
                    patrol: Some(bounds),
                    ..
                } = companion.attributes
                {
                    anchored += 1;
                    assert_eq!(anchor, placement.platform.id);
                    assert!(bounds.contains(placement.platform.pos.x));
                    let half = crate::consts::PLATFORM_WIDTH / 2.0;
                    assert!(bounds.left >= placement.platform.pos.x - half);
                    assert!(bounds.right <= placement.platform.pos.x + half);
                }
            }
        }
        assert!(anchored > 0);
    }

    #[test]
    fn test_crowded_band_is_skipped() {
        let (tuning, mut rng, mut ledger, mut world) = setup(5);
        assert_eq!(tuning.placement_attempts, 10);
        // A wall of platforms on every row the ten attempts can land on
        for row in 1..=10 {
            for i in 0..20 {
                ledger.insert(
                    EntityKind::Platform(PlatformKind::Normal),
                    Vec2::new(80.0 + i as f32 * 17.0, -80.0 * row as f32),
                    0,
                );
            }
        }
        let before = ledger.len();
        let params = ParameterVector::default();
        let mut director = Director::new(0.0);
        let result = director.generate(
            &ctx(&tuning, &params, 0.0, 0.0),
            &mut rng,
            &mut ledger,
            &mut world,
        );

        assert_eq!(result, Generation::Skipped { attempts: 10 });
        assert_eq!(ledger.len(), before);
        assert_eq!(world.spawns().count(), 0);
        assert_eq!(director.frontier_y, -800.0);
        assert_eq!(director.skipped_generations, 1);
        assert!(
            world
                .cues()
                .any(|c| matches!(c, Cue::GenerationSkipped { attempts: 10 }))
        );
    }

    #[test]
    fn test_cleanup_removes_far_below() {
        let (tuning, mut rng, mut ledger, mut world) = setup(6);
        let mut director = Director::new(0.0);
        director.seed_initial(&tuning, &mut rng, &mut ledger, &mut world);
        // Camera far above: everything seeded is more than 300px below it
        let removed = director.cleanup(-2000.0, &tuning, &mut ledger, &mut world);
        assert_eq!(removed.len(), 6);
        assert!(ledger.is_empty());
        assert_eq!(world.removals().count(), 6);
    }
}
