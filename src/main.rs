//! Bear Jumpventure headless runner
//!
//! Plays one run with a scripted autopilot standing in for the game engine
//! and prints the run summary as JSON.
//!
//! Usage: `bear-jumpventure [seed] [tuning.json]`

use std::collections::BTreeMap;

use glam::Vec2;

use bear_jumpventure::Tuning;
use bear_jumpventure::consts::{PLATFORM_WIDTH, PLAYFIELD_HEIGHT, TICK_MS};
use bear_jumpventure::sim::{
    Cue, EntityId, EntityKind, RecordingWorld, RunState, RunSummary, TickInput, TriggerEvent,
    WorldCommand, tick,
};

/// Downward acceleration of the stand-in physics (px/s^2)
const GRAVITY: f32 = 1200.0;
const MOVE_SPEED: f32 = 320.0;
/// Contact distance for coins, power-ups and enemies
const TOUCH_RADIUS: f32 = 30.0;
/// Camera keeps the player this far below its top edge
const CAMERA_LEAD: f32 = 320.0;
/// Give up after three minutes of simulated play
const MAX_RUN_MS: f64 = 180_000.0;
const DEFAULT_SEED: u64 = 42;

/// Something the director placed, as the autopilot sees it
#[derive(Debug, Clone, Copy)]
struct Body {
    kind: EntityKind,
    pos: Vec2,
}

/// Minimal host: point-mass physics, greedy steering toward the next platform
#[derive(Debug)]
struct Autopilot {
    pos: Vec2,
    vel: Vec2,
    camera_top: f32,
    playfield_width: f32,
    has_jetpack: bool,
    bodies: BTreeMap<EntityId, Body>,
}

impl Autopilot {
    fn new(start: Vec2, playfield_width: f32) -> Self {
        Self {
            pos: start,
            vel: Vec2::ZERO,
            camera_top: 0.0,
            playfield_width,
            has_jetpack: false,
            bodies: BTreeMap::new(),
        }
    }

    /// React to everything the director asked for since the last frame
    fn apply(&mut self, commands: Vec<WorldCommand>) {
        for command in commands {
            match command {
                WorldCommand::Spawn { id, kind, pos, .. } => {
                    self.bodies.insert(id, Body { kind, pos });
                }
                WorldCommand::Remove { id } => {
                    self.bodies.remove(&id);
                }
                WorldCommand::Cue(cue) => self.apply_cue(cue),
                WorldCommand::Ui(_) => {}
            }
        }
    }

    fn apply_cue(&mut self, cue: Cue) {
        match cue {
            Cue::Jump { velocity_y } => self.vel.y = velocity_y,
            Cue::Thrust { velocity_y } | Cue::CoinBoost { velocity_y } => {
                self.vel.y = self.vel.y.min(velocity_y);
            }
            Cue::JetpackGranted => self.has_jetpack = true,
            Cue::JetpackDepleted => self.has_jetpack = false,
            _ => {}
        }
    }

    /// Closest platform in reach: above while rising, below while falling
    fn target_platform(&self) -> Option<Vec2> {
        let rising = self.vel.y < 0.0;
        let y = self.pos.y;
        self.bodies
            .values()
            .filter(|b| b.kind.is_platform())
            .filter(|b| {
                if rising {
                    b.pos.y < y - 10.0 && b.pos.y > y - 140.0
                } else {
                    b.pos.y >= y && b.pos.y < y + 200.0
                }
            })
            .map(|b| b.pos)
            .min_by(|a, b| a.distance(self.pos).total_cmp(&b.distance(self.pos)))
    }

    /// Move for one frame and report what the bear touched
    fn step(&mut self, elapsed_ms: f64, dt: f32) -> (TickInput, Vec<TriggerEvent>) {
        let steer = match self.target_platform() {
            Some(target) if (target.x - self.pos.x).abs() > 8.0 => (target.x - self.pos.x).signum(),
            _ => 0.0,
        };
        self.vel.x = steer * MOVE_SPEED;

        let previous = self.pos;
        self.vel.y += GRAVITY * dt;
        self.pos += self.vel * dt;
        self.pos.x = self.pos.x.clamp(0.0, self.playfield_width);

        let mut events = Vec::new();
        let falling = self.vel.y > 0.0;
        if falling {
            let landed = self.bodies.iter().find(|(_, b)| {
                b.kind.is_platform()
                    && previous.y <= b.pos.y
                    && self.pos.y >= b.pos.y
                    && (self.pos.x - b.pos.x).abs() <= PLATFORM_WIDTH / 2.0
            });
            if let Some((&platform, body)) = landed {
                self.pos.y = body.pos.y;
                events.push(TriggerEvent::LandedOnPlatform { platform });
            }
        }

        for (&id, body) in &self.bodies {
            if body.pos.distance(self.pos) > TOUCH_RADIUS {
                continue;
            }
            match body.kind {
                EntityKind::Coin(_) => events.push(TriggerEvent::CoinCollected { coin: id }),
                EntityKind::Powerup(_) => {
                    events.push(TriggerEvent::PowerupCollected { powerup: id })
                }
                EntityKind::Enemy(_) if falling => {
                    events.push(TriggerEvent::EnemyStomped { enemy: id })
                }
                EntityKind::Enemy(_) => events.push(TriggerEvent::EnemyContact { enemy: id }),
                EntityKind::Platform(_) => {}
            }
        }

        self.camera_top = self.camera_top.min(self.pos.y - CAMERA_LEAD);
        let input = TickInput {
            elapsed_ms,
            moving_left: steer < 0.0,
            moving_right: steer > 0.0,
            // Burn fuel only when a jump runs out of steam
            thrust_held: self.has_jetpack && self.vel.y > -100.0,
            pause: false,
            player_y: self.pos.y,
            player_vy: self.vel.y,
            camera_top: self.camera_top,
            camera_bottom: self.camera_top + PLAYFIELD_HEIGHT,
        };
        (input, events)
    }
}

/// Play one run to the end (or the time limit) and return its summary
fn run_autopilot(seed: u64, tuning: Tuning) -> RunSummary {
    let start = bear_jumpventure::sim::Director::player_start(&tuning);
    let mut pilot = Autopilot::new(start, tuning.playfield_width);
    let mut world = RecordingWorld::new();
    let mut state = RunState::new(seed, tuning, &mut world);
    pilot.apply(world.drain());

    let mut elapsed_ms = 0.0;
    while !state.is_over() && elapsed_ms < MAX_RUN_MS {
        elapsed_ms += TICK_MS;
        let (input, events) = pilot.step(elapsed_ms, (TICK_MS / 1000.0) as f32);
        tick(&mut state, &input, &events, &mut world);
        pilot.apply(world.drain());
    }

    if !state.is_over() {
        log::info!("Time limit reached, ending run");
        tick(
            &mut state,
            &TickInput {
                elapsed_ms,
                ..Default::default()
            },
            &[TriggerEvent::PlayerDied],
            &mut world,
        );
    }

    match state.summary.take() {
        Some(summary) => summary,
        None => state.end_run(&mut world).clone(),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run_cli() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            std::process::ExitCode::from(1)
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run_cli() -> Result<(), String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.first().is_some_and(|a| a == "-h" || a == "--help") {
        println!("usage: bear-jumpventure [seed] [tuning.json]");
        return Ok(());
    }

    let seed = match args.first() {
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| format!("invalid seed '{value}' (expected u64)"))?,
        None => DEFAULT_SEED,
    };
    let tuning = match args.get(1) {
        Some(path) => Tuning::load_or_default(path),
        None => Tuning::default(),
    };

    log::info!("Bear Jumpventure (headless) starting with seed {}", seed);
    let summary = run_autopilot(seed, tuning);
    let json = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start
}
