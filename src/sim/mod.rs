//! Deterministic director simulation
//!
//! All run logic lives here. This module must be pure and deterministic:
//! - Host-supplied clock only, sanitized to be monotonic
//! - Seeded RNG only
//! - Stable iteration order (ledger placement order, ids in `BTreeMap`s)
//! - No rendering, audio or physics; the host is reached through `World`

pub mod difficulty;
pub mod director;
pub mod ledger;
pub mod powerups;
pub mod schedule;
pub mod score;
pub mod state;
pub mod tick;
pub mod world;

pub use difficulty::{DifficultyModel, ParameterVector};
pub use director::{Director, Generation, Placement, SpawnContext, Spawned};
pub use ledger::{CoinKind, EnemyKind, EntityId, EntityKind, PlatformKind, PowerupKind, SpawnLedger};
pub use powerups::{AppearanceMode, Combo, Jetpack, JetpackState, PlayerPowerState, Pose};
pub use schedule::{DeferredAction, DeferredQueue};
pub use score::Score;
pub use state::{RunPhase, RunState, RunSummary};
pub use tick::{TickInput, TriggerEvent, tick};
pub use world::{Cue, RecordingWorld, SpawnAttributes, UiSnapshot, World, WorldCommand};
