//! Boundary to the host engine
//!
//! The director never renders, plays sounds or runs physics. It tells the
//! host what to spawn and remove, pushes HUD values, and raises cues the host
//! turns into impulses, sprites and sound.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ledger::{EntityId, EntityKind};
use super::powerups::AppearanceMode;

/// Horizontal strip an anchored enemy must stay within
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatrolBounds {
    pub left: f32,
    pub right: f32,
}

impl PatrolBounds {
    pub fn contains(&self, x: f32) -> bool {
        x >= self.left && x <= self.right
    }
}

/// Per-kind spawn parameters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum SpawnAttributes {
    #[default]
    Plain,
    Platform {
        /// Landings before a normal platform breaks
        max_touches: u8,
        /// Horizontal speed for moving platforms (0 otherwise)
        speed: f32,
        /// Initial direction, -1 or 1
        direction: f32,
    },
    Enemy {
        speed_mul: f32,
        direction: f32,
        /// Platform this enemy lives on
        anchor: Option<EntityId>,
        patrol: Option<PatrolBounds>,
        health: u8,
    },
}

/// Gameplay signals for the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Cue {
    /// Set the player's vertical velocity (negative is up)
    Jump { velocity_y: f32 },
    Thrust { velocity_y: f32 },
    /// Cap the player's vertical velocity at this (coin grabbed mid-thrust)
    CoinBoost { velocity_y: f32 },
    JetpackGranted,
    JetpackDepleted,
    /// Platform is about to break after its next landing
    PlatformWarning { platform: EntityId, active: bool },
    BossHit { boss: EntityId, health: u8 },
    BoostStarted,
    BoostEnded,
    HatOn,
    HatOff,
    /// Start-of-run invincibility is over
    GraceEnded,
    AppearanceChanged(AppearanceMode),
    /// No free spot for the next platform this tick
    GenerationSkipped { attempts: u32 },
    RunEnded,
}

/// HUD values pushed once per tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiSnapshot {
    pub score: u64,
    /// Peak height in units
    pub height: u32,
    pub combo_text: String,
    pub combo: u32,
    pub multiplier: f32,
    pub jetpack_fuel_ratio: f32,
    pub jetpack_visible: bool,
    /// Empty unless the Honey boost is running
    pub boost_status: String,
    /// -1 left, 0 none, 1 right
    pub horizontal: i8,
}

/// The host engine as seen from the director
pub trait World {
    fn spawn_entity(
        &mut self,
        id: EntityId,
        kind: EntityKind,
        pos: Vec2,
        attributes: SpawnAttributes,
    );

    fn remove_entity(&mut self, id: EntityId);

    fn set_ui(&mut self, ui: &UiSnapshot);

    fn notify(&mut self, _cue: Cue) {}
}

/// Everything a director asked of the world, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldCommand {
    Spawn {
        id: EntityId,
        kind: EntityKind,
        pos: Vec2,
        attributes: SpawnAttributes,
    },
    Remove { id: EntityId },
    Ui(UiSnapshot),
    Cue(Cue),
}

/// World that records commands instead of acting on them
#[derive(Debug, Clone, Default)]
pub struct RecordingWorld {
    pub commands: Vec<WorldCommand>,
}

impl RecordingWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand over the recorded commands and start fresh
    pub fn drain(&mut self) -> Vec<WorldCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn spawns(
        &self,
    ) -> impl Iterator<Item = (EntityId, EntityKind, Vec2, SpawnAttributes)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            WorldCommand::Spawn {
                id,
                kind,
                pos,
                attributes,
            } => Some((*id, *kind, *pos, *attributes)),
            _ => None,
        })
    }

    pub fn removals(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.commands.iter().filter_map(|c| match c {
            WorldCommand::Remove { id } => Some(*id),
            _ => None,
        })
    }

    pub fn cues(&self) -> impl Iterator<Item = Cue> + '_ {
        self.commands.iter().filter_map(|c| match c {
            WorldCommand::Cue(cue) => Some(*cue),
            _ => None,
        })
    }

    pub fn last_ui(&self) -> Option<&UiSnapshot> {
        self.commands.iter().rev().find_map(|c| match c {
            WorldCommand::Ui(ui) => Some(ui),
            _ => None,
        })
    }
}

impl World for RecordingWorld {
    fn spawn_entity(
        &mut self,
        id: EntityId,
        kind: EntityKind,
        pos: Vec2,
        attributes: SpawnAttributes,
    ) {
        self.commands.push(WorldCommand::Spawn {
            id,
            kind,
            pos,
            attributes,
        });
    }

    fn remove_entity(&mut self, id: EntityId) {
        self.commands.push(WorldCommand::Remove { id });
    }

    fn set_ui(&mut self, ui: &UiSnapshot) {
        self.commands.push(WorldCommand::Ui(ui.clone()));
    }

    fn notify(&mut self, cue: Cue) {
        self.commands.push(WorldCommand::Cue(cue));
    }
}
