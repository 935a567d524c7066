//! Placed-entity ledger
//!
//! Records every live spawn (kind, spawn position, creation tick) in placement
//! order. Entries are append/remove only. Ids carry a generation so a slot
//! reused after a removal never answers for the entity that used to own it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Platform variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlatformKind {
    #[default]
    Normal,
    /// Breaks shortly after the first landing
    Breaking,
    /// Slides side to side
    Moving,
    /// Launches the player higher
    Spring,
}

/// Enemy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Free-flying, crosses the whole playfield
    Flyer,
    /// Walks back and forth on its platform
    Patrol,
    /// Hops on its platform
    Bouncer,
    /// Erratic flyer that shoots and takes several stomps
    Boss,
}

impl EnemyKind {
    /// Whether this enemy is confined to its anchor platform
    pub fn is_anchored(&self) -> bool {
        matches!(self, EnemyKind::Patrol | EnemyKind::Bouncer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinKind {
    Common,
    /// Also grants the Honey boost
    Rare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    Jetpack,
    JesterHat,
}

/// Anything the director can place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Platform(PlatformKind),
    Enemy(EnemyKind),
    Coin(CoinKind),
    Powerup(PowerupKind),
}

impl EntityKind {
    pub fn is_platform(&self) -> bool {
        matches!(self, EntityKind::Platform(_))
    }
}

/// Generation-checked handle to a ledger slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

/// A placed entity as it was spawned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub created_tick: u64,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    live: bool,
}

/// Ordered record of live spawns
#[derive(Debug, Clone, Default)]
pub struct SpawnLedger {
    slots: Vec<Slot>,
    free: Vec<u32>,
    entries: Vec<LedgerEntry>,
}

impl SpawnLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new spawn and hand out its id
    pub fn insert(&mut self, kind: EntityKind, pos: Vec2, created_tick: u64) -> EntityId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.live = true;
        let id = EntityId {
            index,
            generation: slot.generation,
        };
        self.entries.push(LedgerEntry {
            id,
            kind,
            pos,
            created_tick,
        });
        id
    }

    /// Whether `id` still refers to a live entry
    pub fn is_live(&self, id: EntityId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.live && slot.generation == id.generation)
    }

    pub fn get(&self, id: EntityId) -> Option<&LedgerEntry> {
        if !self.is_live(id) {
            return None;
        }
        self.entries.iter().find(|e| e.id == id)
    }

    /// Remove an entry; stale ids are ignored
    pub fn remove(&mut self, id: EntityId) -> Option<LedgerEntry> {
        if !self.is_live(id) {
            return None;
        }
        let pos = self.entries.iter().position(|e| e.id == id)?;
        let entry = self.entries.remove(pos);
        self.release(id);
        Some(entry)
    }

    /// Remove every entry spawned below `y_limit` (screen y grows downward)
    pub fn remove_below(&mut self, y_limit: f32) -> Vec<LedgerEntry> {
        let (gone, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.pos.y > y_limit);
        self.entries = kept;
        for entry in &gone {
            self.release(entry.id);
        }
        gone
    }

    fn release(&mut self, id: EntityId) {
        let slot = &mut self.slots[id.index as usize];
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
    }

    /// Whether any matching entry lies strictly closer than `distance` to `pos`
    pub fn any_within(
        &self,
        pos: Vec2,
        distance: f32,
        filter: impl Fn(&EntityKind) -> bool,
    ) -> bool {
        self.entries
            .iter()
            .filter(|e| filter(&e.kind))
            .any(|e| e.pos.distance(pos) < distance)
    }

    /// Live entries in placement order
    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }

    pub fn platforms(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().filter(|e| e.kind.is_platform())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
