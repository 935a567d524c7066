//! Fire-once deferred effects keyed by target entity
//!
//! Effects are due at an absolute run time. Targets are checked for liveness
//! when the effect fires, so an entity removed in the meantime simply drops
//! its pending effects.

use serde::{Deserialize, Serialize};

use super::ledger::EntityId;

/// What happens when a deferred effect fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeferredAction {
    /// Platform crumbles and is removed
    BreakPlatform,
    /// Low-durability warning tint ends
    ClearWarning,
    /// Boss can be hurt again
    EndBossFlash,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deferred {
    pub due_ms: f64,
    pub target: EntityId,
    pub action: DeferredAction,
    seq: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DeferredQueue {
    pending: Vec<Deferred>,
    next_seq: u64,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: f64, target: EntityId, action: DeferredAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Deferred {
            due_ms,
            target,
            action,
            seq,
        });
    }

    /// Pop every effect due at `now_ms`, oldest first, skipping dead targets
    pub fn fire_due(&mut self, now_ms: f64, is_live: impl Fn(EntityId) -> bool) -> Vec<Deferred> {
        let (mut due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|d| d.due_ms <= now_ms);
        self.pending = waiting;
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.seq.cmp(&b.seq)));
        due.retain(|d| is_live(d.target));
        due
    }

    pub fn cancel_target(&mut self, target: EntityId) {
        self.pending.retain(|d| d.target != target);
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
