//! Translation of game occurrences into fact-store mutations.
//!
//! Each recording function is small and explicit about its guard: the
//! bandit-witness broadcast is latched to fire once per encounter, the
//! pin-transfer pair is *not* mutually guarded — callers invoke each
//! exactly once per transfer.

use stranded_core::{MemoryFact, MemoryStore};
use tracing::{debug, warn};

/// A broadcast event every NPC should hear about.
#[derive(Debug, Clone)]
pub enum GlobalEvent {
    /// The carriage repair advanced to a new stage.
    RepairProgress(u32),
    /// The weather changed.
    Weather(String),
}

/// Fan a global event out as a low-importance fact on every known NPC.
pub fn apply_global_event(store: &mut MemoryStore, event: &GlobalEvent) {
    match event {
        GlobalEvent::RepairProgress(stage) => {
            for id in store.npc_ids() {
                store.add_fact(
                    &id,
                    MemoryFact::new("helped_repair", format!("repair_stage:{stage}"), 3),
                );
            }
        }
        GlobalEvent::Weather(weather) => {
            for id in store.npc_ids() {
                store.add_fact(&id, MemoryFact::new("weather", weather.clone(), 1));
            }
        }
    }
}

/// Records story-beat events into the fact store.
#[derive(Debug, Default)]
pub struct EventRecorder {
    bandit_witnesses_recorded: bool,
}

impl EventRecorder {
    /// Create a recorder with all latches clear.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every NPC saw the bandit: `saw_bandit` fact (importance 9) and a
    /// small relationship bump. Latched — only the first call per
    /// encounter records anything. Returns whether it fired.
    pub fn record_bandit_witnesses(&mut self, store: &mut MemoryStore) -> bool {
        if self.bandit_witnesses_recorded {
            return false;
        }
        self.bandit_witnesses_recorded = true;

        if store.is_empty() {
            warn!("no NPCs registered; bandit witnesses not recorded");
        }
        for id in store.npc_ids() {
            store.add_fact(&id, MemoryFact::new("saw_bandit", "player_defeated_bandit", 9));
            store.adjust_relationship(&id, 1);
            debug!(npc = %id, "recorded saw_bandit fact");
        }
        true
    }

    /// The player took the axle pin from `npc_id` (combat loot path).
    pub fn record_axle_pin_taken(&self, store: &mut MemoryStore, npc_id: &str) {
        if npc_id.is_empty() {
            return;
        }
        store.add_fact(npc_id, MemoryFact::new("has_axle_pin", "false", 9));
        store.add_fact(npc_id, MemoryFact::new("gave_axle_pin", "player_took_axle_pin", 9));
        store.adjust_relationship(npc_id, -1);
    }

    /// The player handed the axle pin to `npc_id`.
    pub fn record_axle_pin_given(&self, store: &mut MemoryStore, npc_id: &str) {
        if npc_id.is_empty() {
            return;
        }
        store.add_fact(npc_id, MemoryFact::new("gave_axle_pin", "player_gave_axle_pin", 9));
        store.add_fact(npc_id, MemoryFact::new("has_axle_pin", "true", 9));
        store.adjust_relationship(npc_id, 2);
    }

    /// The carriage is fixed: every NPC learns it, and the story beat
    /// forgets accumulated annoyance by resetting interaction counters.
    pub fn record_carriage_repaired(&self, store: &mut MemoryStore) {
        for id in store.npc_ids() {
            store.add_fact(
                &id,
                MemoryFact::new("carriage_repaired", "player_repaired_carriage", 9),
            );
            debug!(npc = %id, "recorded carriage_repaired fact");
        }
        store.reset_all_interaction_counters();
    }
}
