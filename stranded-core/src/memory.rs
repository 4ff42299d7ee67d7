//! The per-NPC memory record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::MemoryFact;

fn default_role_state() -> String {
    "idle".to_string()
}

/// Everything one NPC remembers.
///
/// One record per NPC id, owned exclusively by
/// [`crate::store::MemoryStore`]; the store's accessors are the only
/// mutation path so that `short_summary` stays a pure function of the
/// other fields.
///
/// All fields default on deserialization so that save blobs written by
/// older builds still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcMemory {
    /// Stable external identifier, e.g. `"merchant_01"`.
    pub npc_id: String,
    /// Static personality flavor, used verbatim in prompts. First write wins.
    #[serde(default)]
    pub persona_line: String,
    /// Static occupation/role flavor. First write wins.
    #[serde(default)]
    pub role_line: String,
    /// Disposition toward the player, clamped to `-5..=5`.
    #[serde(default)]
    pub relationship: i32,
    /// Free-form short state label: idle, busy, guarding, grateful, ...
    #[serde(default = "default_role_state")]
    pub role_state: String,
    /// Current goal, at most 120 chars.
    #[serde(default)]
    pub goal: String,
    /// Derived one-liner, at most 140 chars. Never set directly.
    #[serde(default)]
    pub short_summary: String,
    /// Unix-ms timestamp of the last direct interaction or fact write.
    #[serde(default)]
    pub last_interaction_ts: i64,
    /// How many times in a row the player has talked to this NPC without an
    /// intervening story beat. Drives annoyance tone in prompts.
    #[serde(default)]
    pub consecutive_interactions: u32,
    /// Known facts, newest first, bounded by the store's limit.
    #[serde(default)]
    pub known_facts: Vec<MemoryFact>,
    /// Recent conversation lines, newest first. Debug/context aid only.
    #[serde(default)]
    pub convo_log: Vec<String>,
}

impl NpcMemory {
    /// Create a fresh record. An empty `npc_id` is replaced with a new
    /// UUID so every record has a stable identity.
    #[must_use]
    pub fn new(npc_id: &str, persona: &str, role: &str) -> Self {
        let npc_id = if npc_id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            npc_id.to_string()
        };
        Self {
            npc_id,
            persona_line: persona.to_string(),
            role_line: role.to_string(),
            relationship: 0,
            role_state: default_role_state(),
            goal: String::new(),
            short_summary: String::new(),
            last_interaction_ts: 0,
            consecutive_interactions: 0,
            known_facts: Vec::new(),
            convo_log: Vec::new(),
        }
    }

    /// Whether this NPC knows a fact with the given key.
    #[must_use]
    pub fn has_fact(&self, key: &str) -> bool {
        self.known_facts.iter().any(|f| f.key == key)
    }

    /// The most recently added fact, if any.
    #[must_use]
    pub fn top_fact(&self) -> Option<&MemoryFact> {
        self.known_facts.first()
    }
}
