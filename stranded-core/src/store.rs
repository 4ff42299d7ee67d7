//! The fact store — owns every [`NpcMemory`] record.
//!
//! All mutation goes through the accessor methods here; each mutator
//! recomputes the record's derived `short_summary` before returning, so a
//! record read between operations is always internally consistent.
//!
//! Mutators are tolerant of unknown ids and auto-create a record
//! (`remove_npc` and the pure queries are no-ops / empty on a miss).

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::Utc;
use tracing::debug;

use crate::config::StoreConfig;
use crate::memory::NpcMemory;
use crate::types::{MemoryFact, now_ms};

/// Truncate `s` to at most `max` characters, replacing the tail with `...`
/// when anything was cut. Char-based, so multibyte text is safe.
#[must_use]
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let keep = max.saturating_sub(3);
        let mut out: String = s.chars().take(keep).collect();
        out.push_str("...");
        out
    }
}

/// In-memory store of every NPC's memory record.
#[derive(Debug, Default)]
pub struct MemoryStore {
    limits: StoreConfig,
    records: HashMap<String, NpcMemory>,
}

impl MemoryStore {
    /// Create an empty store with the given limits.
    #[must_use]
    pub fn new(limits: StoreConfig) -> Self {
        Self {
            limits,
            records: HashMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Fetch or lazily create the record for `npc_id`.
    ///
    /// An empty id gets a synthesized UUID (the returned record's `npc_id`
    /// carries it).
    pub fn get_or_create(&mut self, npc_id: &str) -> &mut NpcMemory {
        self.get_or_create_with(npc_id, "", "")
    }

    /// Like [`MemoryStore::get_or_create`], registering persona and role
    /// flavor text. First write wins: an existing record only takes the
    /// persona/role if its own field is still empty.
    pub fn get_or_create_with(
        &mut self,
        npc_id: &str,
        persona: &str,
        role: &str,
    ) -> &mut NpcMemory {
        let key = if npc_id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            npc_id.to_string()
        };

        let mem = self
            .records
            .entry(key.clone())
            .or_insert_with(|| NpcMemory::new(&key, persona, role));

        if !persona.is_empty() && mem.persona_line.is_empty() {
            mem.persona_line = persona.to_string();
        }
        if !role.is_empty() && mem.role_line.is_empty() {
            mem.role_line = role.to_string();
        }
        mem
    }

    /// Fetch a record without creating it.
    #[must_use]
    pub fn get(&self, npc_id: &str) -> Option<&NpcMemory> {
        self.records.get(npc_id)
    }

    /// All known NPC ids.
    #[must_use]
    pub fn npc_ids(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    /// Cloned snapshot of every record, for persistence.
    #[must_use]
    pub fn all_records(&self) -> Vec<NpcMemory> {
        self.records.values().cloned().collect()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace the store contents with loaded records (startup path).
    pub fn insert_records(&mut self, records: Vec<NpcMemory>) {
        self.records = records.into_iter().map(|m| (m.npc_id.clone(), m)).collect();
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    // ------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------

    /// Upsert a fact by key.
    ///
    /// A known key keeps a single entry: value and timestamp come from the
    /// new fact, importance is the max ever supplied. Insertion beyond the
    /// per-NPC bound evicts the least `(importance, ts)`-ranked facts.
    /// Empty keys are ignored.
    pub fn add_fact(&mut self, npc_id: &str, fact: MemoryFact) {
        if fact.key.is_empty() {
            return;
        }
        let limits = self.limits;
        let mem = self.get_or_create(npc_id);

        if let Some(existing) = mem.known_facts.iter_mut().find(|f| f.key == fact.key) {
            existing.value = fact.value;
            existing.ts = now_ms();
            existing.importance = existing.importance.max(fact.importance);
        } else {
            mem.known_facts.insert(0, fact); // newest first
        }

        if mem.known_facts.len() > limits.max_facts_per_npc {
            Self::prune_facts(&limits, mem);
        }

        mem.last_interaction_ts = now_ms();
        Self::update_short_summary(&limits, mem);
    }

    /// Prepend a timestamp-tagged line to the conversation ring.
    pub fn add_convo_line(&mut self, npc_id: &str, line: &str) {
        if line.is_empty() {
            return;
        }
        let limits = self.limits;
        let mem = self.get_or_create(npc_id);
        let stamp = Utc::now().format("%H:%M");
        mem.convo_log.insert(0, format!("{stamp} {line}"));
        mem.convo_log.truncate(limits.max_convo_log);
        mem.last_interaction_ts = now_ms();
    }

    /// Additive relationship update, clamped at the `-5..=5` boundary.
    pub fn adjust_relationship(&mut self, npc_id: &str, delta: i32) {
        let limits = self.limits;
        let mem = self.get_or_create(npc_id);
        mem.relationship = (mem.relationship + delta).clamp(-5, 5);
        Self::update_short_summary(&limits, mem);
    }

    /// Set the short role-state label (`idle`, `guarding`, ...).
    pub fn set_role_state(&mut self, npc_id: &str, role_state: &str) {
        let limits = self.limits;
        let mem = self.get_or_create(npc_id);
        if !role_state.is_empty() {
            mem.role_state = role_state.to_string();
        }
        Self::update_short_summary(&limits, mem);
    }

    /// Set the NPC's goal, bounded to 120 chars. Empty input keeps the
    /// current goal.
    pub fn set_goal(&mut self, npc_id: &str, goal: &str) {
        let limits = self.limits;
        let mem = self.get_or_create(npc_id);
        if !goal.is_empty() {
            mem.goal = if goal.chars().count() > 120 {
                goal.chars().take(120).collect()
            } else {
                goal.to_string()
            };
        }
        Self::update_short_summary(&limits, mem);
    }

    /// Directly set the persona line (persona-entry screen path). Unlike
    /// [`MemoryStore::get_or_create_with`] this overwrites.
    pub fn set_persona_line(&mut self, npc_id: &str, persona: &str) {
        let limits = self.limits;
        let mem = self.get_or_create(npc_id);
        mem.persona_line = persona.to_string();
        Self::update_short_summary(&limits, mem);
    }

    /// Count one direct player interaction; returns the new consecutive
    /// count for this NPC.
    pub fn record_interaction(&mut self, npc_id: &str) -> u32 {
        let mem = self.get_or_create(npc_id);
        mem.consecutive_interactions += 1;
        mem.last_interaction_ts = now_ms();
        mem.consecutive_interactions
    }

    /// Zero every NPC's consecutive-interaction counter. Called when a
    /// major story beat should forget accumulated annoyance.
    pub fn reset_all_interaction_counters(&mut self) {
        for mem in self.records.values_mut() {
            mem.consecutive_interactions = 0;
        }
        debug!("all NPC interaction counters reset");
    }

    /// Delete a record entirely. No-op on a miss.
    pub fn remove_npc(&mut self, npc_id: &str) {
        self.records.remove(npc_id);
    }

    // ------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------

    /// Bounded multi-line rendering of one NPC's identity, relationship,
    /// top fact, and summary — used verbatim inside generation prompts.
    /// Empty string for unknown ids.
    #[must_use]
    pub fn prompt_snippet(&self, npc_id: &str) -> String {
        let Some(mem) = self.records.get(npc_id) else {
            return String::new();
        };
        let mut out = String::new();
        out.push_str(&format!(
            "NPC:{} | {}\n",
            mem.npc_id,
            truncate(&mem.persona_line, 80)
        ));
        out.push_str(&format!(
            "Relationship:{} Role:{} Goal:{}\n",
            mem.relationship,
            truncate(&mem.role_state, 20),
            truncate(&mem.goal, 60)
        ));
        if let Some(top) = mem.known_facts.first() {
            out.push_str(&format!("TopFact: {}\n", truncate(&top.value, 120)));
        }
        out.push_str(&format!(
            "Summary:{}\n",
            truncate(&mem.short_summary, self.limits.max_summary_len)
        ));
        out
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Re-rank by `(importance desc, ts desc)` and keep the top N.
    fn prune_facts(limits: &StoreConfig, mem: &mut NpcMemory) {
        mem.known_facts
            .sort_by(|a, b| match b.importance.cmp(&a.importance) {
                Ordering::Equal => b.ts.cmp(&a.ts),
                other => other,
            });
        mem.known_facts.truncate(limits.max_facts_per_npc);
    }

    /// Recompute the derived one-liner from the record's other fields.
    fn update_short_summary(limits: &StoreConfig, mem: &mut NpcMemory) {
        let mut parts: Vec<String> = Vec::new();
        if !mem.persona_line.trim().is_empty() {
            parts.push(truncate(&mem.persona_line, 40));
        }
        let rel = match mem.relationship.cmp(&0) {
            Ordering::Greater => format!("rel:+{}", mem.relationship),
            Ordering::Less => format!("rel:{}", mem.relationship),
            Ordering::Equal => "rel:0".to_string(),
        };
        parts.push(rel);
        if !mem.role_state.is_empty() {
            parts.push(truncate(&mem.role_state, 16));
        }
        if !mem.goal.is_empty() {
            parts.push(format!("goal:{}", truncate(&mem.goal, 30)));
        }
        if let Some(top) = mem.known_facts.first() {
            parts.push(truncate(&top.value, 40));
        }
        let mut summary = parts.join("; ");
        if summary.chars().count() > limits.max_summary_len {
            summary = summary.chars().take(limits.max_summary_len).collect();
        }
        mem.short_summary = summary;
    }
}
