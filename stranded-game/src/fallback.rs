//! Rule-based fallback dialogue.
//!
//! Deterministic replies used whenever AI generation is unavailable or
//! fails. The ladder checks the highest-stakes facts first so the reply
//! always tracks the most important thing the NPC knows.

use stranded_core::NpcMemory;
use stranded_core::store::truncate;

/// Build a deterministic one-line reply from the NPC's memory.
#[must_use]
pub fn reply_from_memory(mem: &NpcMemory, player_action: &str) -> String {
    if mem.has_fact("saw_bandit") {
        return "Stay by the fire. I saw someone in the trees.".to_string();
    }
    if mem.has_fact("gave_axle_pin") {
        return "Thanks for the pin. We'll make do.".to_string();
    }
    if !player_action.is_empty() && player_action.to_lowercase().contains("repair") {
        return if mem.relationship >= 1 {
            "Good work. We're one step closer.".to_string()
        } else {
            "You're fixing it? Well, do it proper.".to_string()
        };
    }
    if mem.relationship <= -3 {
        return "I don't trust you.".to_string();
    }
    if !mem.persona_line.is_empty() {
        return truncate(&mem.persona_line, 80);
    }
    "They nod.".to_string()
}
