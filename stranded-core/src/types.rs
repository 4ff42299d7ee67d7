//! Core type definitions for the NPC memory layer.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Maximum length of a fact value, enforced at construction.
pub const MAX_FACT_VALUE_LEN: usize = 120;

/// Current wall-clock time as unix milliseconds.
///
/// All fact and interaction timestamps use this clock so that records
/// round-trip through the save blob without precision loss.
#[must_use]
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// A single piece of knowledge attached to one NPC.
///
/// Identity is `key` within one NPC's fact set: re-adding a known key
/// overwrites the value and timestamp and can only ever raise importance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryFact {
    /// Stable lookup key, e.g. `"saw_bandit"` or `"helped_repair"`.
    pub key: String,
    /// Short human-readable description, at most 120 chars.
    pub value: String,
    /// Unix-ms timestamp of the last write.
    pub ts: i64,
    /// Pruning preference, 0 (drop first) to 10 (keep).
    pub importance: u8,
}

impl MemoryFact {
    /// Create a fact stamped with the current time.
    ///
    /// The value is truncated to [`MAX_FACT_VALUE_LEN`] characters and the
    /// importance clamped to `0..=10`.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>, importance: u8) -> Self {
        let value: String = value.into();
        let value = if value.chars().count() > MAX_FACT_VALUE_LEN {
            value.chars().take(MAX_FACT_VALUE_LEN).collect()
        } else {
            value
        };
        Self {
            key: key.into(),
            value,
            ts: now_ms(),
            importance: importance.min(10),
        }
    }

    /// Same as [`MemoryFact::new`] but with an explicit timestamp.
    /// Used by tests and by replays of recorded events.
    #[must_use]
    pub fn with_timestamp(
        key: impl Into<String>,
        value: impl Into<String>,
        importance: u8,
        ts: i64,
    ) -> Self {
        let mut fact = Self::new(key, value, importance);
        fact.ts = ts;
        fact
    }
}
