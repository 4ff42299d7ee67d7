//! JSON-file persistence for the memory store.
//!
//! The entire record set lives in one blob:
//!
//! ```json
//! { "items": [ { "npc_id": "...", ... }, ... ] }
//! ```
//!
//! Saves are best-effort atomic (write to a temp file in the same
//! directory, then rename) and never fatal: a missing or malformed blob
//! loads as an empty store with a warning. The [`Autosaver`] is driven by
//! the host's frame loop and snapshots the store on a fixed interval.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PersistenceConfig;
use crate::error::{CoreError, Result};
use crate::memory::NpcMemory;
use crate::store::MemoryStore;

/// On-disk wrapper around the record list.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ArchiveBlob {
    #[serde(default)]
    items: Vec<NpcMemory>,
}

/// Handle to the save-blob location.
#[derive(Debug, Clone)]
pub struct MemoryArchive {
    path: PathBuf,
}

impl MemoryArchive {
    /// Create an archive handle for the given blob path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to the blob file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record from the blob.
    ///
    /// A missing file is an empty store; malformed content is logged and
    /// also yields an empty store. This never fails — persistence problems
    /// must not take down a session.
    #[must_use]
    pub fn load_all(&self) -> Vec<NpcMemory> {
        if !self.path.exists() {
            return Vec::new();
        }
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read save blob; starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<ArchiveBlob>(&json) {
            Ok(blob) => {
                info!(
                    path = %self.path.display(),
                    records = blob.items.len(),
                    "loaded NPC memories"
                );
                blob.items
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed save blob; starting empty");
                Vec::new()
            }
        }
    }

    /// Serialize the record set to the blob, atomically where the
    /// filesystem allows (temp file + rename).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Serialization`] if JSON encoding fails or
    /// [`CoreError::Io`] on write/rename failure.
    pub fn save_all(&self, records: &[NpcMemory]) -> Result<()> {
        let blob = ArchiveBlob {
            items: records.to_vec(),
        };
        let json = serde_json::to_string_pretty(&blob)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(
            path = %self.path.display(),
            records = records.len(),
            bytes = json.len(),
            "saved NPC memories"
        );
        Ok(())
    }

    /// Delete the blob if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the file exists but cannot be removed.
    pub fn wipe(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            info!(path = %self.path.display(), "deleted save blob for fresh run");
        }
        Ok(())
    }
}

/// Populate `store` from the archive at startup, honoring
/// `reset_on_start`.
///
/// All failure modes are logged and recovered; the session always starts.
pub fn bootstrap(store: &mut MemoryStore, archive: &MemoryArchive, config: &PersistenceConfig) {
    let records = archive.load_all();

    if config.reset_on_start {
        if let Err(e) = archive.wipe() {
            warn!(error = %e, "failed to delete save blob on reset");
        }
        store.clear();
        info!("memory store reset for fresh session");
        return;
    }

    store.insert_records(records);
}

/// Frame-driven autosave timer.
///
/// The host calls [`Autosaver::tick`] once per frame with the frame delta;
/// every `interval` of accumulated time the store is snapshotted and
/// written out. Save failures are logged and the timer keeps running.
#[derive(Debug)]
pub struct Autosaver {
    interval: Duration,
    elapsed: Duration,
    enabled: bool,
}

impl Autosaver {
    /// Create an autosaver from the persistence config.
    #[must_use]
    pub fn new(config: &PersistenceConfig) -> Self {
        Self {
            interval: Duration::from_secs_f32(config.autosave_interval_secs.max(0.1)),
            elapsed: Duration::ZERO,
            enabled: config.autosave,
        }
    }

    /// Advance the timer; saves when the interval has elapsed.
    pub fn tick(&mut self, dt: Duration, store: &MemoryStore, archive: &MemoryArchive) {
        if !self.enabled {
            return;
        }
        self.elapsed += dt;
        if self.elapsed < self.interval {
            return;
        }
        self.elapsed = Duration::ZERO;
        self.save_now(store, archive);
    }

    /// Snapshot and save immediately (shutdown / story-beat path).
    pub fn save_now(&self, store: &MemoryStore, archive: &MemoryArchive) {
        // Copy-then-serialize: the snapshot is taken before any encoding so
        // a host that moves the write off-thread still sees consistent data.
        let snapshot = store.all_records();
        if let Err(e) = archive.save_all(&snapshot) {
            warn!(error = %e, "autosave failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::types::MemoryFact;

    fn populated_store() -> MemoryStore {
        let mut store = MemoryStore::new(StoreConfig::default());
        store.get_or_create_with("merchant_01", "gruff but fair", "runs the cart");
        store.add_fact("merchant_01", MemoryFact::new("saw_bandit", "spotted someone", 9));
        store.adjust_relationship("merchant_01", 2);
        store.add_convo_line("merchant_01", "Player: hello");
        store.get_or_create("mercenary_01");
        store
    }

    #[test]
    fn round_trip_preserves_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = MemoryArchive::new(dir.path().join("npc_memories.json"));
        let store = populated_store();

        archive.save_all(&store.all_records()).expect("save");
        let loaded = archive.load_all();

        assert_eq!(loaded.len(), 2);
        let merchant = loaded
            .iter()
            .find(|m| m.npc_id == "merchant_01")
            .expect("merchant");
        assert_eq!(merchant.persona_line, "gruff but fair");
        assert_eq!(merchant.relationship, 2);
        assert_eq!(merchant.known_facts.len(), 1);
        assert_eq!(merchant.known_facts[0].key, "saw_bandit");
        assert_eq!(merchant.convo_log.len(), 1);
    }

    #[test]
    fn empty_round_trip_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = MemoryArchive::new(dir.path().join("npc_memories.json"));
        archive.save_all(&[]).expect("save");
        assert!(archive.load_all().is_empty());
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = MemoryArchive::new(dir.path().join("nonexistent.json"));
        assert!(archive.load_all().is_empty());
    }

    #[test]
    fn malformed_blob_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("npc_memories.json");
        std::fs::write(&path, "{ this is not json").expect("write");
        let archive = MemoryArchive::new(path);
        assert!(archive.load_all().is_empty());
    }

    #[test]
    fn bootstrap_reset_on_start_wipes_blob() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("npc_memories.json");
        let archive = MemoryArchive::new(&path);
        archive
            .save_all(&populated_store().all_records())
            .expect("save");

        let config = PersistenceConfig {
            reset_on_start: true,
            ..PersistenceConfig::default()
        };
        let mut store = MemoryStore::new(StoreConfig::default());
        bootstrap(&mut store, &archive, &config);

        assert!(store.is_empty());
        assert!(!path.exists(), "blob deleted for fresh run");
    }

    #[test]
    fn bootstrap_without_reset_loads_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = MemoryArchive::new(dir.path().join("npc_memories.json"));
        archive
            .save_all(&populated_store().all_records())
            .expect("save");

        let config = PersistenceConfig {
            reset_on_start: false,
            ..PersistenceConfig::default()
        };
        let mut store = MemoryStore::new(StoreConfig::default());
        bootstrap(&mut store, &archive, &config);

        assert_eq!(store.len(), 2);
        assert!(store.get("merchant_01").is_some());
    }

    #[test]
    fn autosaver_fires_after_interval() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("npc_memories.json");
        let archive = MemoryArchive::new(&path);
        let store = populated_store();

        let config = PersistenceConfig {
            autosave_interval_secs: 1.0,
            ..PersistenceConfig::default()
        };
        let mut saver = Autosaver::new(&config);

        saver.tick(Duration::from_millis(400), &store, &archive);
        assert!(!path.exists(), "not yet due");

        saver.tick(Duration::from_millis(700), &store, &archive);
        assert!(path.exists(), "interval elapsed, blob written");
    }

    #[test]
    fn disabled_autosaver_never_saves() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("npc_memories.json");
        let archive = MemoryArchive::new(&path);
        let store = populated_store();

        let config = PersistenceConfig {
            autosave: false,
            ..PersistenceConfig::default()
        };
        let mut saver = Autosaver::new(&config);
        saver.tick(Duration::from_secs(60), &store, &archive);
        assert!(!path.exists());
    }
}
