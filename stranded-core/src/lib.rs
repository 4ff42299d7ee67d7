//! # stranded-core
//!
//! Engine-agnostic memory layer for the camp NPCs: every character keeps a
//! small, bounded set of typed facts about what the player did, a clamped
//! relationship score, and a derived one-line summary that feeds dialogue
//! generation.
//!
//! The store is deliberately tiny — a handful of NPCs, at most
//! [`config::StoreConfig::max_facts_per_npc`] facts each — so every
//! operation is a linear scan over bounded data and completes in
//! microseconds on the game thread.
//!
//! Persistence is a single JSON blob on disk, loaded at startup and
//! autosaved on a timer; losing it is never fatal to a session.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod memory;
pub mod persistence;
pub mod store;
pub mod types;

pub use config::StrandedConfig;
pub use error::CoreError;
pub use memory::NpcMemory;
pub use store::MemoryStore;
pub use types::MemoryFact;
