//! # stranded-llm — dialogue generation for camp NPCs
//!
//! Turns an NPC's memory state plus the player's latest action into a
//! bounded natural-language prompt, sends it to a remote chat-completions
//! endpoint, and post-processes the reply into a single spoken line.
//!
//! Design rules:
//!   - One request per interaction, hard timeout, never retried.
//!   - A missing API key fails fast and synchronously — no network attempt.
//!   - Unknown response shapes degrade to the raw body rather than failing,
//!     so the player always sees *something*.
//!   - Every error is recoverable: callers fall back to rule-based lines.
//!
//! This crate knows nothing about the memory store; the game layer hands
//! it a pre-extracted [`prompt::PromptContext`].

pub mod client;
pub mod error;
pub mod prompt;
pub mod types;

pub use client::{GenerationClient, GenerationConfig};
pub use error::LlmError;
pub use prompt::PromptContext;
