//! Configuration for the stranded memory system.
//!
//! Maps directly to `stranded.toml`; every field has a serde default so a
//! partial file (or none at all) yields a playable configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrandedConfig {
    /// Per-NPC memory limits.
    #[serde(default)]
    pub store: StoreConfig,
    /// Save-blob location and autosave behavior.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Remote text-generation settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

impl StrandedConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns [`crate::CoreError::Config`] if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::CoreError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Per-NPC capacity limits for the fact store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Hard cap on facts per NPC; insertion beyond this evicts by
    /// `(importance desc, timestamp desc)`.
    #[serde(default = "default_6")]
    pub max_facts_per_npc: usize,
    /// Conversation-log ring size.
    #[serde(default = "default_8")]
    pub max_convo_log: usize,
    /// Derived-summary character budget.
    #[serde(default = "default_140")]
    pub max_summary_len: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_facts_per_npc: 6,
            max_convo_log: 8,
            max_summary_len: 140,
        }
    }
}

/// Save-blob configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// File name of the JSON blob, resolved against the game's data dir.
    #[serde(default = "default_save_file")]
    pub save_file: String,
    /// Whether the autosave timer runs at all.
    #[serde(default = "default_true")]
    pub autosave: bool,
    /// Seconds between autosaves.
    #[serde(default = "default_10_f32")]
    pub autosave_interval_secs: f32,
    /// Delete any existing blob and start empty (demo/dev sessions).
    #[serde(default = "default_true")]
    pub reset_on_start: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_file: default_save_file(),
            autosave: true,
            autosave_interval_secs: 10.0,
            reset_on_start: true,
        }
    }
}

/// Remote text-generation settings.
///
/// An empty `api_key` means "unconfigured": the generation client fails
/// fast and gameplay runs entirely on rule-based fallback dialogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name on the inference router.
    #[serde(default = "default_model")]
    pub model: String,
    /// Bearer token for the inference API. Empty = unconfigured.
    #[serde(default)]
    pub api_key: String,
    /// Chat-completions endpoint URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sampling temperature.
    #[serde(default = "default_0_7")]
    pub temperature: f32,
    /// Maximum tokens to generate per reply.
    #[serde(default = "default_60")]
    pub max_tokens: u32,
    /// Hard per-request timeout in seconds.
    #[serde(default = "default_6_u64")]
    pub timeout_secs: u64,
    /// Use the chat-style payload; `false` selects the plain
    /// text-generation payload shape.
    #[serde(default = "default_true")]
    pub chat_payload: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: String::new(),
            base_url: default_base_url(),
            temperature: 0.7,
            max_tokens: 60,
            timeout_secs: 6,
            chat_payload: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}
fn default_save_file() -> String {
    "npc_memories.json".to_string()
}
fn default_model() -> String {
    "google/gemma-2-9b-it".to_string()
}
fn default_base_url() -> String {
    "https://router.huggingface.co/v1/chat/completions".to_string()
}
fn default_0_7() -> f32 {
    0.7
}
fn default_6() -> usize {
    6
}
fn default_8() -> usize {
    8
}
fn default_10_f32() -> f32 {
    10.0
}
fn default_60() -> u32 {
    60
}
fn default_6_u64() -> u64 {
    6
}
fn default_140() -> usize {
    140
}
