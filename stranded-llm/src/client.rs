//! The generation client — one authenticated POST per NPC reply.
//!
//! Request lifecycle: `Idle → Pending → {Succeeded, Failed}`. `Pending` is
//! only entered when an API key is configured; otherwise the call fails
//! synchronously. Transport failures are surfaced, never retried — the
//! caller's fallback dialogue bounds the cost of any failure at one line.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::prompt::{PromptContext, SYSTEM_PROMPT, build_user_prompt};
use crate::types::{ChatMessage, ChatRequest, CompletionParameters, CompletionRequest};

/// Client settings; mapped from the game's TOML config by the caller.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Model name on the inference router.
    pub model: String,
    /// Bearer token. Empty = unconfigured, every call fails fast.
    pub api_key: String,
    /// Endpoint URL.
    pub base_url: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Output token bound.
    pub max_tokens: u32,
    /// Hard per-request timeout.
    pub timeout: Duration,
    /// Chat payload shape vs. plain text-generation shape.
    pub chat_payload: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "google/gemma-2-9b-it".to_string(),
            api_key: String::new(),
            base_url: "https://router.huggingface.co/v1/chat/completions".to_string(),
            temperature: 0.7,
            max_tokens: 60,
            timeout: Duration::from_secs(6),
            chat_payload: true,
        }
    }
}

/// Async client for the remote text-generation endpoint.
pub struct GenerationClient {
    config: GenerationConfig,
    http: reqwest::Client,
}

impl GenerationClient {
    /// Create a client. Does not validate the key — an empty key simply
    /// makes every call fail fast into the fallback path.
    #[must_use]
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    /// Generate one spoken line for the NPC described by `ctx`.
    ///
    /// # Errors
    ///
    /// [`LlmError::MissingApiKey`] before any network attempt when no key
    /// is configured; transport and status errors otherwise. Every error
    /// means "use the rule-based fallback line".
    pub async fn generate_reply(&self, ctx: &PromptContext) -> Result<String, LlmError> {
        if self.config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let user_prompt = build_user_prompt(ctx);
        debug!(npc = %ctx.npc_id, prompt_chars = user_prompt.len(), "built generation prompt");

        let body = if self.config.chat_payload {
            serde_json::to_value(ChatRequest {
                model: self.config.model.clone(),
                messages: vec![
                    ChatMessage::system(SYSTEM_PROMPT),
                    ChatMessage::user(user_prompt),
                ],
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            })
        } else {
            serde_json::to_value(CompletionRequest {
                inputs: format!("{SYSTEM_PROMPT}\n\n{user_prompt}"),
                parameters: CompletionParameters {
                    max_new_tokens: self.config.max_tokens,
                    temperature: self.config.temperature,
                },
            })
        }
        .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let response = self
            .http
            .post(&self.config.base_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .timeout(self.config.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(npc = %ctx.npc_id, status = status.as_u16(), "generation request failed");
            return Err(LlmError::HttpStatus(status.as_u16()));
        }

        let raw = response.text().await?;
        let extracted = extract_generated_text(&raw).unwrap_or_else(|| {
            warn!(npc = %ctx.npc_id, "couldn't parse structured response, using raw body");
            raw.clone()
        });

        let cleaned = clean_reply(&extracted);
        if cleaned.is_empty() {
            return Err(LlmError::EmptyReply);
        }
        debug!(npc = %ctx.npc_id, reply = %cleaned, "generation succeeded");
        Ok(cleaned)
    }
}

// ---------------------------------------------------------------------------
// Response extraction
// ---------------------------------------------------------------------------

fn pick(node: Option<&Value>) -> Option<String> {
    node.and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extract the generated utterance from any of the known response shapes.
///
/// Tried in priority order; the first non-empty string wins:
/// 1. `choices[0].message.content`, then `choices[0].delta.content`,
///    then `choices[0].text`
/// 2. root array: `[0].generated_text`
/// 3. top-level `generated_text`
/// 4. top-level `result`, `text`, `content` in that order
///
/// `None` when the body is not JSON or matches no shape — the caller then
/// degrades to the raw body.
#[must_use]
pub fn extract_generated_text(raw: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw).ok()?;

    if let Some(first) = value
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
    {
        if let Some(text) = pick(first.pointer("/message/content")) {
            return Some(text);
        }
        if let Some(text) = pick(first.pointer("/delta/content")) {
            return Some(text);
        }
        if let Some(text) = pick(first.get("text")) {
            return Some(text);
        }
    }

    if let Some(array) = value.as_array() {
        if let Some(text) = pick(array.first().and_then(|v| v.get("generated_text"))) {
            return Some(text);
        }
    }

    for key in ["generated_text", "result", "text", "content"] {
        if let Some(text) = pick(value.get(key)) {
            return Some(text);
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Output cleanup
// ---------------------------------------------------------------------------

/// Trailing narration clause: a pronoun followed by a past-tense verb, e.g.
/// "He muttered darkly." This is a documented heuristic — false positives
/// and negatives are an accepted approximation.
static NARRATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(he|she|they|I)(\s+\w+ed\b).*").expect("narration pattern compiles")
});

/// Reduce a model reply to the spoken line.
///
/// If the text contains at least two double quotes, the substring strictly
/// between the first and last quote is treated as the dialogue. Otherwise
/// all quotes are stripped and a trailing narration clause is removed.
#[must_use]
pub fn clean_reply(raw: &str) -> String {
    if raw.trim().is_empty() {
        return raw.trim().to_string();
    }

    if let (Some(first), Some(last)) = (raw.find('"'), raw.rfind('"')) {
        if last > first {
            return raw[first + 1..last].trim().to_string();
        }
    }

    let no_quotes = raw.replace('"', "");
    let stripped = NARRATION_RE.replace(&no_quotes, "");
    stripped.trim().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
