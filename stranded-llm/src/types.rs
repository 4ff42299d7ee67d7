//! Wire types for the text-generation request.
//!
//! Two payload shapes are supported. The chat shape is the default; the
//! plain text-generation shape is kept as a config-selectable alternative
//! for endpoints that only accept `inputs`/`parameters`.

use serde::Serialize;

/// One message in a chat-completions request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// "system" or "user".
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// A system-role message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// A user-role message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat-completions request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model name on the router.
    pub model: String,
    /// System + user messages.
    pub messages: Vec<ChatMessage>,
    /// Output token bound.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Plain text-generation request body (alternate shape).
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// The full prompt text.
    pub inputs: String,
    /// Generation parameters.
    pub parameters: CompletionParameters,
}

/// Parameters for the plain text-generation shape.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionParameters {
    /// Output token bound.
    pub max_new_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}
