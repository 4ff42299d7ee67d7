//! Generation error types.

use thiserror::Error;

/// Errors from the generation client. All of them mean "use fallback
/// dialogue" to the caller; none are fatal.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key configured — fails before any network attempt.
    #[error("LLM API key missing")]
    MissingApiKey,

    /// Transport-level failure (connection, DNS, body read).
    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    /// The endpoint answered with a non-success status.
    #[error("LLM endpoint returned HTTP {0}")]
    HttpStatus(u16),

    /// The request exceeded its configured timeout.
    #[error("LLM request timed out")]
    Timeout,

    /// Extraction and cleanup produced an empty string.
    #[error("LLM reply was empty after cleanup")]
    EmptyReply,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}
