//! Error types for the stranded core library.

use thiserror::Error;

/// Top-level error type for core operations.
///
/// Store mutations themselves are infallible; errors only arise from the
/// persistence blob and configuration parsing, and callers are expected to
/// log and continue — nothing here should abort a session.
#[derive(Error, Debug)]
pub enum CoreError {
    /// JSON encoding or decoding of the persistence blob failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic I/O error (save file read/write/rename).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, CoreError>;
