//! Error handling utilities shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient result type used throughout the crate.
pub type Result<T, E = ChatprepError> = std::result::Result<T, E>;

/// Domain-specific error describing failures while decoding logs or building vocabularies.
#[derive(Debug, Error)]
pub enum ChatprepError {
    /// Configuration or input selection failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Filesystem IO error with optional context path.
    #[error("io error while processing {path:?}: {source}")]
    Io {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// Target path associated with the IO failure if available.
        path: Option<PathBuf>,
    },
    /// A single log record could not be interpreted.
    #[error("malformed record in {path:?} line {line}: {message}")]
    Record {
        /// Source file holding the record.
        path: PathBuf,
        /// Zero-based line position within the source file.
        line: usize,
        /// Parser diagnostic.
        message: String,
    },
    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// A dictionary file did not follow the `<index> <token>` layout.
    #[error("malformed dictionary: {0}")]
    Dictionary(String),
    /// Catch-all variant for invariants that should not occur.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for ChatprepError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl ChatprepError {
    /// Helper constructor that attaches an optional path when wrapping IO errors.
    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { source, path }
    }
}
