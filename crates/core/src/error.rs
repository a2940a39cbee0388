//! Error types for docseek.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! embedding, vector store, registry and snapshot failures. Some variants are
//! recoverable per search hit (`OutOfRange`, `DocumentTextMissing`); see
//! [`AppError::is_per_result`].

use thiserror::Error;

/// Unified error type for docseek.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Text was empty after normalization and cannot be embedded
    #[error("Cannot embed empty text")]
    EmptyInput,

    /// Vector length disagrees with the fixed dimension of the store or provider
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Attempted to build a vector index from zero vectors
    #[error("Cannot build a vector index from an empty batch")]
    EmptyBatch,

    /// Registry lookup beyond its current length
    #[error("Position {position} is out of range (registry holds {len} entries)")]
    OutOfRange { position: usize, len: usize },

    /// A persisted artifact is absent while the rest of the snapshot exists
    #[error("Missing artifact: {0}. Run 'docseek reset' to recover")]
    MissingArtifact(String),

    /// A persisted artifact exists but is unreadable or inconsistent
    #[error("Corrupt artifact: {0}. Run 'docseek reset' to recover")]
    CorruptArtifact(String),

    /// The extracted text of a document could not be found
    #[error("Text for document '{0}' is missing")]
    DocumentTextMissing(String),

    /// Document identifier cannot be used as a stored filename
    #[error("Invalid document id: {0:?}")]
    InvalidId(String),

    /// Query was empty or whitespace after quote stripping
    #[error("Query is empty")]
    EmptyQuery,

    /// Text extraction from a source document failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Embedding backend failures (network, model, protocol)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error only invalidates a single search hit.
    ///
    /// The query engine drops the hit and keeps going for these.
    pub fn is_per_result(&self) -> bool {
        matches!(
            self,
            AppError::OutOfRange { .. } | AppError::DocumentTextMissing(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
