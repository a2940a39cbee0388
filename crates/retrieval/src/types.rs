//! Retrieval engine type definitions.

use crate::snippet::Snippet;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A document handed to the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    /// Requested id (usually the uploaded filename)
    pub id: String,

    /// Extracted plain text
    pub text: String,

    /// Raw bytes to keep in the document store, if any
    pub raw: Option<Vec<u8>>,
}

impl DocumentInput {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            raw: None,
        }
    }

    pub fn with_raw(mut self, raw: Vec<u8>) -> Self {
        self.raw = Some(raw);
        self
    }
}

/// Result of ingesting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReceipt {
    /// Id the document is stored under; differs from the requested id when
    /// that one was already taken
    pub accepted_id: String,
}

/// Result of ingesting a batch of documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReceipt {
    /// Accepted ids, in input order
    pub accepted: Vec<String>,

    /// Requested ids skipped because their text was empty
    pub skipped: Vec<String>,

    /// Generation committed by the batch (`None` when nothing was accepted)
    pub generation: Option<u64>,
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Document id
    pub id: String,

    /// Squared L2 distance to the query embedding
    pub distance: f32,

    /// Excerpt around the match
    pub snippet: Snippet,

    /// Occurrences of the query in the document
    pub occurrences: usize,
}

/// Summary of a store's committed state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    /// Number of indexed documents
    pub documents: usize,

    /// Embedding dimension (0 when uninitialized)
    pub dimensions: usize,

    /// Embedding provider of the committed snapshot
    pub provider: Option<String>,

    /// Embedding model of the committed snapshot
    pub model: Option<String>,

    /// Current generation (0 when uninitialized)
    pub generation: u64,

    /// When the current generation was committed
    pub committed_at: Option<DateTime<Utc>>,
}

impl StoreStats {
    pub fn empty() -> Self {
        Self {
            documents: 0,
            dimensions: 0,
            provider: None,
            model: None,
            generation: 0,
            committed_at: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.generation > 0
    }
}
