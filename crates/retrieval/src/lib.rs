//! Document indexing and retrieval engine.
//!
//! Documents are embedded into fixed-dimension vectors, stored in a flat L2
//! index next to a filename registry, and committed as versioned snapshot
//! generations. Queries embed the query text, take the nearest rows and
//! attach a sentence-aligned snippet per hit.
//!
//! [`SearchService`] is the entry point; the modules below it can be used on
//! their own.

pub mod collab;
pub mod config;
pub mod embeddings;
pub mod ingest;
pub mod lock;
pub mod query;
pub mod registry;
pub mod service;
pub mod snapshot;
pub mod snippet;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use collab::{
    DocumentStore, FsDocumentStore, FsTextStore, PlainTextExtractor, TextExtractor, TextStore,
};
pub use query::QueryMode;
pub use service::SearchService;
pub use snippet::{Snippet, SNIPPET_NOT_FOUND};
pub use types::{BatchReceipt, DocumentInput, IngestReceipt, SearchHit, StoreStats};
