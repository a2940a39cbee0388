//! Collaborators the engine consumes through traits: text extraction, the
//! extracted text cache and raw document storage.

pub mod extract;
pub mod storage;

pub use extract::{PlainTextExtractor, TextExtractor};
pub use storage::{validate_id, DocumentStore, FsDocumentStore, FsTextStore, TextStore};
