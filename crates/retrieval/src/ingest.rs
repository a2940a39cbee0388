//! Ingestion pipeline: text → embedding → index row → registry entry →
//! committed generation.

use crate::collab::storage::MAX_ID_LEN;
use crate::collab::{validate_id, DocumentStore, TextStore};
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::registry::FilenameRegistry;
use crate::snapshot::SnapshotStore;
use crate::types::{BatchReceipt, DocumentInput};
use crate::vector_index::{FlatL2Index, VectorIndex};
use chrono::Utc;
use docseek_core::config::EmbeddingSettings;
use docseek_core::{AppError, AppResult};

/// Bytes reserved for the `_<timestamp>_<n>` suffix of a disambiguated id.
const SUFFIX_ROOM: usize = 32;

/// Pick a free id for `requested`.
///
/// A taken id gets the ingestion timestamp inserted before its extension
/// (`report.pdf` → `report_1718000000.pdf`); if that is taken too a counter
/// follows the timestamp (`report_1718000000_2.pdf`).
pub fn disambiguate(requested: &str, registry: &FilenameRegistry, timestamp: i64) -> String {
    if !registry.contains(requested) {
        return requested.to_string();
    }

    let (stem, extension) = split_extension(requested);
    let mut candidate = format!("{}_{}{}", stem, timestamp, extension);
    let mut counter = 2u32;
    while registry.contains(&candidate) {
        candidate = format!("{}_{}_{}{}", stem, timestamp, counter, extension);
        counter += 1;
    }
    candidate
}

/// Split off the last extension, dot included. Leading-dot names have none.
fn split_extension(id: &str) -> (&str, &str) {
    match id.rfind('.') {
        Some(pos) if pos > 0 => (&id[..pos], &id[pos..]),
        _ => (id, ""),
    }
}

/// Reject ids that cannot be stored, leaving room for a disambiguation suffix.
pub(crate) fn validate_requested_id(id: &str) -> AppResult<()> {
    validate_id(id)?;
    if id.len() + SUFFIX_ROOM > MAX_ID_LEN {
        return Err(AppError::InvalidId(id.to_string()));
    }
    Ok(())
}

struct Prepared {
    requested: String,
    text: String,
    raw: Option<Vec<u8>>,
}

/// One ingestion transaction. The caller holds the exclusive store scope.
pub struct IngestPipeline<'a> {
    pub snapshots: &'a SnapshotStore,
    pub texts: &'a dyn TextStore,
    pub documents: &'a dyn DocumentStore,
    pub settings: &'a EmbeddingSettings,
}

impl IngestPipeline<'_> {
    /// Embed, index and commit `inputs` as a single new generation.
    ///
    /// Documents with no text or an unusable id are skipped. When the store is uninitialized the
    /// provider is created from configuration and fitted on this batch;
    /// otherwise the persisted provider is reused as is.
    pub async fn run(&self, inputs: Vec<DocumentInput>) -> AppResult<BatchReceipt> {
        let mut receipt = BatchReceipt::default();
        let mut prepared = Vec::with_capacity(inputs.len());

        for input in inputs {
            if let Err(e) = validate_requested_id(&input.id) {
                tracing::warn!("Skipping {:?}: {}", input.id, e);
                receipt.skipped.push(input.id);
                continue;
            }
            let text = input.text.to_lowercase();
            if text.trim().is_empty() {
                tracing::warn!("Skipping '{}': no text to index", input.id);
                receipt.skipped.push(input.id);
                continue;
            }
            prepared.push(Prepared {
                requested: input.id,
                text,
                raw: input.raw,
            });
        }

        if prepared.is_empty() {
            return Ok(receipt);
        }

        let corpus: Vec<String> = prepared.iter().map(|doc| doc.text.clone()).collect();

        let (provider, index, mut registry) = match self.snapshots.load()? {
            Some(snapshot) => {
                let vectors = embed_all(snapshot.provider.as_ref(), &corpus).await?;
                let mut index = snapshot.index;
                for vector in &vectors {
                    index.add(vector)?;
                }
                (snapshot.provider, index, snapshot.registry)
            }
            None => {
                tracing::info!(
                    "Initializing store with {} provider '{}'",
                    self.settings.provider,
                    self.settings.model
                );
                let mut provider = create_provider(self.settings).await?;
                if provider.requires_fit() {
                    provider.fit(&corpus)?;
                }
                let vectors = embed_all(provider.as_ref(), &corpus).await?;
                (provider, FlatL2Index::build(&vectors)?, FilenameRegistry::new())
            }
        };

        let timestamp = Utc::now().timestamp();
        for doc in &prepared {
            let accepted = disambiguate(&doc.requested, &registry, timestamp);
            if accepted != doc.requested {
                tracing::info!("'{}' is already indexed, storing as '{}'", doc.requested, accepted);
            }
            registry.append(accepted.clone());
            receipt.accepted.push(accepted);
        }

        let committed = match self.stage(&receipt.accepted, &prepared) {
            Ok(()) => self.snapshots.commit(provider.as_ref(), &index, &registry),
            Err(e) => Err(e),
        };

        match committed {
            Ok(manifest) => {
                tracing::info!(
                    "Indexed {} documents ({} skipped), store now holds {} at generation {}",
                    receipt.accepted.len(),
                    receipt.skipped.len(),
                    manifest.documents,
                    manifest.generation
                );
                receipt.generation = Some(manifest.generation);
                Ok(receipt)
            }
            Err(e) => {
                self.discard(&receipt.accepted);
                Err(e)
            }
        }
    }

    fn stage(&self, accepted: &[String], prepared: &[Prepared]) -> AppResult<()> {
        for (id, doc) in accepted.iter().zip(prepared) {
            self.texts.save_text(id, &doc.text)?;
            if let Some(raw) = &doc.raw {
                self.documents.put(id, raw)?;
            }
        }
        Ok(())
    }

    fn discard(&self, accepted: &[String]) {
        for id in accepted {
            if let Err(e) = self.texts.remove_text(id) {
                tracing::warn!("Failed to remove staged text for '{}': {}", id, e);
            }
            if let Err(e) = self.documents.remove(id) {
                tracing::warn!("Failed to remove staged document '{}': {}", id, e);
            }
        }
    }
}

async fn embed_all(provider: &dyn EmbeddingProvider, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
    let mut vectors = Vec::with_capacity(texts.len());
    for text in texts {
        vectors.push(provider.embed(text).await?);
    }
    tracing::debug!(
        "Embedded {} documents with {}",
        vectors.len(),
        provider.provider_name()
    );
    Ok(vectors)
}
