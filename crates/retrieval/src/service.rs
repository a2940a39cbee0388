//! The search service: one object owning configuration, collaborators and
//! the access scope around a document store.
//!
//! Writers (`ingest*`, `reset`) take the in-process gate for writing and then
//! an exclusive file lock; readers take the gate for reading and a shared
//! file lock. The gate is always acquired before the file lock. Every
//! operation loads the committed snapshot afresh inside its scope.

use crate::collab::{DocumentStore, FsDocumentStore, FsTextStore, TextStore};
use crate::config::StorePaths;
use crate::ingest::{validate_requested_id, IngestPipeline};
use crate::lock::StoreLock;
use crate::query::{self, QueryMode};
use crate::snapshot::SnapshotStore;
use crate::types::{BatchReceipt, DocumentInput, IngestReceipt, SearchHit, StoreStats};
use docseek_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;

pub struct SearchService {
    config: AppConfig,
    paths: StorePaths,
    snapshots: SnapshotStore,
    texts: Arc<dyn TextStore>,
    documents: Arc<dyn DocumentStore>,
    gate: RwLock<()>,
}

impl SearchService {
    /// Build a service over the filesystem stores under `config.data_dir()`.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let paths = StorePaths::from_config(&config);
        let texts = Arc::new(FsTextStore::new(paths.texts_dir()));
        let documents = Arc::new(FsDocumentStore::new(paths.files_dir()));
        Self::with_stores(config, texts, documents)
    }

    /// Build a service with custom text and document stores.
    pub fn with_stores(
        config: AppConfig,
        texts: Arc<dyn TextStore>,
        documents: Arc<dyn DocumentStore>,
    ) -> AppResult<Self> {
        config.validate()?;
        let paths = StorePaths::from_config(&config);
        paths.ensure_root()?;

        Ok(Self {
            snapshots: SnapshotStore::new(paths.clone()),
            paths,
            config,
            texts,
            documents,
            gate: RwLock::new(()),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Ingest one document's extracted text.
    pub async fn ingest(&self, id: &str, text: &str) -> AppResult<IngestReceipt> {
        self.ingest_document(DocumentInput::new(id, text)).await
    }

    /// Ingest one document, optionally with its raw bytes.
    ///
    /// Unlike a batch, an unusable id is an `InvalidId` error.
    pub async fn ingest_document(&self, input: DocumentInput) -> AppResult<IngestReceipt> {
        validate_requested_id(&input.id)?;
        let receipt = self.ingest_batch(vec![input]).await?;
        let accepted_id = receipt
            .accepted
            .into_iter()
            .next()
            .ok_or(AppError::EmptyInput)?;
        Ok(IngestReceipt { accepted_id })
    }

    /// Ingest many documents as one transaction.
    #[instrument(skip(self, inputs), fields(documents = inputs.len()))]
    pub async fn ingest_batch(&self, inputs: Vec<DocumentInput>) -> AppResult<BatchReceipt> {
        let _gate = self.gate.write().await;
        let _lock = StoreLock::exclusive(&self.paths.lock_path()).await?;

        IngestPipeline {
            snapshots: &self.snapshots,
            texts: self.texts.as_ref(),
            documents: self.documents.as_ref(),
            settings: &self.config.embedding,
        }
        .run(inputs)
        .await
    }

    /// Search for `raw`; `k` defaults to the configured `top_k`.
    #[instrument(skip(self))]
    pub async fn query(&self, raw: &str, k: Option<usize>) -> AppResult<Vec<SearchHit>> {
        let mode = QueryMode::parse(raw)?;
        let k = k.unwrap_or(self.config.search.top_k);

        let _gate = self.gate.read().await;
        let _lock = StoreLock::shared(&self.paths.lock_path()).await?;

        let Some(snapshot) = self.snapshots.load()? else {
            tracing::info!("Store is empty, nothing to search");
            return Ok(Vec::new());
        };

        let hits = query::search(
            &snapshot,
            self.texts.as_ref(),
            &mode,
            k,
            self.config.search.context_size,
        )
        .await?;

        tracing::info!(
            "{} query returned {} hits",
            if mode.is_exact() { "Exact" } else { "Approximate" },
            hits.len()
        );
        Ok(hits)
    }

    /// Remove the index, registry, provider state, text cache and raw documents.
    pub async fn reset(&self) -> AppResult<()> {
        let _gate = self.gate.write().await;
        let _lock = StoreLock::exclusive(&self.paths.lock_path()).await?;

        self.snapshots.clear()?;
        self.texts.clear()?;
        self.documents.clear()?;

        tracing::info!("Store at {:?} reset", self.paths.root());
        Ok(())
    }

    pub async fn stats(&self) -> AppResult<StoreStats> {
        let _gate = self.gate.read().await;
        let _lock = StoreLock::shared(&self.paths.lock_path()).await?;

        Ok(match self.snapshots.read_manifest()? {
            Some(manifest) => StoreStats {
                documents: manifest.documents,
                dimensions: manifest.dimensions,
                provider: Some(manifest.provider),
                model: Some(manifest.model),
                generation: manifest.generation,
                committed_at: Some(manifest.committed_at),
            },
            None => StoreStats::empty(),
        })
    }

    /// Ids of every indexed document, in index order.
    pub async fn list_documents(&self) -> AppResult<Vec<String>> {
        let _gate = self.gate.read().await;
        let _lock = StoreLock::shared(&self.paths.lock_path()).await?;

        Ok(match self.snapshots.load()? {
            Some(snapshot) => snapshot.registry.iter().map(str::to_string).collect(),
            None => Vec::new(),
        })
    }

    /// Ids of every document whose raw bytes are kept, sorted.
    pub async fn stored_files(&self) -> AppResult<Vec<String>> {
        let _gate = self.gate.read().await;
        let _lock = StoreLock::shared(&self.paths.lock_path()).await?;

        self.documents.list()
    }

    /// Raw bytes of a stored document, if it was ingested with them.
    pub async fn fetch_document(&self, id: &str) -> AppResult<Option<Vec<u8>>> {
        let _gate = self.gate.read().await;
        let _lock = StoreLock::shared(&self.paths.lock_path()).await?;

        self.documents.get(id)
    }
}
