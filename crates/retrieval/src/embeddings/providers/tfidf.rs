//! Fitted TF-IDF embedding provider over hashed word buckets.
//!
//! The provider learns document frequencies once, from the corpus the store
//! is bootstrapped with, and embeds every later document and query against
//! those frozen statistics. Words are lower-cased, stripped of surrounding
//! punctuation and hashed into `dimensions` buckets.

use super::{bucket_hash, normalize, stop_words};
use crate::embeddings::provider::EmbeddingProvider;
use crate::embeddings::state::ProviderState;
use docseek_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Fitted corpus statistics. Persisted as integers so a restored provider
/// reproduces exactly the same vectors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct FittedStats {
    documents: u64,
    document_frequencies: Vec<u64>,
}

impl FittedStats {
    /// Smoothed inverse document frequency per bucket.
    fn idf(&self) -> Vec<f32> {
        let n = self.documents as f64;
        self.document_frequencies
            .iter()
            .map(|&df| (((1.0 + n) / (1.0 + df as f64)).ln() + 1.0) as f32)
            .collect()
    }
}

/// TF-IDF provider that must be fitted before it can embed.
#[derive(Debug, Clone)]
pub struct TfIdfProvider {
    model: String,
    dimensions: usize,
    context_window: Option<usize>,
    stats: Option<FittedStats>,
    idf: Option<Arc<Vec<f32>>>,
}

impl TfIdfProvider {
    /// Create an unfitted provider.
    pub fn new(model: &str, dimensions: usize, context_window: Option<usize>) -> Self {
        Self {
            model: model.to_string(),
            dimensions,
            context_window,
            stats: None,
            idf: None,
        }
    }

    /// Restore a fitted provider from persisted state.
    pub fn from_state(state: &ProviderState) -> AppResult<Self> {
        let stats: FittedStats = serde_json::from_value(state.payload.clone()).map_err(|e| {
            AppError::CorruptArtifact(format!("invalid tfidf provider state: {}", e))
        })?;

        if stats.document_frequencies.len() != state.dimensions {
            return Err(AppError::DimensionMismatch {
                expected: state.dimensions,
                actual: stats.document_frequencies.len(),
            });
        }

        let mut provider = Self::new(&state.model, state.dimensions, state.context_window);
        provider.install(stats);
        Ok(provider)
    }

    fn install(&mut self, stats: FittedStats) {
        self.idf = Some(Arc::new(stats.idf()));
        self.stats = Some(stats);
    }
}

/// Tokenize into lower-cased words with surrounding punctuation removed.
fn tokens(text: &str) -> Vec<String> {
    let stop_words = stop_words();
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty() && !stop_words.contains(w.as_str()))
        .collect()
}

fn bucket(token: &str, dimensions: usize) -> usize {
    (bucket_hash(token, 31) as usize) % dimensions
}

fn tfidf_embedding(text: &str, idf: &[f32]) -> Vec<f32> {
    let dimensions = idf.len();
    let mut embedding = vec![0.0f32; dimensions];

    for token in tokens(text) {
        embedding[bucket(&token, dimensions)] += 1.0;
    }

    for (v, weight) in embedding.iter_mut().zip(idf) {
        *v *= weight;
    }

    normalize(&mut embedding);
    embedding
}

#[async_trait::async_trait]
impl EmbeddingProvider for TfIdfProvider {
    fn provider_name(&self) -> &str {
        "tfidf"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn context_window(&self) -> Option<usize> {
        self.context_window
    }

    fn requires_fit(&self) -> bool {
        self.stats.is_none()
    }

    fn fit(&mut self, corpus: &[String]) -> AppResult<()> {
        if self.stats.is_some() {
            return Err(AppError::Embedding(
                "tfidf provider is already fitted; refitting would invalidate stored vectors"
                    .to_string(),
            ));
        }
        if corpus.is_empty() {
            return Err(AppError::EmptyBatch);
        }

        let mut document_frequencies = vec![0u64; self.dimensions];
        for document in corpus {
            let buckets: HashSet<usize> = tokens(document)
                .iter()
                .map(|t| bucket(t, self.dimensions))
                .collect();
            for b in buckets {
                document_frequencies[b] += 1;
            }
        }

        tracing::info!(
            "Fitted tfidf provider on {} documents ({} buckets)",
            corpus.len(),
            self.dimensions
        );

        self.install(FittedStats {
            documents: corpus.len() as u64,
            document_frequencies,
        });
        Ok(())
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let idf = match &self.idf {
            Some(idf) => Arc::clone(idf),
            None => {
                return Err(AppError::Embedding(
                    "tfidf provider must be fitted before embedding".to_string(),
                ))
            }
        };
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            texts
                .iter()
                .map(|text| tfidf_embedding(text, &idf))
                .collect::<Vec<Vec<f32>>>()
        })
        .await
        .map_err(|e| AppError::Embedding(format!("tfidf embedding task failed: {}", e)))
    }

    fn state(&self) -> AppResult<ProviderState> {
        let stats = self.stats.as_ref().ok_or_else(|| {
            AppError::Embedding("cannot persist an unfitted tfidf provider".to_string())
        })?;

        Ok(ProviderState::new(
            self.provider_name(),
            &self.model,
            self.dimensions,
            self.context_window,
            serde_json::to_value(stats)?,
        ))
    }
}
