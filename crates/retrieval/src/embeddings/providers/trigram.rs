//! Trigram embedding provider using character trigram-based content-aware embeddings.

use super::{bucket_hash, normalize, stop_words};
use crate::embeddings::provider::EmbeddingProvider;
use crate::embeddings::state::ProviderState;
use docseek_core::{AppError, AppResult};
use std::collections::HashMap;

const MODEL_NAME: &str = "trigram-v1";

/// Trigram-based embedding provider for local, offline operation.
///
/// Generates deterministic embeddings from character trigrams and word
/// frequencies. Stateless: restoring it only needs the dimension.
#[derive(Debug, Clone)]
pub struct TrigramProvider {
    dimensions: usize,
    context_window: Option<usize>,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            context_window: None,
        }
    }

    pub fn with_context_window(mut self, context_window: Option<usize>) -> Self {
        self.context_window = context_window;
        self
    }
}

/// Generate a trigram-based embedding for text.
fn trigram_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let mut embedding = vec![0.0; dimensions];
    let lower = text.to_lowercase();
    let stop_words = stop_words();

    let mut word_freq: HashMap<&str, u32> = HashMap::new();
    for word in lower
        .split_whitespace()
        .filter(|w| !stop_words.contains(w) && w.len() > 2)
    {
        *word_freq.entry(word).or_insert(0) += 1;
    }

    for (word, freq) in &word_freq {
        let chars: Vec<char> = word.chars().collect();
        for window in chars.windows(3) {
            let trigram: String = window.iter().collect();
            let dim_idx = (bucket_hash(&trigram, 37) as usize) % dimensions;
            embedding[dim_idx] += (*freq as f32).sqrt();
        }

        // Also encode whole word
        let base_dim = (bucket_hash(word, 31) as usize) % dimensions;
        embedding[base_dim] += *freq as f32;
    }

    normalize(&mut embedding);
    embedding
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn context_window(&self) -> Option<usize> {
        self.context_window
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let texts = texts.to_vec();
        let dimensions = self.dimensions;

        tokio::task::spawn_blocking(move || {
            texts
                .iter()
                .map(|text| trigram_embedding(text, dimensions))
                .collect::<Vec<Vec<f32>>>()
        })
        .await
        .map_err(|e| AppError::Embedding(format!("Trigram embedding task failed: {}", e)))
    }

    fn state(&self) -> AppResult<ProviderState> {
        Ok(ProviderState::new(
            self.provider_name(),
            MODEL_NAME,
            self.dimensions,
            self.context_window,
            serde_json::json!({}),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigram_provider_dimensions() {
        let provider = TrigramProvider::new(384);
        assert_eq!(provider.dimensions(), 384);
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
    }

    #[tokio::test]
    async fn test_trigram_provider_embed_single() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed("hello world").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_trigram_provider_deterministic() {
        let provider = TrigramProvider::new(384);
        let embedding1 = provider.embed("deterministic test").await.unwrap();
        let embedding2 = provider.embed("deterministic test").await.unwrap();
        assert_eq!(embedding1, embedding2);
    }

    #[tokio::test]
    async fn test_trigram_provider_different_texts() {
        let provider = TrigramProvider::new(384);
        let embedding1 = provider.embed("hello world").await.unwrap();
        let embedding2 = provider.embed("goodbye world").await.unwrap();
        assert_ne!(embedding1, embedding2);
    }

    #[tokio::test]
    async fn test_trigram_provider_stop_words_only() {
        // Non-empty text whose every token is filtered yields a zero vector
        let provider = TrigramProvider::new(32);
        let embedding = provider.embed("the and of").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_trigram_provider_utf8_safety() {
        let provider = TrigramProvider::new(384);
        let text = "gamedex é um aplicativo 🎮 brasileiro para gerenciar jogos!";
        let embedding = provider.embed(text).await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }
}
