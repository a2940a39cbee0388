//! Embedding provider trait and factory.

use crate::embeddings::pooling;
use crate::embeddings::providers::{OllamaProvider, TfIdfProvider, TrigramProvider};
use crate::embeddings::state::{ProviderState, PROVIDER_STATE_VERSION};
use docseek_core::config::{EmbeddingSettings, KNOWN_PROVIDERS};
use docseek_core::{AppError, AppResult};

/// Trait for embedding providers.
///
/// The ingestion pipeline and query engine only ever talk to this trait;
/// concrete backends are chosen once by [`create_provider`] or
/// [`restore_provider`].
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "tfidf", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Maximum number of words embedded in a single pass.
    fn context_window(&self) -> Option<usize> {
        None
    }

    /// Whether [`fit`](Self::fit) must run before the provider can embed.
    fn requires_fit(&self) -> bool {
        false
    }

    /// Learn provider state from a bootstrap corpus.
    ///
    /// Only called when a store is initialized; a fitted provider is never
    /// re-fitted, since that would move every stored vector out of its
    /// embedding space.
    fn fit(&mut self, _corpus: &[String]) -> AppResult<()> {
        Ok(())
    }

    /// Generate raw embeddings for texts that fit within the context window.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate the embedding of a whole text.
    ///
    /// Texts longer than the context window are windowed and mean-pooled.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let normalized = text.trim();
        if normalized.is_empty() {
            return Err(AppError::EmptyInput);
        }

        let windows = pooling::split_windows(normalized, self.context_window());
        if windows.len() > 1 {
            tracing::debug!(
                "Embedding {} windows of at most {:?} words",
                windows.len(),
                self.context_window()
            );
        }

        let vectors = self.embed_batch(&windows).await?;
        pooling::mean_pool(&vectors, self.dimensions())
    }

    /// Export the provider's persisted state.
    fn state(&self) -> AppResult<ProviderState>;
}

/// Create a fresh embedding provider from configuration.
///
/// Remote providers verify connectivity here.
pub async fn create_provider(settings: &EmbeddingSettings) -> AppResult<Box<dyn EmbeddingProvider>> {
    if settings.dimensions == 0 {
        return Err(AppError::Config(
            "Embedding dimensions must be greater than zero".to_string(),
        ));
    }

    match settings.provider.as_str() {
        "trigram" => Ok(Box::new(
            TrigramProvider::new(settings.dimensions).with_context_window(settings.context_window),
        )),

        "tfidf" => Ok(Box::new(TfIdfProvider::new(
            &settings.model,
            settings.dimensions,
            settings.context_window,
        ))),

        "ollama" => {
            let provider = OllamaProvider::new(
                settings.endpoint.as_deref(),
                &settings.model,
                settings.dimensions,
                settings.context_window,
            )?;
            provider.verify_connection().await?;
            Ok(Box::new(provider))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: {}",
            settings.provider,
            KNOWN_PROVIDERS.join(", ")
        ))),
    }
}

/// Rebuild a provider from its persisted state.
pub fn restore_provider(state: &ProviderState) -> AppResult<Box<dyn EmbeddingProvider>> {
    if state.format_version != PROVIDER_STATE_VERSION {
        return Err(AppError::CorruptArtifact(format!(
            "unsupported provider state version {} (expected {})",
            state.format_version, PROVIDER_STATE_VERSION
        )));
    }
    if state.dimensions == 0 {
        return Err(AppError::CorruptArtifact(
            "provider state declares zero dimensions".to_string(),
        ));
    }

    let provider: Box<dyn EmbeddingProvider> = match state.provider.as_str() {
        "trigram" => Box::new(
            TrigramProvider::new(state.dimensions).with_context_window(state.context_window),
        ),
        "tfidf" => Box::new(TfIdfProvider::from_state(state)?),
        "ollama" => Box::new(OllamaProvider::from_state(state)?),
        other => {
            return Err(AppError::CorruptArtifact(format!(
                "provider state names unknown provider '{}'",
                other
            )))
        }
    };

    tracing::debug!(
        "Restored embedding provider {} ({}, {} dimensions)",
        provider.provider_name(),
        provider.model_name(),
        provider.dimensions()
    );

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> EmbeddingSettings {
        EmbeddingSettings {
            provider: provider.to_string(),
            model: "test-model".to_string(),
            dimensions: 64,
            context_window: None,
            endpoint: None,
        }
    }

    #[tokio::test]
    async fn test_create_trigram_provider() {
        let provider = create_provider(&settings("trigram")).await.unwrap();
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.dimensions(), 64);
        assert!(!provider.requires_fit());
    }

    #[tokio::test]
    async fn test_create_tfidf_requires_fit() {
        let provider = create_provider(&settings("tfidf")).await.unwrap();
        assert_eq!(provider.provider_name(), "tfidf");
        assert!(provider.requires_fit());
    }

    #[tokio::test]
    async fn test_create_unknown_provider() {
        let result = create_provider(&settings("doc2vec")).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_embed_rejects_blank_text() {
        let provider = create_provider(&settings("trigram")).await.unwrap();
        let result = provider.embed("   \n\t ").await;
        assert!(matches!(result, Err(AppError::EmptyInput)));
    }

    #[tokio::test]
    async fn test_embed_mean_pools_long_text() {
        let provider = TrigramProvider::new(64).with_context_window(Some(2));
        let pooled = provider.embed("rust language compiler borrow").await.unwrap();

        let windows = vec![
            "rust language".to_string(),
            "compiler borrow".to_string(),
        ];
        let parts = provider.embed_batch(&windows).await.unwrap();
        let expected: Vec<f32> = parts[0]
            .iter()
            .zip(&parts[1])
            .map(|(a, b)| (a + b) / 2.0)
            .collect();

        assert_eq!(pooled, expected);
    }

    #[tokio::test]
    async fn test_restore_round_trip() {
        let provider = create_provider(&settings("trigram")).await.unwrap();
        let restored = restore_provider(&provider.state().unwrap()).unwrap();

        let a = provider.embed("persisted embedding space").await.unwrap();
        let b = restored.embed("persisted embedding space").await.unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_restore_rejects_future_version() {
        let mut state = ProviderState::new("trigram", "trigram-v1", 8, None, serde_json::json!({}));
        state.format_version = 99;
        assert!(matches!(
            restore_provider(&state),
            Err(AppError::CorruptArtifact(_))
        ));
    }
}
