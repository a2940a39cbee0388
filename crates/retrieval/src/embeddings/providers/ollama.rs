//! Ollama Embedding Provider
//!
//! Transformer embeddings via Ollama's local API using models like
//! nomic-embed-text.
//!
//! # Features
//! - Neural semantic embeddings (768-dim for nomic-embed-text)
//! - Local-first (no API costs, privacy-preserving)
//! - Automatic retry with exponential backoff
//! - Over-length documents are windowed by word count and mean-pooled by
//!   [`EmbeddingProvider::embed`]
//!
//! The provider holds no fitted state; its persisted payload only records the
//! endpoint so a restored provider talks to the same server.

use crate::embeddings::provider::EmbeddingProvider;
use crate::embeddings::state::ProviderState;
use async_trait::async_trait;
use docseek_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Ollama API endpoint for embeddings
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Words per request when no context window is configured
const DEFAULT_CONTEXT_WINDOW: usize = 512;

/// Maximum retry attempts for failed requests
const MAX_RETRIES: u32 = 3;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Ollama embedding provider using local API
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Arc<Client>,
    base_url: String,
    model: String,
    dimensions: usize,
    context_window: usize,
}

/// Request payload for Ollama embeddings API
#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response from Ollama embeddings API
#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Error response from Ollama API
#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Persisted payload
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaPayload {
    endpoint: String,
}

impl OllamaProvider {
    /// Create a provider without contacting the server.
    ///
    /// The endpoint falls back to `OLLAMA_URL`, then to the local default.
    pub fn new(
        endpoint: Option<&str>,
        model: &str,
        dimensions: usize,
        context_window: Option<usize>,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Embedding(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        let base_url = match endpoint {
            Some(endpoint) => endpoint.to_string(),
            None => {
                std::env::var("OLLAMA_URL").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string())
            }
        };

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
            context_window: context_window.unwrap_or(DEFAULT_CONTEXT_WINDOW),
        })
    }

    /// Restore from persisted state.
    pub fn from_state(state: &ProviderState) -> AppResult<Self> {
        let payload: OllamaPayload = serde_json::from_value(state.payload.clone()).map_err(|e| {
            AppError::CorruptArtifact(format!("invalid ollama provider state: {}", e))
        })?;

        Self::new(
            Some(&payload.endpoint),
            &state.model,
            state.dimensions,
            state.context_window,
        )
    }

    /// Verify Ollama connection and model availability.
    #[instrument(skip(self), fields(model = %self.model))]
    pub async fn verify_connection(&self) -> AppResult<()> {
        debug!("Verifying Ollama connection at {}", self.base_url);

        match self.embed_with_retries("test connection", MAX_RETRIES).await {
            Ok(_) => {
                debug!("Ollama connection verified, model '{}' ready", self.model);
                Ok(())
            }
            Err(e @ AppError::DimensionMismatch { .. }) => Err(e),
            Err(e) => {
                error!("Failed to connect to Ollama: {}", e);
                Err(AppError::Embedding(format!(
                    "Ollama not available at {}. Ensure Ollama is running and model '{}' is installed. Run: ollama pull {}",
                    self.base_url, self.model, self.model
                )))
            }
        }
    }

    /// Embed single text with retry logic
    #[instrument(skip(self, text), fields(text_len = text.len(), model = %self.model))]
    async fn embed_with_retries(&self, text: &str, retries: u32) -> AppResult<Vec<f32>> {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < retries {
            match self.embed_single(text).await {
                Ok(embedding) => return Ok(embedding),
                // A wrong-sized vector will not fix itself on retry
                Err(e @ AppError::DimensionMismatch { .. }) => return Err(e),
                Err(e) => {
                    attempt += 1;
                    last_error = Some(e);

                    if attempt < retries {
                        let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                        warn!(
                            "Embedding failed (attempt {}/{}), retrying in {}ms",
                            attempt, retries, backoff_ms
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::Embedding("Unknown embedding error".to_string())))
    }

    /// Embed single text (no retries)
    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to send request to Ollama: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let message = match serde_json::from_str::<ErrorResponse>(&error_text) {
                Ok(error_response) => error_response.error,
                Err(_) => error_text,
            };

            return Err(AppError::Embedding(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let response_body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        if response_body.embedding.len() != self.dimensions {
            return Err(AppError::DimensionMismatch {
                expected: self.dimensions,
                actual: response_body.embedding.len(),
            });
        }

        Ok(response_body.embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn context_window(&self) -> Option<usize> {
        Some(self.context_window)
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "ollama", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        // Ollama's embeddings endpoint takes one prompt per request
        let mut embeddings = Vec::with_capacity(texts.len());

        for text in texts {
            if text.trim().is_empty() {
                return Err(AppError::EmptyInput);
            }
            embeddings.push(self.embed_with_retries(text, MAX_RETRIES).await?);
        }

        Ok(embeddings)
    }

    fn state(&self) -> AppResult<ProviderState> {
        let payload = OllamaPayload {
            endpoint: self.base_url.clone(),
        };

        Ok(ProviderState::new(
            self.provider_name(),
            &self.model,
            self.dimensions,
            Some(self.context_window),
            serde_json::to_value(payload)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_records_endpoint() {
        let provider =
            OllamaProvider::new(Some("http://embed-host:11434/"), "nomic-embed-text", 768, None)
                .unwrap();
        let state = provider.state().unwrap();

        assert_eq!(state.provider, "ollama");
        assert_eq!(state.dimensions, 768);
        assert_eq!(state.context_window, Some(DEFAULT_CONTEXT_WINDOW));
        assert_eq!(state.payload["endpoint"], "http://embed-host:11434");

        let restored = OllamaProvider::from_state(&state).unwrap();
        assert_eq!(restored.base_url, "http://embed-host:11434");
        assert_eq!(restored.model_name(), "nomic-embed-text");
    }

    #[test]
    fn test_from_state_rejects_missing_endpoint() {
        let state = ProviderState::new("ollama", "nomic-embed-text", 768, None, serde_json::json!({}));
        assert!(matches!(
            OllamaProvider::from_state(&state),
            Err(AppError::CorruptArtifact(_))
        ));
    }

    #[tokio::test]
    async fn test_embed_batch_rejects_blank_window() {
        let provider = OllamaProvider::new(Some("http://127.0.0.1:9"), "m", 8, None).unwrap();
        let result = provider.embed_batch(&["  ".to_string()]).await;
        assert!(matches!(result, Err(AppError::EmptyInput)));
    }

    #[tokio::test]
    async fn test_embed_live() {
        // Requires a running Ollama with nomic-embed-text pulled
        if std::env::var("OLLAMA_URL").is_err() {
            println!("Skipping test: OLLAMA_URL not set");
            return;
        }

        let provider = OllamaProvider::new(None, "nomic-embed-text", 768, None).unwrap();
        provider.verify_connection().await.unwrap();
        let embedding = provider.embed("hello, world").await.unwrap();
        assert_eq!(embedding.len(), 768);
    }
}
