//! Persisted embedding provider state.

use serde::{Deserialize, Serialize};

/// Current on-disk version of [`ProviderState`].
pub const PROVIDER_STATE_VERSION: u32 = 1;

/// Versioned, serializable snapshot of an embedding provider.
///
/// `payload` is provider-specific (e.g. fitted document frequencies for
/// `tfidf`, the endpoint for `ollama`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderState {
    pub format_version: u32,
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    #[serde(default)]
    pub context_window: Option<usize>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ProviderState {
    pub fn new(
        provider: &str,
        model: &str,
        dimensions: usize,
        context_window: Option<usize>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            format_version: PROVIDER_STATE_VERSION,
            provider: provider.to_string(),
            model: model.to_string(),
            dimensions,
            context_window,
            payload,
        }
    }
}
