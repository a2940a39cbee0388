//! Embedding providers.
//!
//! Every backend implements [`EmbeddingProvider`]; the rest of the engine
//! never special-cases a concrete provider. Providers are created from
//! configuration when a store is first initialized and restored from their
//! persisted [`ProviderState`] on every later load.

pub mod pooling;
pub mod provider;
pub mod providers;
pub mod state;

pub use provider::{create_provider, restore_provider, EmbeddingProvider};
pub use state::{ProviderState, PROVIDER_STATE_VERSION};
