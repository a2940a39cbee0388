//! Concrete embedding providers.

pub mod ollama;
pub mod tfidf;
pub mod trigram;

pub use ollama::OllamaProvider;
pub use tfidf::TfIdfProvider;
pub use trigram::TrigramProvider;

use std::collections::HashSet;
use std::sync::OnceLock;

/// Words too common to carry signal in the local hashed providers.
pub(crate) fn stop_words() -> &'static HashSet<&'static str> {
    static STOP_WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    STOP_WORDS.get_or_init(|| {
        [
            "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to",
            "of", "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have",
            "has", "had", "it", "its", "their", "they", "them",
        ]
        .into_iter()
        .collect()
    })
}

/// Stable multiplicative hash used to map tokens onto embedding buckets.
pub(crate) fn bucket_hash(token: &str, multiplier: u64) -> u64 {
    token
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64))
}

/// Scale a vector to unit length in place; zero vectors are left as is.
pub(crate) fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}
