//! Query parsing and nearest-neighbour search over a loaded snapshot.

use crate::collab::TextStore;
use crate::snapshot::Snapshot;
use crate::snippet;
use crate::types::SearchHit;
use crate::vector_index::VectorIndex;
use docseek_core::{AppError, AppResult};

/// How a query is matched against document text.
///
/// Decided once from the raw query: a query wrapped in a pair of double
/// quotes is an exact phrase, anything else is a bag of words. The payload is
/// the lower-cased query with the quotes removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryMode {
    Exact(String),
    Approximate(String),
}

impl QueryMode {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let quoted = raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"');

        let mode = if quoted {
            QueryMode::Exact(raw[1..raw.len() - 1].to_lowercase())
        } else {
            QueryMode::Approximate(raw.to_lowercase())
        };

        if mode.text().trim().is_empty() {
            return Err(AppError::EmptyQuery);
        }
        Ok(mode)
    }

    /// Query text without quotes.
    pub fn text(&self) -> &str {
        match self {
            QueryMode::Exact(text) | QueryMode::Approximate(text) => text,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, QueryMode::Exact(_))
    }
}

/// Run a query against a snapshot.
///
/// Hits come back in vector-index order. Sentinel rows, rows the registry
/// cannot resolve and documents whose text is gone are dropped.
pub async fn search(
    snapshot: &Snapshot,
    texts: &dyn TextStore,
    mode: &QueryMode,
    k: usize,
    context_size: usize,
) -> AppResult<Vec<SearchHit>> {
    if k == 0 || snapshot.index.is_empty() {
        return Ok(Vec::new());
    }

    // Ranks past the last row can only be sentinels
    let k = k.min(snapshot.index.len());
    let embedding = snapshot.provider.embed(mode.text()).await?;
    let neighbors = snapshot.index.search(&embedding, k)?;

    let mut hits = Vec::with_capacity(neighbors.len());
    for neighbor in neighbors {
        if neighbor.is_sentinel() {
            tracing::debug!("Skipping sentinel row");
            continue;
        }

        let resolved = snapshot
            .registry
            .resolve(neighbor.row as usize)
            .map(str::to_string)
            .and_then(|id| texts.load_text(&id).map(|text| (id, text)));

        let (id, text) = match resolved {
            Ok(found) => found,
            Err(e) if e.is_per_result() => {
                tracing::debug!("Dropping row {}: {}", neighbor.row, e);
                continue;
            }
            Err(e) => return Err(e),
        };

        let (snippet, occurrences) = snippet::extract(mode, &text.to_lowercase(), context_size);
        hits.push(SearchHit {
            id,
            distance: neighbor.distance,
            snippet,
            occurrences,
        });
    }

    Ok(hits)
}
