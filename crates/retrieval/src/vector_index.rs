//! Exhaustive L2 vector index.
//!
//! Rows are addressed by insertion position and never removed. Distances
//! are squared Euclidean distances, so an exact self-match scores `0.0`.
//!
//! On-disk layout (little-endian):
//!
//! ```text
//! magic "DSQX" | version u32 | dimensions u32 | rows u64 | rows * dimensions f32
//! ```

use docseek_core::{AppError, AppResult};
use std::path::Path;

const MAGIC: &[u8; 4] = b"DSQX";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Row reported for ranks that have no vector behind them.
pub const SENTINEL_ROW: i64 = -1;

/// One ranked search result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Insertion position, or [`SENTINEL_ROW`]
    pub row: i64,
    /// Squared L2 distance (`f32::MAX` for sentinels)
    pub distance: f32,
}

impl Neighbor {
    fn sentinel() -> Self {
        Self {
            row: SENTINEL_ROW,
            distance: f32::MAX,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.row < 0
    }
}

/// Trait for vector index backends.
pub trait VectorIndex: Send + Sync {
    /// Fixed dimension of every stored vector.
    fn dimensions(&self) -> usize;

    /// Number of stored rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one vector, returning its row.
    fn add(&mut self, vector: &[f32]) -> AppResult<usize>;

    /// Return exactly `k` neighbours by ascending distance, padding with
    /// sentinels when fewer than `k` rows exist. A `k` too large to pad is
    /// an error; callers that only want real rows bound `k` by `len()`.
    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<Neighbor>>;
}

/// Flat (brute-force) index over a contiguous row-major buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dimensions: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Create an empty index of the given dimension.
    pub fn new(dimensions: usize) -> AppResult<Self> {
        if dimensions == 0 {
            return Err(AppError::Other(
                "vector dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            dimensions,
            data: Vec::new(),
        })
    }

    /// Build an index from a non-empty batch; the first vector fixes the dimension.
    pub fn build(vectors: &[Vec<f32>]) -> AppResult<Self> {
        let first = vectors.first().ok_or(AppError::EmptyBatch)?;
        let mut index = Self::new(first.len())?;

        // Validate the whole batch before touching the buffer
        if let Some(bad) = vectors.iter().find(|v| v.len() != index.dimensions) {
            return Err(AppError::DimensionMismatch {
                expected: index.dimensions,
                actual: bad.len(),
            });
        }

        index.data.reserve(vectors.len() * index.dimensions);
        for vector in vectors {
            index.data.extend_from_slice(vector);
        }

        tracing::debug!(
            "Built flat L2 index with {} rows of dimension {}",
            vectors.len(),
            index.dimensions
        );
        Ok(index)
    }

    fn row(&self, row: usize) -> &[f32] {
        let start = row * self.dimensions;
        &self.data[start..start + self.dimensions]
    }

    /// Persist the index to `path`.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }

    /// Load an index previously written by [`save`](Self::save).
    pub fn load(path: &Path) -> AppResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.data.len() * 4);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(self.dimensions as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for value in &self.data {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> AppResult<Self> {
        if bytes.len() < HEADER_LEN || &bytes[0..4] != MAGIC {
            return Err(AppError::CorruptArtifact(
                "vector index header is missing or has a bad magic".to_string(),
            ));
        }

        let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if version != FORMAT_VERSION {
            return Err(AppError::CorruptArtifact(format!(
                "unsupported vector index version {} (expected {})",
                version, FORMAT_VERSION
            )));
        }

        let dimensions = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        let mut rows_bytes = [0u8; 8];
        rows_bytes.copy_from_slice(&bytes[12..20]);
        let rows = u64::from_le_bytes(rows_bytes) as usize;

        let body = &bytes[HEADER_LEN..];
        let expected_len = rows
            .checked_mul(dimensions)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| AppError::CorruptArtifact("vector index size overflows".to_string()))?;
        if dimensions == 0 || body.len() != expected_len {
            return Err(AppError::CorruptArtifact(format!(
                "vector index body holds {} bytes, header promises {} rows of dimension {}",
                body.len(),
                rows,
                dimensions
            )));
        }

        let data = body
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self { dimensions, data })
    }
}

impl VectorIndex for FlatL2Index {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn len(&self) -> usize {
        self.data.len() / self.dimensions
    }

    fn add(&mut self, vector: &[f32]) -> AppResult<usize> {
        if vector.len() != self.dimensions {
            return Err(AppError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        let row = self.len();
        self.data.extend_from_slice(vector);
        Ok(row)
    }

    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<Neighbor>> {
        if query.len() != self.dimensions {
            return Err(AppError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let mut scored: Vec<Neighbor> = (0..self.len())
            .map(|row| Neighbor {
                row: row as i64,
                distance: squared_l2(query, self.row(row)),
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.row.cmp(&b.row))
        });
        scored.truncate(k);
        let padding = k - scored.len();
        scored
            .try_reserve_exact(padding)
            .map_err(|_| AppError::Other(format!("cannot pad search results to k = {}", k)))?;
        scored.resize(k, Neighbor::sentinel());

        Ok(scored)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> FlatL2Index {
        FlatL2Index::build(&[
            vec![0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![0.0, 2.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_build_rejects_empty_batch() {
        assert!(matches!(FlatL2Index::build(&[]), Err(AppError::EmptyBatch)));
    }

    #[test]
    fn test_build_rejects_ragged_batch() {
        let result = FlatL2Index::build(&[vec![1.0, 2.0], vec![1.0]]);
        assert!(matches!(
            result,
            Err(AppError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_search_orders_by_ascending_distance() {
        let index = sample();
        let results = index.search(&[0.9, 0.0, 0.0], 3).unwrap();

        let rows: Vec<i64> = results.iter().map(|n| n.row).collect();
        assert_eq!(rows, vec![1, 0, 2]);
        assert!((results[0].distance - 0.01).abs() < 1e-6);
        assert!((results[1].distance - 0.81).abs() < 1e-6);
    }

    #[test]
    fn test_search_pads_with_sentinels() {
        let index = sample();
        let results = index.search(&[0.0, 0.0, 0.0], 5).unwrap();

        assert_eq!(results.len(), 5);
        assert!(results[..3].iter().all(|n| !n.is_sentinel()));
        assert!(results[3..].iter().all(|n| n.row == SENTINEL_ROW));
    }

    #[test]
    fn test_search_with_unbounded_k_does_not_panic() {
        let index = sample();
        assert!(index.search(&[0.0, 0.0, 0.0], usize::MAX).is_err());
    }

    #[test]
    fn test_add_then_self_match_has_zero_distance() {
        let mut index = sample();
        let vector = vec![0.3, -0.7, 4.0];
        let row = index.add(&vector).unwrap();

        let results = index.search(&vector, 1).unwrap();
        assert_eq!(results[0].row, row as i64);
        assert!(results[0].distance.abs() < 1e-6);
    }

    #[test]
    fn test_add_dimension_mismatch_leaves_index_unchanged() {
        let mut index = sample();
        let before = index.clone();

        let result = index.add(&[1.0, 2.0]);
        assert!(matches!(
            result,
            Err(AppError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert_eq!(index, before);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_search_wrong_query_dimension() {
        assert!(sample().search(&[1.0], 1).is_err());
    }

    #[test]
    fn test_save_load_reproduces_results() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vectors.bin");
        let index = sample();
        index.save(&path).unwrap();

        let loaded = FlatL2Index::load(&path).unwrap();
        assert_eq!(loaded, index);

        for query in [[0.9, 0.0, 0.0], [0.0, 1.5, 0.2], [-3.0, 0.5, 9.0]] {
            for k in 0..5 {
                assert_eq!(
                    index.search(&query, k).unwrap(),
                    loaded.search(&query, k).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_load_rejects_truncated_body() {
        let mut bytes = sample().to_bytes();
        bytes.truncate(bytes.len() - 2);
        assert!(matches!(
            FlatL2Index::from_bytes(&bytes),
            Err(AppError::CorruptArtifact(_))
        ));
    }

    #[test]
    fn test_load_rejects_bad_magic() {
        let mut bytes = sample().to_bytes();
        bytes[0] = b'X';
        assert!(FlatL2Index::from_bytes(&bytes).is_err());
    }
}
