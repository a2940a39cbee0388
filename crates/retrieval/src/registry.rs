//! Filename registry: row position → document id.

use docseek_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

const FORMAT_VERSION: u32 = 1;

/// Ordered, append-only list of document ids.
///
/// Entry `i` names the document behind vector index row `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilenameRegistry {
    filenames: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    format_version: u32,
    filenames: Vec<String>,
}

impl FilenameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an id and return its position.
    pub fn append(&mut self, id: impl Into<String>) -> usize {
        self.filenames.push(id.into());
        self.filenames.len() - 1
    }

    /// Resolve a position to its id.
    pub fn resolve(&self, position: usize) -> AppResult<&str> {
        self.filenames
            .get(position)
            .map(String::as_str)
            .ok_or(AppError::OutOfRange {
                position,
                len: self.filenames.len(),
            })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.filenames.iter().any(|f| f == id)
    }

    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.filenames.iter().map(String::as_str)
    }

    pub fn to_bytes(&self) -> AppResult<Vec<u8>> {
        let file = RegistryFile {
            format_version: FORMAT_VERSION,
            filenames: self.filenames.clone(),
        };
        Ok(serde_json::to_vec_pretty(&file)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> AppResult<Self> {
        let file: RegistryFile = serde_json::from_slice(bytes)
            .map_err(|e| AppError::CorruptArtifact(format!("invalid filename registry: {}", e)))?;

        if file.format_version != FORMAT_VERSION {
            return Err(AppError::CorruptArtifact(format!(
                "unsupported filename registry version {} (expected {})",
                file.format_version, FORMAT_VERSION
            )));
        }

        Ok(Self {
            filenames: file.filenames,
        })
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        Self::from_bytes(&std::fs::read(path)?)
    }
}
