//! Generation-stamped persistence of the (provider, vectors, registry) triple.
//!
//! Every commit writes a complete `gen-<n>/` directory and then atomically
//! replaces the `CURRENT` manifest, which names the live generation and the
//! SHA-256 of each artifact. Readers only ever follow `CURRENT`, so they see
//! either the previous or the new triple, never a mix. Generation
//! directories not named by `CURRENT` are garbage and are swept after the
//! next successful commit.

use crate::config::{parse_generation_dir, StorePaths, FILENAMES_FILE, PROVIDER_FILE, VECTORS_FILE};
use crate::embeddings::{restore_provider, EmbeddingProvider, ProviderState};
use crate::registry::FilenameRegistry;
use crate::vector_index::{FlatL2Index, VectorIndex};
use chrono::{DateTime, Utc};
use docseek_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

const MANIFEST_VERSION: u32 = 1;

/// SHA-256 (lowercase hex) of each artifact in a generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactChecksums {
    pub provider: String,
    pub vectors: String,
    pub filenames: String,
}

/// The commit record stored in `index/CURRENT`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub generation: u64,
    pub committed_at: DateTime<Utc>,
    pub documents: usize,
    pub dimensions: usize,
    pub provider: String,
    pub model: String,
    pub checksums: ArtifactChecksums,
}

/// A fully loaded, mutually consistent triple.
#[derive(Debug)]
pub struct Snapshot {
    pub provider: Box<dyn EmbeddingProvider>,
    pub index: FlatL2Index,
    pub registry: FilenameRegistry,
    pub generation: u64,
}

/// Reads and commits snapshots below a [`StorePaths`] layout.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    paths: StorePaths,
}

impl SnapshotStore {
    pub fn new(paths: StorePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Read the current manifest; `None` means the store is uninitialized.
    pub fn read_manifest(&self) -> AppResult<Option<Manifest>> {
        let path = self.paths.manifest_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let manifest: Manifest = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::CorruptArtifact(format!("manifest {:?} is unreadable: {}", path, e))
        })?;

        if manifest.format_version != MANIFEST_VERSION {
            return Err(AppError::CorruptArtifact(format!(
                "unsupported manifest version {} (expected {})",
                manifest.format_version, MANIFEST_VERSION
            )));
        }

        Ok(Some(manifest))
    }

    /// Load the current snapshot, or `None` when nothing has been committed.
    pub fn load(&self) -> AppResult<Option<Snapshot>> {
        let Some(manifest) = self.read_manifest()? else {
            return Ok(None);
        };

        let dir = self.paths.generation_dir(manifest.generation);
        let provider_bytes = read_artifact(&dir, PROVIDER_FILE, &manifest.checksums.provider)?;
        let vector_bytes = read_artifact(&dir, VECTORS_FILE, &manifest.checksums.vectors)?;
        let registry_bytes = read_artifact(&dir, FILENAMES_FILE, &manifest.checksums.filenames)?;

        let state: ProviderState = serde_json::from_slice(&provider_bytes).map_err(|e| {
            AppError::CorruptArtifact(format!("invalid provider state: {}", e))
        })?;
        let provider = restore_provider(&state)?;
        let index = FlatL2Index::from_bytes(&vector_bytes)?;
        let registry = FilenameRegistry::from_bytes(&registry_bytes)?;

        if provider.dimensions() != index.dimensions() {
            return Err(AppError::DimensionMismatch {
                expected: index.dimensions(),
                actual: provider.dimensions(),
            });
        }
        if index.len() != registry.len() || index.len() != manifest.documents {
            return Err(AppError::CorruptArtifact(format!(
                "generation {} holds {} vectors and {} filenames, manifest records {} documents",
                manifest.generation,
                index.len(),
                registry.len(),
                manifest.documents
            )));
        }

        tracing::debug!(
            "Loaded generation {} ({} documents, {} dimensions)",
            manifest.generation,
            index.len(),
            index.dimensions()
        );

        Ok(Some(Snapshot {
            provider,
            index,
            registry,
            generation: manifest.generation,
        }))
    }

    /// Persist a new generation and make it current.
    ///
    /// The manifest rename is the commit point; on any earlier failure the
    /// previous generation stays current.
    pub fn commit(
        &self,
        provider: &dyn EmbeddingProvider,
        index: &FlatL2Index,
        registry: &FilenameRegistry,
    ) -> AppResult<Manifest> {
        if index.len() != registry.len() {
            return Err(AppError::Other(format!(
                "refusing to commit {} vectors against {} filenames",
                index.len(),
                registry.len()
            )));
        }
        if provider.dimensions() != index.dimensions() {
            return Err(AppError::DimensionMismatch {
                expected: index.dimensions(),
                actual: provider.dimensions(),
            });
        }

        let generation = match self.read_manifest()? {
            Some(current) => current.generation + 1,
            None => 1,
        };

        let provider_bytes = serde_json::to_vec_pretty(&provider.state()?)?;
        let vector_bytes = index.to_bytes();
        let registry_bytes = registry.to_bytes()?;

        let dir = self.paths.generation_dir(generation);
        if dir.exists() {
            // Leftover from a commit that crashed before its rename
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        write_synced(&dir.join(PROVIDER_FILE), &provider_bytes)?;
        write_synced(&dir.join(VECTORS_FILE), &vector_bytes)?;
        write_synced(&dir.join(FILENAMES_FILE), &registry_bytes)?;

        let manifest = Manifest {
            format_version: MANIFEST_VERSION,
            generation,
            committed_at: Utc::now(),
            documents: index.len(),
            dimensions: index.dimensions(),
            provider: provider.provider_name().to_string(),
            model: provider.model_name().to_string(),
            checksums: ArtifactChecksums {
                provider: sha256_hex(&provider_bytes),
                vectors: sha256_hex(&vector_bytes),
                filenames: sha256_hex(&registry_bytes),
            },
        };
        self.write_manifest(&manifest)?;

        tracing::debug!(
            "Committed generation {} with {} documents",
            generation,
            manifest.documents
        );

        self.sweep(generation);
        Ok(manifest)
    }

    /// Delete the manifest and every generation.
    pub fn clear(&self) -> AppResult<()> {
        let dir = self.paths.index_dir();
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::debug!("Removed index directory {:?}", dir);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_manifest(&self, manifest: &Manifest) -> AppResult<()> {
        let path = self.paths.manifest_path();
        let tmp = self
            .paths
            .index_dir()
            .join(format!(".CURRENT.{}.tmp", uuid::Uuid::new_v4()));

        write_synced(&tmp, &serde_json::to_vec_pretty(manifest)?)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Best-effort removal of generations other than `keep` and of stray
    /// manifest temporaries.
    fn sweep(&self, keep: u64) {
        let entries = match fs::read_dir(self.paths.index_dir()) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Could not scan index directory for stale generations: {}", e);
                return;
            }
        };

        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let path = entry.path();

            let result = match parse_generation_dir(&name) {
                Some(generation) if generation != keep => fs::remove_dir_all(&path),
                None if name.starts_with(".CURRENT.") => fs::remove_file(&path),
                _ => continue,
            };

            match result {
                Ok(()) => tracing::debug!("Swept stale index entry {:?}", path),
                Err(e) => tracing::warn!("Failed to sweep {:?}: {}", path, e),
            }
        }
    }
}

fn read_artifact(dir: &Path, name: &str, checksum: &str) -> AppResult<Vec<u8>> {
    let path = dir.join(name);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(AppError::MissingArtifact(path.display().to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    if sha256_hex(&bytes) != checksum {
        return Err(AppError::CorruptArtifact(format!(
            "checksum of {} does not match the manifest",
            path.display()
        )));
    }

    Ok(bytes)
}

fn write_synced(path: &Path, bytes: &[u8]) -> AppResult<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
