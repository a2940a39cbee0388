//! Cross-process advisory lock on a document store.
//!
//! Complements the in-process gate held by [`crate::service::SearchService`]:
//! co-located processes sharing one data directory take an exclusive lock to
//! mutate the store and a shared lock to read it.

use docseek_core::{AppError, AppResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// Held file lock; released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
    mode: LockMode,
}

impl StoreLock {
    /// Block (on the blocking pool) until an exclusive lock is held.
    pub async fn exclusive(path: &Path) -> AppResult<Self> {
        Self::acquire(path, LockMode::Exclusive).await
    }

    /// Block (on the blocking pool) until a shared lock is held.
    pub async fn shared(path: &Path) -> AppResult<Self> {
        Self::acquire(path, LockMode::Shared).await
    }

    async fn acquire(path: &Path, mode: LockMode) -> AppResult<Self> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::acquire_blocking(path, mode))
            .await
            .map_err(|e| AppError::Other(format!("Lock task failed: {}", e)))?
    }

    fn acquire_blocking(path: PathBuf, mode: LockMode) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match mode {
            LockMode::Exclusive => FileExt::lock_exclusive(&file)?,
            LockMode::Shared => FileExt::lock_shared(&file)?,
        }

        tracing::debug!("Acquired {:?} store lock at {:?}", mode, path);
        Ok(Self { file, path, mode })
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to release store lock at {:?}: {}", self.path, e);
        }
    }
}
