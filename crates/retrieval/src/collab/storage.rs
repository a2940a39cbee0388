//! Extracted text cache and raw document storage.

use docseek_core::{AppError, AppResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Longest storable document id; `<id>.txt` must still fit a filename.
pub const MAX_ID_LEN: usize = 240;

/// Check that an id is usable as a single filename.
pub fn validate_id(id: &str) -> AppResult<()> {
    let invalid = id.trim().is_empty()
        || id == "."
        || id == ".."
        || id.len() > MAX_ID_LEN
        || id.chars().any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control());

    if invalid {
        return Err(AppError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Keyed store of extracted document text.
pub trait TextStore: Send + Sync {
    fn save_text(&self, id: &str, text: &str) -> AppResult<()>;

    /// Load a document's text; fails with `DocumentTextMissing` when absent.
    fn load_text(&self, id: &str) -> AppResult<String>;

    fn remove_text(&self, id: &str) -> AppResult<()>;

    fn clear(&self) -> AppResult<()>;
}

/// Keyed store of raw uploaded bytes.
pub trait DocumentStore: Send + Sync {
    fn put(&self, id: &str, bytes: &[u8]) -> AppResult<()>;

    fn get(&self, id: &str) -> AppResult<Option<Vec<u8>>>;

    fn remove(&self, id: &str) -> AppResult<()>;

    /// Ids of every stored document, sorted.
    fn list(&self) -> AppResult<Vec<String>>;

    fn clear(&self) -> AppResult<()>;
}

/// Text store keeping one `<id>.txt` file per document.
#[derive(Debug, Clone)]
pub struct FsTextStore {
    dir: PathBuf,
}

impl FsTextStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, id: &str) -> AppResult<PathBuf> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{}.txt", id)))
    }
}

impl TextStore for FsTextStore {
    fn save_text(&self, id: &str, text: &str) -> AppResult<()> {
        let path = self.path(id)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, text)?;
        tracing::debug!("Saved text for '{}' ({} bytes)", id, text.len());
        Ok(())
    }

    fn load_text(&self, id: &str) -> AppResult<String> {
        match fs::read_to_string(self.path(id)?) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::DocumentTextMissing(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn remove_text(&self, id: &str) -> AppResult<()> {
        remove_file_if_exists(self.path(id)?)
    }

    fn clear(&self) -> AppResult<()> {
        remove_dir_if_exists(&self.dir)
    }
}

/// Document store keeping raw bytes under their id.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    dir: PathBuf,
}

impl FsDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, id: &str) -> AppResult<PathBuf> {
        validate_id(id)?;
        Ok(self.dir.join(id))
    }
}

impl DocumentStore for FsDocumentStore {
    fn put(&self, id: &str, bytes: &[u8]) -> AppResult<()> {
        let path = self.path(id)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    fn get(&self, id: &str) -> AppResult<Option<Vec<u8>>> {
        match fs::read(self.path(id)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, id: &str) -> AppResult<()> {
        remove_file_if_exists(self.path(id)?)
    }

    fn list(&self) -> AppResult<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn clear(&self) -> AppResult<()> {
        remove_dir_if_exists(&self.dir)
    }
}

fn remove_file_if_exists(path: PathBuf) -> AppResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn remove_dir_if_exists(path: &Path) -> AppResult<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
