//! On-disk layout of a document store.

use docseek_core::{AppConfig, AppResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the manifest file that marks the current generation.
pub const MANIFEST_FILE: &str = "CURRENT";

pub const PROVIDER_FILE: &str = "provider.json";
pub const VECTORS_FILE: &str = "vectors.bin";
pub const FILENAMES_FILE: &str = "filenames.json";

const GENERATION_PREFIX: &str = "gen-";

/// Paths of every artifact below a store's data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    root: PathBuf,
}

impl StorePaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: data_dir.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.data_dir())
    }

    /// Get the data directory itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the directory holding the manifest and generation directories.
    pub fn index_dir(&self) -> PathBuf {
        self.root.join("index")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.index_dir().join(MANIFEST_FILE)
    }

    /// Get the directory of one committed or staged generation.
    pub fn generation_dir(&self, generation: u64) -> PathBuf {
        self.index_dir()
            .join(format!("{}{}", GENERATION_PREFIX, generation))
    }

    /// Get the cross-process lock file. Lives outside `index/` so a reset
    /// never removes a file another process holds a lock on.
    pub fn lock_path(&self) -> PathBuf {
        self.root.join("docseek.lock")
    }

    /// Get the extracted text cache directory.
    pub fn texts_dir(&self) -> PathBuf {
        self.root.join("texts")
    }

    /// Get the raw document directory.
    pub fn files_dir(&self) -> PathBuf {
        self.root.join("files")
    }

    /// Create the data directory if missing.
    pub fn ensure_root(&self) -> AppResult<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

/// Parse a generation number out of a `gen-<n>` directory name.
pub fn parse_generation_dir(name: &str) -> Option<u64> {
    name.strip_prefix(GENERATION_PREFIX)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let paths = StorePaths::new("/data/.docseek");

        assert_eq!(
            paths.manifest_path(),
            PathBuf::from("/data/.docseek/index/CURRENT")
        );
        assert_eq!(
            paths.generation_dir(3),
            PathBuf::from("/data/.docseek/index/gen-3")
        );
        assert_eq!(paths.lock_path(), PathBuf::from("/data/.docseek/docseek.lock"));
        assert_eq!(paths.texts_dir(), PathBuf::from("/data/.docseek/texts"));
        assert_eq!(paths.files_dir(), PathBuf::from("/data/.docseek/files"));
    }

    #[test]
    fn test_from_config_uses_data_dir() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..Default::default()
        };

        let paths = StorePaths::from_config(&config);
        assert_eq!(paths.root(), temp.path().join(".docseek"));

        paths.ensure_root().unwrap();
        assert!(paths.root().is_dir());
    }

    #[test]
    fn test_parse_generation_dir() {
        assert_eq!(parse_generation_dir("gen-12"), Some(12));
        assert_eq!(parse_generation_dir("gen-"), None);
        assert_eq!(parse_generation_dir("gen-12.tmp"), None);
        assert_eq!(parse_generation_dir("CURRENT"), None);
    }
}
