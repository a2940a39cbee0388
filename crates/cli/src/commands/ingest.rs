//! Ingest command handler.
//!
//! Walks files and directories, extracts their text and indexes everything
//! in one transaction.

use clap::Args;
use docseek_core::AppResult;
use docseek_retrieval::{DocumentInput, PlainTextExtractor, SearchService, TextExtractor};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Index documents from files and directories
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Files or directories to ingest
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Only ingest paths containing one of these substrings
    #[arg(long)]
    pub include: Vec<String>,

    /// Skip paths containing any of these substrings
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Do not keep a copy of the raw file bytes
    #[arg(long)]
    pub no_store: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, service: &SearchService) -> AppResult<()> {
        tracing::info!("Executing ingest command for {} paths", self.paths.len());

        let files = self.collect_files();
        let extractor = PlainTextExtractor;

        let mut inputs = Vec::with_capacity(files.len());
        let mut failed = Vec::new();
        for path in &files {
            match self.read_document(&extractor, path) {
                Ok(input) => inputs.push(input),
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", path, e);
                    failed.push(path.display().to_string());
                }
            }
        }

        let receipt = service.ingest_batch(inputs).await?;

        if self.json {
            let output = serde_json::json!({
                "accepted": receipt.accepted,
                "skipped": receipt.skipped,
                "failed": failed,
                "generation": receipt.generation,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Indexed {} documents ({} empty, {} unreadable)",
                receipt.accepted.len(),
                receipt.skipped.len(),
                failed.len()
            );
            for id in &receipt.accepted {
                println!("  {}", id);
            }
        }

        Ok(())
    }

    fn read_document(&self, extractor: &dyn TextExtractor, path: &Path) -> AppResult<DocumentInput> {
        let text = extractor.extract(path)?;
        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let input = DocumentInput::new(id, text);
        if self.no_store {
            Ok(input)
        } else {
            Ok(input.with_raw(std::fs::read(path)?))
        }
    }

    fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in &self.paths {
            if path.is_file() {
                if self.should_include(path) {
                    files.push(path.clone());
                }
            } else if path.is_dir() {
                for entry in WalkDir::new(path)
                    .follow_links(false)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
                    .filter_map(|e| e.ok())
                {
                    let entry_path = entry.path();
                    if entry_path.is_file() && self.should_include(entry_path) {
                        files.push(entry_path.to_path_buf());
                    }
                }
            } else {
                tracing::warn!("Path {:?} does not exist", path);
            }
        }

        files
    }

    /// Check if a file should be included based on patterns.
    fn should_include(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        if self.exclude.iter().any(|p| path_str.contains(p.as_str())) {
            return false;
        }

        self.include.is_empty() || self.include.iter().any(|p| path_str.contains(p.as_str()))
    }
}

/// Hidden entries (including `.docseek/` itself) are never ingested.
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
