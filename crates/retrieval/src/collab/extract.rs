//! Source file text extraction.

use docseek_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

/// Turns a source document into lower-cased plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> AppResult<String>;
}

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Html,
    PlainText,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("html") | Some("htm") => Self::Html,
            Some("txt") | Some("text") | Some("csv") | Some("log") => Self::PlainText,
            _ => Self::Unknown,
        }
    }
}

/// Extractor for UTF-8 text formats. Markdown and HTML markup is stripped;
/// anything that looks binary is refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> AppResult<String> {
        let bytes = fs::read(path)
            .map_err(|e| AppError::Extraction(format!("Failed to read {:?}: {}", path, e)))?;

        let raw = String::from_utf8(bytes)
            .map_err(|_| AppError::Extraction(format!("{:?} is not valid UTF-8 text", path)))?;
        if !is_likely_text(&raw) {
            return Err(AppError::Extraction(format!(
                "{:?} looks like a binary file",
                path
            )));
        }

        let cleaned = match ContentType::from_path(path) {
            ContentType::Markdown => clean_markdown(&raw),
            ContentType::Html => clean_html(&raw),
            ContentType::PlainText | ContentType::Unknown => raw,
        };

        Ok(cleaned.to_lowercase())
    }
}

/// Clean markdown by removing excess formatting.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        // Skip horizontal rules and code fences
        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

/// Strip HTML tags along with script and style bodies.
fn clean_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;

    for (i, ch) in text.char_indices() {
        if ch == '<' {
            in_tag = true;

            let rest = &text[i..];
            if starts_with_ignore_case(rest, "<script") {
                in_script = true;
            } else if starts_with_ignore_case(rest, "</script") {
                in_script = false;
            } else if starts_with_ignore_case(rest, "<style") {
                in_style = true;
            } else if starts_with_ignore_case(rest, "</style") {
                in_style = false;
            }
        } else if ch == '>' {
            in_tag = false;
            // Keep words in adjacent elements apart
            result.push(' ');
        } else if !in_tag && !in_script && !in_style {
            result.push(ch);
        }
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn is_likely_text(data: &str) -> bool {
    !data.contains('\0')
}
