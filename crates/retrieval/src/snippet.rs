//! Sentence-aligned snippet extraction and occurrence counting.
//!
//! Offsets are byte positions into the text, but every window is measured in
//! characters so multi-byte text never splits a code point.

use crate::query::QueryMode;
use serde::{Serialize, Serializer};
use std::fmt;

/// Rendered in place of a snippet when nothing in the document matched.
pub const SNIPPET_NOT_FOUND: &str = "Snippet not found.";

/// Characters of context kept on each side of a match by default.
pub const DEFAULT_CONTEXT_SIZE: usize = 255;

const SENTENCE_BREAK: &str = ". ";

/// Excerpt of a document around a query match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snippet {
    Found(String),
    NotFound,
}

impl Snippet {
    pub fn is_found(&self) -> bool {
        matches!(self, Snippet::Found(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Snippet::Found(text) => text,
            Snippet::NotFound => SNIPPET_NOT_FOUND,
        }
    }
}

impl fmt::Display for Snippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Snippet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Extract the snippet and occurrence count for `mode` from lower-cased text.
pub fn extract(mode: &QueryMode, text: &str, context_size: usize) -> (Snippet, usize) {
    match mode {
        QueryMode::Exact(phrase) => (
            exact_snippet(phrase, text, context_size),
            count_non_overlapping(text, phrase),
        ),
        QueryMode::Approximate(query) => (
            approximate_snippet(query, text, context_size),
            query
                .split_whitespace()
                .map(|word| count_non_overlapping(text, word))
                .sum(),
        ),
    }
}

/// Snippet around the first occurrence of `phrase`.
pub fn exact_snippet(phrase: &str, text: &str, context_size: usize) -> Snippet {
    if phrase.is_empty() {
        return Snippet::NotFound;
    }
    match text.find(phrase) {
        Some(start) => window(text, start, start + phrase.len(), context_size),
        None => Snippet::NotFound,
    }
}

/// Snippet spanning the first occurrences of every query word that occurs.
pub fn approximate_snippet(query: &str, text: &str, context_size: usize) -> Snippet {
    let span = query
        .split_whitespace()
        .filter_map(|word| text.find(word).map(|start| (start, start + word.len())))
        .reduce(|(lo, hi), (start, end)| (lo.min(start), hi.max(end)));

    match span {
        Some((start, end)) => window(text, start, end, context_size),
        None => Snippet::NotFound,
    }
}

/// Count non-overlapping occurrences of `needle`.
pub fn count_non_overlapping(text: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    text.matches(needle).count()
}

/// Replace line breaks with spaces, collapse whitespace runs and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Widen `[start, end)` by `context_size` characters on both sides, then snap
/// outwards to the surrounding `". "` sentence breaks.
fn window(text: &str, start: usize, end: usize, context_size: usize) -> Snippet {
    let window_start = back_chars(text, start, context_size);
    let window_end = forward_chars(text, end, context_size);

    // A break counts only if it lies wholly before the window start
    let snapped_start = text[..window_start]
        .rfind(SENTENCE_BREAK)
        .map(|pos| pos + SENTENCE_BREAK.len())
        .unwrap_or(0);
    let snapped_end = text[window_end..]
        .find(SENTENCE_BREAK)
        .map(|pos| window_end + pos + SENTENCE_BREAK.len())
        .unwrap_or(text.len());

    Snippet::Found(normalize_whitespace(&text[snapped_start..snapped_end]))
}

fn back_chars(text: &str, from: usize, count: usize) -> usize {
    if count == 0 {
        return from;
    }
    text[..from]
        .char_indices()
        .rev()
        .nth(count - 1)
        .map(|(pos, _)| pos)
        .unwrap_or(0)
}

fn forward_chars(text: &str, from: usize, count: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(count)
        .map(|(pos, _)| from + pos)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOX: &str = "the quick brown fox. jumps over. the lazy dog.";

    #[test]
    fn test_exact_phrase() {
        let mode = QueryMode::parse("\"jumps over\"").unwrap();
        let (snippet, count) = extract(&mode, FOX, DEFAULT_CONTEXT_SIZE);

        assert!(snippet.as_str().contains("jumps over."));
        assert_eq!(count, 1);
    }

    #[test]
    fn test_approximate_words() {
        let mode = QueryMode::parse("fox dog").unwrap();
        let (snippet, count) = extract(&mode, FOX, DEFAULT_CONTEXT_SIZE);

        assert_eq!(snippet.as_str(), FOX);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_absent_phrase_renders_sentinel() {
        let mode = QueryMode::parse("\"purple elephant\"").unwrap();
        let (snippet, count) = extract(&mode, FOX, DEFAULT_CONTEXT_SIZE);

        assert_eq!(snippet, Snippet::NotFound);
        assert_eq!(snippet.to_string(), "Snippet not found.");
        assert_eq!(count, 0);

        assert_eq!(
            approximate_snippet("zebra yak", FOX, DEFAULT_CONTEXT_SIZE),
            Snippet::NotFound
        );
    }

    #[test]
    fn test_window_snaps_to_sentence_breaks() {
        let text = "alpha one. beta two. gamma three. delta four.";
        assert_eq!(
            exact_snippet("gamma", text, 3),
            Snippet::Found("beta two. gamma three.".to_string())
        );
    }

    #[test]
    fn test_window_without_breaks_spans_document() {
        let text = "no sentence breaks anywhere in this text";
        assert_eq!(
            exact_snippet("breaks", text, 2),
            Snippet::Found(text.to_string())
        );
    }

    #[test]
    fn test_zero_context_keeps_enclosing_sentence() {
        let text = "first part. the match is here. last part.";
        assert_eq!(
            exact_snippet("match", text, 0),
            Snippet::Found("the match is here.".to_string())
        );
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let text = "line one\nline\r\ntwo   spaced.  end";
        assert_eq!(
            exact_snippet("two", text, DEFAULT_CONTEXT_SIZE),
            Snippet::Found("line one line two spaced. end".to_string())
        );
    }

    #[test]
    fn test_multibyte_context_is_measured_in_chars() {
        let text = "ééééé. ààààà target ööööö. ünicode.";
        let snippet = exact_snippet("target", text, 4);
        assert_eq!(snippet.as_str(), "ààààà target ööööö.");
    }

    #[test]
    fn test_occurrence_counts() {
        assert_eq!(count_non_overlapping("aaaa", "aa"), 2);
        assert_eq!(count_non_overlapping("abc", ""), 0);

        // Per-word counts are summed even when the words overlap
        let mode = QueryMode::parse("the he").unwrap();
        let (_, count) = extract(&mode, FOX, DEFAULT_CONTEXT_SIZE);
        assert_eq!(count, 2 + 2);
    }

    #[test]
    fn test_snippet_serializes_as_text() {
        assert_eq!(
            serde_json::to_string(&Snippet::NotFound).unwrap(),
            "\"Snippet not found.\""
        );
        assert_eq!(
            serde_json::to_string(&Snippet::Found("abc".to_string())).unwrap(),
            "\"abc\""
        );
    }
}
