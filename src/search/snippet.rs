//! Highlighted excerpts from document text.
//!
//! Extraction is synchronous and pure: fetching the text is the caller's job.
//! All query terms are compiled into one case-insensitive alternation so the
//! leftmost occurrence of any term wins, with longer terms preferred at the same
//! position. Word terms also match longer words they prefix (`error` highlights
//! `errors`), mirroring the prefix fallback of the term resolver.

use super::tokenize::{NormalizedTerm, is_word_char};
use regex::{Regex, RegexBuilder};
use serde::Serialize;

/// Characters of context kept on each side of the match.
pub const DEFAULT_SNIPPET_CONTEXT: usize = 90;

/// Upper bound on the compiled pattern, far above any realistic query.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// A short excerpt around the first occurrence of a query term.
///
/// `prefix` and `suffix` each hold at most `context` characters and never start
/// or end inside a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    pub prefix: String,
    pub highlighted: String,
    pub suffix: String,
    /// Text before `prefix` was dropped
    pub truncated_start: bool,
    /// Text after `suffix` was dropped
    pub truncated_end: bool,
}

impl Snippet {
    /// Single-line rendering with `**` around the match and ellipses where text
    /// was dropped.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        if self.truncated_start {
            out.push_str("...");
        }
        out.push_str(&collapse_whitespace(&self.prefix));
        out.push_str("**");
        out.push_str(&collapse_whitespace(&self.highlighted));
        out.push_str("**");
        out.push_str(&collapse_whitespace(&self.suffix));
        if self.truncated_end {
            out.push_str("...");
        }
        out
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Compiled matcher for one query, reusable across every result of that query.
#[derive(Debug, Clone)]
pub struct SnippetExtractor {
    pattern: Option<Regex>,
    context: usize,
}

impl SnippetExtractor {
    pub fn new(terms: &[NormalizedTerm], context: usize) -> Self {
        Self {
            pattern: build_pattern(terms),
            context,
        }
    }

    /// Excerpt around the first match, or `None` if no term occurs in `text`.
    pub fn extract(&self, text: &str) -> Option<Snippet> {
        let found = self.pattern.as_ref()?.find(text)?;
        let (start, end) = (found.start(), found.end());

        let before = &text[..start];
        let after = &text[end..];
        let lo = window_start(before, self.context);
        let hi = window_end(after, self.context);

        Some(Snippet {
            prefix: before[lo..].trim_start().to_string(),
            highlighted: found.as_str().to_string(),
            suffix: after[..hi].trim_end().to_string(),
            truncated_start: !before[..lo].trim().is_empty(),
            truncated_end: !after[hi..].trim().is_empty(),
        })
    }
}

/// One-shot convenience over [`SnippetExtractor`].
pub fn extract(text: &str, terms: &[NormalizedTerm], context: usize) -> Option<Snippet> {
    SnippetExtractor::new(terms, context).extract(text)
}

fn build_pattern(terms: &[NormalizedTerm]) -> Option<Regex> {
    let mut alternatives: Vec<String> = terms
        .iter()
        .filter(|term| !term.as_str().is_empty())
        .map(|term| match term {
            NormalizedTerm::Word(word) => format!(r"{}\w*", regex::escape(word)),
            NormalizedTerm::Phrase(_) => {
                let words: Vec<String> = term.words().map(regex::escape).collect();
                format!(r"{}\b", words.join(r"\s+"))
            }
        })
        .collect();

    if alternatives.is_empty() {
        return None;
    }

    // Leftmost-first alternation: longer terms must come first
    alternatives.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let source = format!(r"\b(?:{})", alternatives.join("|"));
    match RegexBuilder::new(&source)
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
    {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            tracing::warn!("Failed to compile snippet pattern: {}", e);
            None
        }
    }
}

/// Byte offset in `before` where the prefix starts: at most `context`
/// characters back, moved forward past any partial word.
fn window_start(before: &str, context: usize) -> usize {
    let lo = before
        .char_indices()
        .rev()
        .take(context)
        .last()
        .map_or(before.len(), |(i, _)| i);

    if before[..lo].chars().next_back().is_some_and(is_word_char) {
        before.len() - before[lo..].trim_start_matches(is_word_char).len()
    } else {
        lo
    }
}

/// Byte offset in `after` where the suffix ends: at most `context`
/// characters forward, moved back before any partial word.
fn window_end(after: &str, context: usize) -> usize {
    let hi = after
        .char_indices()
        .nth(context)
        .map_or(after.len(), |(i, _)| i);

    if after[hi..].chars().next().is_some_and(is_word_char) {
        after[..hi].trim_end_matches(is_word_char).len()
    } else {
        hi
    }
}
