//! Query tokenization.
//!
//! Queries are split on non-word boundaries, lower-cased, filtered by length and
//! stop words, and deduplicated in first-occurrence order. Underscores count as
//! word characters because the index keeps identifiers such as `parse_script`
//! whole. Quoted segments survive as a single [`NormalizedTerm::Phrase`].

use ahash::AHashSet;
use std::fmt;

/// Minimum term length (in characters) kept by default.
pub const DEFAULT_MIN_TERM_LENGTH: usize = 3;

/// English stop words that Sphinx leaves out of its index.
pub(crate) const STOP_WORDS: &[&str] = &[
    "a", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "near", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
    "these", "they", "this", "to", "was", "will", "with",
];

/// Characters that belong to a word for splitting and boundary checks.
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A normalized search term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NormalizedTerm {
    /// A single lower-cased word.
    Word(String),
    /// A quoted multi-word segment. Words are lower-cased and joined by one space.
    /// Only matched against document text, never against the term index.
    Phrase(String),
}

impl NormalizedTerm {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Word(text) | Self::Phrase(text) => text,
        }
    }

    pub const fn is_phrase(&self) -> bool {
        matches!(self, Self::Phrase(_))
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.as_str().split(' ')
    }
}

impl fmt::Display for NormalizedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(text) => f.write_str(text),
            Self::Phrase(text) => write!(f, "\"{}\"", text),
        }
    }
}

/// Splits raw query strings into normalized terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tokenizer {
    min_term_length: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_TERM_LENGTH)
    }
}

impl Tokenizer {
    pub const fn new(min_term_length: usize) -> Self {
        Self { min_term_length }
    }

    /// Tokenize a query. An empty result is a valid outcome, not an error.
    pub fn tokenize(&self, query: &str) -> Vec<NormalizedTerm> {
        let mut terms = Vec::new();
        let mut seen = AHashSet::new();
        let mut push = |term: NormalizedTerm| {
            if seen.insert(term.clone()) {
                terms.push(term);
            }
        };

        let segments: Vec<&str> = query.split('"').collect();
        let last = segments.len() - 1;

        for (i, segment) in segments.iter().enumerate() {
            // Odd segments sit between quotes; an unterminated quote reads as plain text
            let quoted = i % 2 == 1 && i < last;

            if quoted {
                let words: Vec<String> = split_words(segment).map(str::to_lowercase).collect();
                match words.len() {
                    0 => {}
                    1 => {
                        if self.accepts(&words[0]) {
                            push(NormalizedTerm::Word(words[0].clone()));
                        }
                    }
                    // A phrase needs at least one word worth scoring
                    _ if words.iter().any(|word| self.accepts(word)) => {
                        push(NormalizedTerm::Phrase(words.join(" ")));
                    }
                    _ => {}
                }
            } else {
                for word in split_words(segment) {
                    let word = word.to_lowercase();
                    if self.accepts(&word) {
                        push(NormalizedTerm::Word(word));
                    }
                }
            }
        }

        terms
    }

    /// Words to resolve against the term index: every plain word plus the
    /// words of each phrase that would survive filtering on their own.
    pub fn scoring_words(&self, terms: &[NormalizedTerm]) -> Vec<String> {
        let mut seen = AHashSet::new();
        terms
            .iter()
            .flat_map(|term| {
                let filter_phrase_words = term.is_phrase();
                term.words()
                    .filter(move |word| !filter_phrase_words || self.accepts(word))
            })
            .filter(|word| seen.insert(*word))
            .map(str::to_string)
            .collect()
    }

    fn accepts(&self, word: &str) -> bool {
        word.chars().count() >= self.min_term_length && !STOP_WORDS.contains(&word)
    }
}

fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_word_char(c))
        .filter(|word| !word.is_empty())
}
