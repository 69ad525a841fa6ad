//! Query engine over a Sphinx search index.
//!
//! This module provides index loading, tokenization, per-term scoring, result
//! combination and ranking, snippet extraction, and API object lookup.

// Module declarations
pub(crate) mod combine;
pub(crate) mod index;
pub(crate) mod objects;
pub(crate) mod query;
pub(crate) mod rank;
pub(crate) mod scoring;
pub(crate) mod snippet;
pub(crate) mod tokenize;

// Public re-exports (used via lib.rs)
pub use combine::{AggregateScore, COMPLETENESS_BONUS, ScoreTier, combine, completeness_bonus};
pub use index::{
    Document, EnvMetadata, IndexInfo, IndexStore, MatchLocation, ObjectEntry, ObjectPriority,
    ObjectType, Posting, SUPPORTED_ENV_VERSIONS, Section, TermTable,
};
pub use objects::{NameMatch, OBJECT_PATH_SEPARATOR, ObjectMatch, ObjectQuery, match_objects};
pub use query::{SearchHit, SearchOutcome, SearchSession, search, search_with_snippets};
pub use rank::{RankedDoc, rank};
pub use scoring::{MatchTier, TermHits, TermResolver, location_bonus};
pub use snippet::{DEFAULT_SNIPPET_CONTEXT, Snippet, SnippetExtractor, extract};
pub use tokenize::{DEFAULT_MIN_TERM_LENGTH, NormalizedTerm, Tokenizer};
