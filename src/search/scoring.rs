//! Per-term scoring against the index.
//!
//! A term is resolved against the title table first, then the body table. Only
//! when neither holds the exact key do we fall back to a prefix scan, which
//! scores in the lower prefix tiers. Tier weights are strictly ordered:
//!
//! | tier          | weight |
//! |---------------|--------|
//! | title exact   | 15     |
//! | body exact    | 8      |
//! | title prefix  | 5      |
//! | body prefix   | 2      |
//!
//! A location bonus (title +2, first body occurrence +1) refines scores inside a
//! tier without ever crossing into the next one. When a document is hit several
//! times for the same term, it keeps its single best score.

use super::index::{IndexStore, MatchLocation, Posting, TermTable};
use ahash::AHashMap;
use rust_stemmers::{Algorithm, Stemmer};

/// How a term reached a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchTier {
    BodyPrefix,
    TitlePrefix,
    BodyExact,
    TitleExact,
}

impl MatchTier {
    /// Base weight of the tier.
    pub const fn weight(self) -> u32 {
        match self {
            Self::TitleExact => 15,
            Self::BodyExact => 8,
            Self::TitlePrefix => 5,
            Self::BodyPrefix => 2,
        }
    }
}

/// Bonus for the location recorded in the posting. Always below the gap
/// between adjacent tiers.
pub const fn location_bonus(location: MatchLocation) -> u32 {
    match location {
        MatchLocation::Title => 2,
        MatchLocation::BodyFirst => 1,
        MatchLocation::BodyLater => 0,
    }
}

/// Everything one query term contributed.
#[derive(Debug, Clone, Default)]
pub struct TermHits {
    /// The query term as typed (normalized)
    pub term: String,
    /// Index keys that produced hits, in lookup order
    pub keys: Vec<String>,
    /// Best score per document
    pub scores: AHashMap<usize, u32>,
}

impl TermHits {
    fn new(term: &str) -> Self {
        Self {
            term: term.to_string(),
            ..Self::default()
        }
    }

    fn absorb(&mut self, key: &str, postings: &[Posting], tier: MatchTier) {
        if self.keys.iter().all(|existing| existing != key) {
            self.keys.push(key.to_string());
        }
        for posting in postings {
            let score = tier.weight() + location_bonus(posting.location);
            self.scores
                .entry(posting.doc)
                .and_modify(|best| *best = (*best).max(score))
                .or_insert(score);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Resolves single terms against an [`IndexStore`].
pub struct TermResolver {
    /// Present when stemmed exact lookups are enabled
    stemmer: Option<Stemmer>,
}

impl std::fmt::Debug for TermResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermResolver")
            .field("stem_fallback", &self.stemmer.is_some())
            .finish()
    }
}

impl Default for TermResolver {
    fn default() -> Self {
        Self::new(false)
    }
}

impl TermResolver {
    pub fn new(stem_fallback: bool) -> Self {
        Self {
            stemmer: stem_fallback.then(|| Stemmer::create(Algorithm::English)),
        }
    }

    /// Score every document the term reaches. Never fails; an unknown term
    /// simply yields no hits.
    pub fn resolve(&self, term: &str, index: &IndexStore) -> TermHits {
        let mut hits = TermHits::new(term);

        if resolve_exact(term, index, &mut hits) {
            return hits;
        }

        // The index stores stems; try the query word's stem as an exact key
        if let Some(stemmer) = &self.stemmer {
            let stemmed = stemmer.stem(term);
            if stemmed != term && resolve_exact(&stemmed, index, &mut hits) {
                tracing::trace!("Resolved '{}' through stem '{}'", term, stemmed);
                return hits;
            }
        }

        resolve_prefix(index.title_terms(), term, MatchTier::TitlePrefix, &mut hits);
        resolve_prefix(index.terms(), term, MatchTier::BodyPrefix, &mut hits);

        tracing::trace!(
            "Resolved '{}' by prefix: {} keys, {} documents",
            term,
            hits.keys.len(),
            hits.scores.len()
        );
        hits
    }
}

/// Returns true if either table holds the exact key, even with no postings.
fn resolve_exact(key: &str, index: &IndexStore, hits: &mut TermHits) -> bool {
    let title = index.title_terms().get(key);
    let body = index.terms().get(key);

    if let Some(postings) = title {
        hits.absorb(key, postings, MatchTier::TitleExact);
    }
    if let Some(postings) = body {
        hits.absorb(key, postings, MatchTier::BodyExact);
    }

    title.is_some() || body.is_some()
}

fn resolve_prefix(table: &TermTable, stem: &str, tier: MatchTier, hits: &mut TermHits) {
    for (key, postings) in table.prefix(stem) {
        hits.absorb(key, postings, tier);
    }
}
