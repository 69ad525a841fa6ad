//! Query execution: tokenize, resolve, combine, rank, then attach snippets.
//!
//! Everything up to ranking is synchronous and never blocks. Snippets need the
//! full document text, so they are fetched afterwards for surviving results
//! only, concurrently but without disturbing ranked order. A [`SearchSession`]
//! abandons the snippet phase of a query as soon as a newer one begins.

use super::combine::{AggregateScore, combine};
use super::index::IndexStore;
use super::rank::rank;
use super::scoring::{TermHits, TermResolver};
use super::snippet::{Snippet, SnippetExtractor};
use super::tokenize::{NormalizedTerm, Tokenizer, is_word_char};
use crate::config::SearchOptions;
use crate::error::Superseded;
use crate::fetch::TextFetcher;
use futures::StreamExt;
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// One ranked result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub doc: usize,
    pub docname: String,
    pub title: String,
    /// Section to jump to; `None` is the top of the page
    pub anchor: Option<String>,
    pub score: AggregateScore,
    pub snippet: Option<Snippet>,
}

/// Results of one query, in ranked order.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Normalized query terms (phrases included)
    pub terms: Vec<NormalizedTerm>,
    pub hits: Vec<SearchHit>,
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Run the synchronous part of a query. Snippets are left empty.
///
/// A query that tokenizes to nothing, or matches nothing, yields an empty
/// outcome rather than an error.
pub fn search(index: &IndexStore, query: &str, options: &SearchOptions) -> SearchOutcome {
    let start = Instant::now();

    let tokenizer = Tokenizer::new(options.min_term_length);
    let terms = tokenizer.tokenize(query);
    let words = tokenizer.scoring_words(&terms);

    let resolver = TermResolver::new(options.stem_fallback);
    let term_hits: Vec<TermHits> = words
        .iter()
        .map(|word| resolver.resolve(word, index))
        .collect();

    let scores = combine(&term_hits);
    let ranked = rank(&scores, options.result_limit);

    let matched_keys: Vec<&str> = term_hits
        .iter()
        .flat_map(|hits| hits.keys.iter().map(String::as_str))
        .chain(words.iter().map(String::as_str))
        .collect();

    let hits: Vec<SearchHit> = ranked
        .into_iter()
        .filter_map(|entry| {
            let document = index.document(entry.doc)?;
            Some(SearchHit {
                doc: entry.doc,
                docname: document.docname.clone(),
                title: document.title.clone(),
                anchor: section_anchor(index, entry.doc, &matched_keys),
                score: entry.score,
                snippet: None,
            })
        })
        .collect();

    tracing::debug!(
        "Query '{}': {} terms, {} candidates, {} results in {:?}",
        query,
        words.len(),
        scores.len(),
        hits.len(),
        start.elapsed()
    );

    SearchOutcome { terms, hits }
}

/// Run a query and attach snippets, without cancellation.
pub async fn search_with_snippets<F: TextFetcher>(
    index: &IndexStore,
    query: &str,
    options: &SearchOptions,
    fetcher: &F,
) -> SearchOutcome {
    let mut outcome = search(index, query, options);
    let snippets = fetch_snippets(index, &outcome, options, fetcher).await;
    attach(&mut outcome, snippets);
    outcome
}

/// The first section of `doc` whose title has a word starting with one of `keys`.
fn section_anchor(index: &IndexStore, doc: usize, keys: &[&str]) -> Option<String> {
    index
        .sections_for(doc)
        .iter()
        .find(|section| {
            section
                .title
                .split(|c: char| !is_word_char(c))
                .filter(|word| !word.is_empty())
                .map(str::to_lowercase)
                .any(|word| keys.iter().any(|key| word.starts_with(key)))
        })
        .and_then(|section| section.anchor.clone())
}

/// Fetch text and extract one snippet per hit, in hit order. Fetch failures
/// leave that hit without a snippet.
async fn fetch_snippets<F: TextFetcher>(
    index: &IndexStore,
    outcome: &SearchOutcome,
    options: &SearchOptions,
    fetcher: &F,
) -> Vec<Option<Snippet>> {
    if outcome.hits.is_empty() {
        return Vec::new();
    }

    let extractor = SnippetExtractor::new(&outcome.terms, options.snippet_context);
    let extractor = &extractor;

    // Collected up front so the stream owns concrete futures
    let fetches: Vec<_> = outcome
        .hits
        .iter()
        .map(|hit| async move {
            let document = index.document(hit.doc)?;
            match fetcher.fetch_text(document).await {
                Ok(text) => extractor.extract(&text),
                Err(e) => {
                    tracing::warn!("Snippet unavailable for '{}': {}", hit.docname, e);
                    None
                }
            }
        })
        .collect();

    futures::stream::iter(fetches)
        .buffered(options.snippet_concurrency.max(1))
        .collect()
        .await
}

fn attach(outcome: &mut SearchOutcome, snippets: Vec<Option<Snippet>>) {
    for (hit, snippet) in outcome.hits.iter_mut().zip(snippets) {
        hit.snippet = snippet;
    }
}

/// Tracks the query currently in flight for one caller.
///
/// Starting a query cancels the previous one. A cancelled query resolves to
/// [`Superseded`] and none of its snippets are ever returned.
#[derive(Debug, Default)]
pub struct SearchSession {
    current: Mutex<CancellationToken>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new query, cancelling whichever one was in flight.
    pub fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, token.clone())
        };
        previous.cancel();
        token
    }

    /// Cancel the query in flight, if any.
    pub fn cancel(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    /// Run a query without snippets. It still supersedes any earlier query on
    /// this session, whose snippets would otherwise arrive after these results.
    pub fn search(&self, index: &IndexStore, query: &str, options: &SearchOptions) -> SearchOutcome {
        self.begin();
        search(index, query, options)
    }

    /// Run a query with snippets, superseding any earlier query on this session.
    pub async fn run<F: TextFetcher>(
        &self,
        index: &IndexStore,
        query: &str,
        options: &SearchOptions,
        fetcher: &F,
    ) -> Result<SearchOutcome, Superseded> {
        let token = self.begin();
        let mut outcome = search(index, query, options);

        let snippets = tokio::select! {
            biased;
            () = token.cancelled() => None,
            snippets = fetch_snippets(index, &outcome, options, fetcher) => Some(snippets),
        };

        let Some(snippets) = snippets else {
            tracing::debug!("Query '{}' superseded; discarding snippets", query);
            return Err(Superseded);
        };
        attach(&mut outcome, snippets);
        Ok(outcome)
    }
}
