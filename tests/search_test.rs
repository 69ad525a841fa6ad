mod common;

use assert2::{check, let_assert};
use common::{SiteWorkspace, fixture_index, site};
use rstest::rstest;
use sphinx_search_mcp::search::{NormalizedTerm, ScoreTier, Tokenizer, search};
use sphinx_search_mcp::{IndexStore, SearchOptions, SearchOutcome, search_with_snippets};

fn docnames(outcome: &SearchOutcome) -> Vec<&str> {
    outcome.hits.iter().map(|hit| hit.docname.as_str()).collect()
}

fn points(outcome: &SearchOutcome) -> Vec<u32> {
    outcome.hits.iter().map(|hit| hit.score.points).collect()
}

// --- Ranking ---

/// Test: a title match outranks body matches and jumps to the matching section.
#[rstest]
fn title_match_ranks_first(fixture_index: IndexStore) {
    let outcome = search(&fixture_index, "error", &SearchOptions::default());

    check!(docnames(&outcome) == vec!["errors", "expressions", "scripts"]);
    check!(points(&outcome) == vec![117, 108, 108]);
    check!(outcome.hits[0].title == "Errors");
    check!(outcome.hits[0].anchor.as_deref() == Some("errors"));
}

/// Test: documents matching every term come first, with the section that
/// mentions them as the anchor.
#[rstest]
fn all_terms_required(fixture_index: IndexStore) {
    let outcome = search(&fixture_index, "fetch function", &SearchOptions::default());

    check!(docnames(&outcome) == vec!["options", "index"]);
    check!(points(&outcome) == vec![134, 116]);
    check!(outcome.hits.iter().all(|hit| hit.score.tier == ScoreTier::Complete));
    check!(outcome.hits.iter().all(|hit| hit.score.matched_terms == 2));
    check!(outcome.hits[0].anchor.as_deref() == Some("fetch-functions"));
}

/// Test: when no document has every term, partial matches are returned instead.
#[rstest]
fn falls_back_to_partial_matches(fixture_index: IndexStore) {
    let outcome = search(&fixture_index, "markdown option", &SearchOptions::default());

    check!(docnames(&outcome) == vec!["index", "options", "errors", "expressions", "scripts"]);
    check!(points(&outcome) == vec![17, 17, 8, 8, 8]);
    check!(outcome.hits.iter().all(|hit| hit.score.tier == ScoreTier::Partial));
}

/// Test: a term absent from the index keeps the others' matches, as partial ones.
#[rstest]
fn unknown_term_gives_partial_matches(fixture_index: IndexStore) {
    let outcome = search(&fixture_index, "zebra error", &SearchOptions::default());

    check!(docnames(&outcome) == vec!["errors", "expressions", "scripts"]);
    check!(points(&outcome) == vec![17, 8, 8]);
    check!(outcome.hits.iter().all(|hit| hit.score.tier == ScoreTier::Partial));
    check!(outcome.hits.iter().all(|hit| hit.score.matched_terms == 1));
    check!(outcome.terms.len() == 2);
}

#[rstest]
fn nothing_matches(fixture_index: IndexStore) {
    let outcome = search(&fixture_index, "zebra quux", &SearchOptions::default());
    check!(outcome.is_empty());
    check!(outcome.terms.len() == 2);
}

/// Test: stop words and short words leave nothing to search for.
#[rstest]
fn query_without_terms(fixture_index: IndexStore) {
    let outcome = search(&fixture_index, "is it on", &SearchOptions::default());
    check!(outcome.terms.is_empty());
    check!(outcome.is_empty());
}

/// Test: a partial word matches indexed keys it prefixes.
#[rstest]
fn prefix_match(fixture_index: IndexStore) {
    let outcome = search(&fixture_index, "fetc", &SearchOptions::default());

    check!(docnames(&outcome) == vec!["options", "index"]);
    check!(points(&outcome) == vec![107, 102]);
}

#[rstest]
fn identifiers_stay_whole(fixture_index: IndexStore) {
    let outcome = search(&fixture_index, "parse_script", &SearchOptions::default());

    check!(docnames(&outcome) == vec!["scripts", "index"]);
    check!(points(&outcome) == vec![117, 108]);
}

#[rstest]
fn repeated_queries_are_identical(fixture_index: IndexStore) {
    let options = SearchOptions::default();
    let first = search(&fixture_index, "execut script", &options);
    let second = search(&fixture_index, "execut script", &options);

    check!(first.hits == second.hits);
    check!(docnames(&first) == vec!["index", "scripts", "expressions"]);
}

#[rstest]
fn result_limit_truncates(fixture_index: IndexStore) {
    let options = SearchOptions {
        result_limit: Some(2),
        ..SearchOptions::default()
    };
    let outcome = search(&fixture_index, "markdown option", &options);
    check!(docnames(&outcome) == vec!["index", "options"]);
}

/// Test: English stemming finds `function` for `functions` only when enabled.
#[rstest]
fn stem_fallback_is_opt_in(fixture_index: IndexStore) {
    let plain = search(&fixture_index, "functions", &SearchOptions::default());
    check!(plain.is_empty());

    let options = SearchOptions {
        stem_fallback: true,
        ..SearchOptions::default()
    };
    let stemmed = search(&fixture_index, "functions", &options);
    check!(docnames(&stemmed) == vec!["options", "expressions", "index"]);
    check!(points(&stemmed) == vec![117, 108, 108]);
}

/// Test: every indexed key searched on its own returns exactly the documents
/// that key was recorded for, all as complete matches.
#[rstest]
fn single_key_finds_its_documents(fixture_index: IndexStore) {
    let tokenizer = Tokenizer::default();
    let options = SearchOptions::default();
    let mut checked = 0;

    for key in fixture_index.prefix_terms("") {
        if tokenizer.tokenize(key) != vec![NormalizedTerm::Word(key.to_string())] {
            continue;
        }

        let mut expected: Vec<usize> = fixture_index
            .lookup_term(key)
            .iter()
            .chain(fixture_index.lookup_title_term(key))
            .map(|posting| posting.doc)
            .collect();
        expected.sort_unstable();
        expected.dedup();

        let outcome = search(&fixture_index, key, &options);
        let mut found: Vec<usize> = outcome.hits.iter().map(|hit| hit.doc).collect();
        found.sort_unstable();

        check!(found == expected, "key '{}'", key);
        check!(
            outcome.hits.iter().all(|hit| hit.score.tier == ScoreTier::Complete),
            "key '{}'",
            key
        );
        checked += 1;
    }

    check!(checked > 100);
}

// --- Snippets ---

/// Test: snippets come from `_sources/`, and pages without sources still rank.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn snippets_from_sources(site: SiteWorkspace) {
    let index = sphinx_search_mcp::load_index_file(&site.index_path).await;
    let_assert!(Ok(index) = index);

    let outcome =
        search_with_snippets(&index, "error", &SearchOptions::default(), &site.fetcher()).await;

    check!(docnames(&outcome) == vec!["errors", "expressions", "scripts"]);

    let_assert!(Some(snippet) = &outcome.hits[0].snippet);
    check!(snippet.highlighted == "Errors");
    check!(snippet.prefix.is_empty());
    check!(!snippet.truncated_start);
    check!(snippet.to_markdown().starts_with("**Errors**"));

    check!(outcome.hits[1].snippet.is_none());
    check!(outcome.hits[2].snippet.is_none());
}

/// Test: snippets never change which documents rank or in what order.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn snippets_do_not_affect_ranking(site: SiteWorkspace) {
    let_assert!(Ok(index) = sphinx_search_mcp::load_index_file(&site.index_path).await);
    let options = SearchOptions::default();

    let plain = search(&index, "fetch function", &options);
    let with_snippets = search_with_snippets(&index, "fetch function", &options, &site.fetcher()).await;

    check!(docnames(&plain) == docnames(&with_snippets));
    check!(points(&plain) == points(&with_snippets));

    for hit in &with_snippets.hits {
        let_assert!(Some(snippet) = &hit.snippet, "{} has a source file", hit.docname);
        let highlighted = snippet.highlighted.to_lowercase();
        check!(highlighted.starts_with("fetch") || highlighted.starts_with("function"));
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn phrase_is_highlighted_whole(site: SiteWorkspace) {
    let_assert!(Ok(index) = sphinx_search_mcp::load_index_file(&site.index_path).await);

    let outcome = search_with_snippets(
        &index,
        "\"markdown viewer\"",
        &SearchOptions::default(),
        &site.fetcher(),
    )
    .await;

    let_assert!(Some(hit) = outcome.hits.iter().find(|hit| hit.docname == "index"));
    let_assert!(Some(snippet) = &hit.snippet);
    check!(snippet.highlighted == "Markdown Viewer");
}
