//! Full-text search handler.

use crate::config::SearchOptions;
use crate::search::{ScoreTier, SearchOutcome};
use crate::state::SearchState;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;

/// Results returned when neither the request nor the config sets a limit.
pub const DEFAULT_RESULT_LIMIT: usize = 10;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Search query. Wrap words in double quotes to highlight an exact phrase.
    pub query: String,
    /// Path to a Sphinx searchindex.js (default: the server's configured index)
    #[serde(default)]
    pub index_path: Option<String>,
    /// Maximum number of results to return (default: 10)
    #[serde(default)]
    pub limit: Option<usize>,
    /// Attach highlighted excerpts when page sources are available (default: true)
    #[serde(default)]
    pub snippets: Option<bool>,
}

/// Execute a search against the requested index.
pub async fn handle_search(state: &SearchState, request: SearchRequest) -> Result<String, String> {
    let (path, index) = state.index(request.index_path.as_deref()).await?;

    let options = SearchOptions {
        result_limit: Some(
            request
                .limit
                .or(state.options().result_limit)
                .unwrap_or(DEFAULT_RESULT_LIMIT),
        ),
        ..state.options().clone()
    };

    let fetcher = if request.snippets.unwrap_or(true) {
        state.fetcher_for(&path)
    } else {
        None
    };

    let outcome = match fetcher {
        Some(fetcher) => state
            .session()
            .run(&index, &request.query, &options, &fetcher)
            .await
            .map_err(|e| format!("{}. Retry the query if you still need it.", e))?,
        None => state.session().search(&index, &request.query, &options),
    };

    if outcome.is_empty() {
        return Ok(format_no_results(&request.query, &outcome, &options));
    }

    Ok(format_search_results(&request.query, &outcome))
}

/// Format search results into a readable string output.
pub fn format_search_results(query: &str, outcome: &SearchOutcome) -> String {
    let mut output = format!("Search results for '{}':\n\n", query);

    for (idx, hit) in outcome.hits.iter().enumerate() {
        let location = match &hit.anchor {
            Some(anchor) => format!("{}#{}", hit.docname, anchor),
            None => hit.docname.clone(),
        };
        let _ = write!(
            output,
            "{}. {} ({}) - score: {}",
            idx + 1,
            hit.title,
            location,
            hit.score.points
        );
        if hit.score.tier == ScoreTier::Partial {
            let _ = write!(output, " [partial: {} terms]", hit.score.matched_terms);
        }
        output.push('\n');

        if let Some(snippet) = &hit.snippet {
            let _ = writeln!(output, "   {}", snippet.to_markdown());
        }
        output.push('\n');
    }

    output
}

fn format_no_results(query: &str, outcome: &SearchOutcome, options: &SearchOptions) -> String {
    if outcome.terms.is_empty() {
        return format!(
            "Query '{}' has no searchable terms. Words shorter than {} characters \
             and common words such as 'the' are ignored.\n",
            query, options.min_term_length
        );
    }

    let mut msg = format!("No results found for '{}'.\n\n", query);
    msg.push_str("Search tips:\n");
    msg.push_str("• Try a shorter or more general term\n");
    msg.push_str("• Partial words match by prefix: 'pars' finds 'parser'\n");
    if query.contains('.') {
        msg.push_str("• For dotted API names like 'module.function', use lookup_object\n");
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{AggregateScore, NormalizedTerm, SearchHit, Snippet};
    use assert2::check;

    fn hit(title: &str, anchor: Option<&str>, tier: ScoreTier) -> SearchHit {
        SearchHit {
            doc: 0,
            docname: title.to_lowercase(),
            title: title.to_string(),
            anchor: anchor.map(str::to_string),
            score: AggregateScore {
                tier,
                points: 117,
                matched_terms: 1,
            },
            snippet: None,
        }
    }

    #[test]
    fn test_format_results() {
        let mut first = hit("Errors", Some("errors"), ScoreTier::Complete);
        first.snippet = Some(Snippet {
            prefix: "an ".to_string(),
            highlighted: "error".to_string(),
            suffix: " here".to_string(),
            truncated_start: false,
            truncated_end: true,
        });
        let outcome = SearchOutcome {
            terms: vec![NormalizedTerm::Word("error".to_string())],
            hits: vec![first, hit("Scripts", None, ScoreTier::Partial)],
        };

        let output = format_search_results("error", &outcome);
        check!(output.contains("1. Errors (errors#errors) - score: 117\n"));
        check!(output.contains("   an **error** here...\n"));
        check!(output.contains("2. Scripts (scripts) - score: 117 [partial: 1 terms]"));
    }

    #[test]
    fn test_stop_word_phrase_has_no_terms() {
        let options = SearchOptions::default();
        let terms = crate::search::Tokenizer::new(options.min_term_length).tokenize("\"the a\"");
        let outcome = SearchOutcome { terms, hits: Vec::new() };
        check!(format_no_results("\"the a\"", &outcome, &options).contains("no searchable terms"));
    }

    #[test]
    fn test_no_terms_message() {
        let msg = format_no_results("a to", &SearchOutcome::default(), &SearchOptions::default());
        check!(msg.contains("no searchable terms"));
        check!(msg.contains("3 characters"));
    }
}
