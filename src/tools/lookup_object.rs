//! API object lookup handler.

use crate::search::{ObjectMatch, match_objects};
use crate::state::SearchState;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;

/// Matches listed when neither the request nor the config sets a limit.
pub const DEFAULT_LOOKUP_LIMIT: usize = 20;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LookupObjectRequest {
    /// Dotted object path such as 'fetch_fn' or 'bare_script.fetch'. The last
    /// component is matched as a name prefix, the rest as a module prefix.
    pub query: String,
    /// Path to a Sphinx searchindex.js (default: the server's configured index)
    #[serde(default)]
    pub index_path: Option<String>,
    /// Maximum number of matches to return (default: 20)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Look up API objects by dotted path.
pub async fn handle_lookup_object(
    state: &SearchState,
    request: LookupObjectRequest,
) -> Result<String, String> {
    let (_, index) = state.index(request.index_path.as_deref()).await?;
    let matches = match_objects(&request.query, &index);

    if matches.is_empty() {
        return Ok(format!(
            "No objects match '{}'.\n\nTry a shorter name prefix, or drop the module part.\n",
            request.query
        ));
    }

    let limit = request
        .limit
        .or(state.options().result_limit)
        .unwrap_or(DEFAULT_LOOKUP_LIMIT);

    Ok(format_object_matches(&request.query, &matches, limit))
}

/// Render matches, exact ones first, as a numbered list.
pub fn format_object_matches(query: &str, matches: &[ObjectMatch<'_>], limit: usize) -> String {
    let mut output = format!("Objects matching '{}':\n\n", query);

    for (idx, m) in matches.iter().take(limit).enumerate() {
        let _ = writeln!(
            output,
            "{}. `{}` ({}) - {}#{}{}",
            idx + 1,
            m.full_name(),
            m.type_label(),
            m.document.docname,
            m.entry.anchor,
            if m.is_exact() { "" } else { " [prefix]" }
        );
    }

    if matches.len() > limit {
        let _ = writeln!(output, "\n... and {} more", matches.len() - limit);
    }

    output
}
