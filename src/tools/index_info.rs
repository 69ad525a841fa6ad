//! Index summary handler.

use crate::search::IndexInfo;
use crate::state::SearchState;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IndexInfoRequest {
    /// Path to a Sphinx searchindex.js (default: the server's configured index)
    #[serde(default)]
    pub index_path: Option<String>,
}

pub async fn handle_index_info(
    state: &SearchState,
    request: IndexInfoRequest,
) -> Result<String, String> {
    let (path, index) = state.index(request.index_path.as_deref()).await?;
    let mut output = format_index_info(&path, &index.info());

    match state.fetcher_for(&path) {
        Some(fetcher) => {
            let _ = writeln!(output, "Snippet sources: {}", fetcher.root().display());
        }
        None => output.push_str("Snippet sources: unavailable (no _sources/ directory)\n"),
    }

    Ok(output)
}

pub fn format_index_info(path: &Path, info: &IndexInfo) -> String {
    let mut output = format!("Search index: {}\n\n", path.display());
    let _ = writeln!(output, "Documents: {}", info.documents);
    let _ = writeln!(output, "Terms: {} body, {} title", info.terms, info.title_terms);
    let _ = writeln!(output, "Objects: {}", info.objects);
    let _ = writeln!(output, "Sections: {}", info.sections);
    let _ = writeln!(output, "Sphinx environment version: {}", info.sphinx_version);
    if !info.domains.is_empty() {
        let _ = writeln!(output, "Domains: {}", info.domains.join(", "));
    }
    let _ = writeln!(output, "Fingerprint: {}", info.fingerprint);
    output
}
