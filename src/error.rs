//! Error handling types and utilities.

use std::path::PathBuf;

/// A specialized Result type for application-level plumbing (CLI, server, config).
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the codebase.
pub type Result<T> = anyhow::Result<T>;

/// The index artifact could not be parsed or is not a schema we understand.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexFormatError {
    #[error("index is not valid JSON: {0}")]
    Json(String),
    #[error("index wrapper is malformed: expected `Search.setIndex({{...}})` or a bare JSON object")]
    Wrapper,
    #[error("field `{0}` is missing")]
    MissingField(&'static str),
    #[error("field `{field}` is malformed: {reason}")]
    Malformed { field: &'static str, reason: String },
    #[error(
        "document tables disagree in length: {docnames} docnames, {filenames} filenames, {titles} titles"
    )]
    LengthMismatch {
        docnames: usize,
        filenames: usize,
        titles: usize,
    },
    #[error("unsupported index version sphinx={found} (supported {min}..={max})")]
    UnsupportedVersion { found: u32, min: u32, max: u32 },
    #[error("unknown weight code {code} for term '{term}'")]
    WeightCode { term: String, code: u64 },
}

/// A table in the index references a document that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{table}` entry '{key}' references document {doc_index}, but the index has {doc_count}")]
pub struct IndexIntegrityError {
    pub table: &'static str,
    pub key: String,
    pub doc_index: usize,
    pub doc_count: usize,
}

/// Fatal errors raised while loading an index. No partial index is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    Format(#[from] IndexFormatError),
    #[error(transparent)]
    Integrity(#[from] IndexIntegrityError),
}

/// Document text could not be retrieved for snippet extraction.
///
/// Always recovered locally: the result is shown without an excerpt.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("no source text for '{docname}' at {}", .path.display())]
    NotFound { docname: String, path: PathBuf },
    #[error("failed to read source text for '{docname}': {source}")]
    Io {
        docname: String,
        #[source]
        source: std::io::Error,
    },
}

/// A newer query started before this one finished attaching snippets.
///
/// The superseded results are discarded, never merged into the newer output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("query superseded by a newer search")]
pub struct Superseded;

/// Error returned when the server-side index cache fails to provide an index.
#[derive(Debug, Clone)]
pub enum LoadError {
    /// Index file not found at the expected path.
    NotFound { path: PathBuf },
    /// The file exists but could not be read or parsed.
    Invalid { path: PathBuf, error: String },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { path } => {
                write!(f, "Search index not found at {}", path.display())
            }
            Self::Invalid { path, error } => {
                write!(
                    f,
                    "Search unavailable: failed to load {}: {}",
                    path.display(),
                    error
                )
            }
        }
    }
}

impl std::error::Error for LoadError {}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn integrity_error_names_the_offending_entry() {
        let err = IndexError::from(IndexIntegrityError {
            table: "terms",
            key: "error".to_string(),
            doc_index: 9,
            doc_count: 3,
        });
        let message = err.to_string();
        check!(message.contains("terms"));
        check!(message.contains("'error'"));
        check!(message.contains("document 9"));
    }

    #[test]
    fn load_error_reports_search_unavailable() {
        let err = LoadError::Invalid {
            path: PathBuf::from("/tmp/searchindex.js"),
            error: "bad".to_string(),
        };
        check!(err.to_string().starts_with("Search unavailable"));
    }
}
