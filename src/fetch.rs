//! Document text retrieval for snippet extraction.

use crate::error::FetchError;
use crate::search::Document;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Sphinx copies page sources into `_sources/` with this suffix appended.
pub const DEFAULT_SOURCE_SUFFIX: &str = ".txt";

/// Source of full document text.
///
/// Called once per ranked result, possibly concurrently. Implementations must
/// not assume any ordering between calls.
pub trait TextFetcher: Send + Sync {
    fn fetch_text(
        &self,
        document: &Document,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Reads `{root}/_sources/{filename}{suffix}` from a built HTML tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDirFetcher {
    root: PathBuf,
    suffix: String,
}

impl SourceDirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            suffix: DEFAULT_SOURCE_SUFFIX.to_string(),
        }
    }

    /// Override the suffix Sphinx appends (`html_sourcelink_suffix`).
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the text of `document` is expected to live.
    pub fn source_path(&self, document: &Document) -> PathBuf {
        self.root
            .join("_sources")
            .join(format!("{}{}", document.filename, self.suffix))
    }
}

impl TextFetcher for SourceDirFetcher {
    async fn fetch_text(&self, document: &Document) -> Result<String, FetchError> {
        let path = self.source_path(document);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound {
                docname: document.docname.clone(),
                path,
            }),
            Err(source) => Err(FetchError::Io {
                docname: document.docname.clone(),
                source,
            }),
        }
    }
}
