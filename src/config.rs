//! Configuration file loading.
//!
//! Lookup order: an explicit `--config` path, then `$SPHINX_SEARCH_CONFIG`, then
//! `<config dir>/sphinx-search-mcp/config.toml`. A missing default file is not
//! an error; a missing explicit file is. CLI flags override whatever was loaded.

use crate::error::Result;
use crate::search::{DEFAULT_MIN_TERM_LENGTH, DEFAULT_SNIPPET_CONTEXT};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "SPHINX_SEARCH_CONFIG";

const CONFIG_DIR_NAME: &str = "sphinx-search-mcp";
const DEFAULT_CACHE_SIZE: usize = 8;
const DEFAULT_SNIPPET_CONCURRENCY: usize = 4;

/// Per-query knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchOptions {
    /// Cap on returned results; `None` returns everything
    pub result_limit: Option<usize>,
    /// Characters of context on each side of a snippet match
    pub snippet_context: usize,
    /// Tokenizer floor
    pub min_term_length: usize,
    /// Try the English stem of a word as an exact key before prefix scanning
    pub stem_fallback: bool,
    /// Document fetches in flight per query
    pub snippet_concurrency: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            result_limit: None,
            snippet_context: DEFAULT_SNIPPET_CONTEXT,
            min_term_length: DEFAULT_MIN_TERM_LENGTH,
            stem_fallback: false,
            snippet_concurrency: DEFAULT_SNIPPET_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Default `searchindex.js`
    pub index: Option<PathBuf>,
    /// Built HTML root holding `_sources/`; snippets are skipped when unset
    pub sources: Option<PathBuf>,
    /// Parsed indexes kept in memory by the server
    pub cache_size: usize,
    pub search: SearchOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index: None,
            sources: None,
            cache_size: DEFAULT_CACHE_SIZE,
            search: SearchOptions::default(),
        }
    }
}

impl Config {
    /// Load configuration, falling back to defaults when no file exists.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let explicit = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        if let Some(path) = explicit {
            return Self::from_file(&path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.index = config.index.map(|p| expand_path(&p));
        config.sources = config.sources.map(|p| expand_path(&p));
        Ok(config)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join("config.toml"))
}

/// Expands tilde (`~`) in a path to the user's home directory.
///
/// - `~/foo` becomes `/home/user/foo`
/// - `~` becomes `/home/user`
/// - Other paths are returned unchanged
///
/// Returns `Cow::Borrowed` if no expansion needed, `Cow::Owned` if expanded.
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}

/// [`expand_tilde`] for paths; non-UTF-8 paths pass through untouched.
pub fn expand_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(raw) => PathBuf::from(expand_tilde(raw).as_ref()),
        None => path.to_path_buf(),
    }
}
