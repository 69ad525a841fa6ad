//! Shared server state: the index cache, the active search session, and the
//! configured defaults.
//!
//! Parsed indexes are kept in an LRU cache keyed by canonical path. Concurrent
//! requests for an index that is still loading await the same shared future
//! instead of parsing the file twice.

use crate::config::{Config, SearchOptions, expand_path};
use crate::error::LoadError;
use crate::fetch::SourceDirFetcher;
use crate::search::{IndexStore, SearchSession};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Type alias for shared index load futures.
type SharedLoadFuture = Shared<BoxFuture<'static, Result<Arc<IndexStore>, LoadError>>>;

/// Read and parse a `searchindex.js` file.
///
/// Parsing runs on the blocking pool; large indexes take long enough to stall
/// the async runtime otherwise.
pub async fn load_index_file(path: &Path) -> Result<IndexStore, LoadError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Invalid {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
        }
    })?;

    let invalid = |error: String| LoadError::Invalid {
        path: path.to_path_buf(),
        error,
    };

    tokio::task::spawn_blocking(move || IndexStore::load(&raw))
        .await
        .map_err(|e| invalid(e.to_string()))?
        .map_err(|e| invalid(e.to_string()))
}

/// LRU cache of parsed indexes with de-duplicated in-flight loads.
pub struct IndexCache {
    /// Parsed indexes by canonical path
    cache: RwLock<LruCache<PathBuf, Arc<IndexStore>>>,

    /// Loads in progress (can be awaited by multiple callers)
    in_flight: Mutex<HashMap<PathBuf, SharedLoadFuture>>,
}

impl std::fmt::Debug for IndexCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexCache")
            .field("cached", &self.cache.try_read().map(|cache| cache.len()).ok())
            .field(
                "in_flight",
                &self.in_flight.try_lock().map(|in_flight| in_flight.len()).ok(),
            )
            .finish()
    }
}

impl IndexCache {
    /// Create a cache holding at most `capacity` indexes (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RwLock::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Get an index, loading it if needed.
    ///
    /// 1. Checks the LRU cache
    /// 2. Joins an in-flight load for the same file if there is one
    /// 3. Starts a new load otherwise
    pub async fn get(&self, path: &Path) -> Result<Arc<IndexStore>, LoadError> {
        let key = tokio::fs::canonicalize(path)
            .await
            .map_err(|_| LoadError::NotFound {
                path: path.to_path_buf(),
            })?;

        {
            let mut cache = self.cache.write().await;
            if let Some(index) = cache.get(&key) {
                tracing::debug!("Cache hit for {}", key.display());
                return Ok(index.clone());
            }
        }

        let (future, started) = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(future) = in_flight.get(&key) {
                tracing::debug!("Awaiting in-flight load for {}", key.display());
                (future.clone(), false)
            } else {
                let load_path = key.clone();
                let future: BoxFuture<'static, Result<Arc<IndexStore>, LoadError>> =
                    Box::pin(async move { load_index_file(&load_path).await.map(Arc::new) });
                let future = future.shared();
                in_flight.insert(key.clone(), future.clone());
                tracing::info!("Loading search index from {}", key.display());
                (future, true)
            }
        };

        let result = future.await;

        if started {
            // Cache before clearing in-flight so no caller sees neither
            if let Ok(index) = &result {
                self.cache.write().await.put(key.clone(), index.clone());
                tracing::debug!("Cached index for {}", key.display());
            }
            self.in_flight.lock().await.remove(&key);
        }

        result
    }

    /// Check if an index is cached, without loading it.
    pub async fn is_cached(&self, path: &Path) -> bool {
        match tokio::fs::canonicalize(path).await {
            Ok(key) => self.cache.read().await.contains(&key),
            Err(_) => false,
        }
    }

    /// Drop every cached index (in-flight loads are left to finish).
    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }
}

/// Everything a tool handler needs.
#[derive(Debug)]
pub struct SearchState {
    cache: IndexCache,
    session: SearchSession,
    default_index: Option<PathBuf>,
    sources: Option<PathBuf>,
    options: SearchOptions,
}

impl SearchState {
    pub fn new(config: &Config) -> Self {
        Self {
            cache: IndexCache::new(config.cache_size),
            session: SearchSession::new(),
            default_index: config.index.clone(),
            sources: config.sources.clone(),
            options: config.search.clone(),
        }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    /// The index file a request refers to: its own path, else the configured default.
    pub fn resolve_index_path(&self, requested: Option<&str>) -> Result<PathBuf, String> {
        match requested {
            Some(path) => Ok(expand_path(Path::new(path))),
            None => self.default_index.clone().ok_or_else(|| {
                "No search index configured. Pass `index_path` or start the server with --index."
                    .to_string()
            }),
        }
    }

    /// Resolve and load an index, rendering failures for the caller.
    pub async fn index(&self, requested: Option<&str>) -> Result<(PathBuf, Arc<IndexStore>), String> {
        let path = self.resolve_index_path(requested)?;
        let index = self.cache.get(&path).await.map_err(|e| e.to_string())?;
        Ok((path, index))
    }

    /// Where to read document text for an index: the configured sources root,
    /// else the directory holding the index when it has a `_sources/` folder.
    pub fn fetcher_for(&self, index_path: &Path) -> Option<SourceDirFetcher> {
        if let Some(root) = &self.sources {
            return Some(SourceDirFetcher::new(root));
        }
        let root = index_path.parent()?;
        root.join("_sources")
            .is_dir()
            .then(|| SourceDirFetcher::new(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};

    const MINIMAL: &str = r#"Search.setIndex({"docnames":["index"],"filenames":["index.rst"],"titles":["Home"],"terms":{"home":0},"titleterms":{"home":0},"envversion":{"sphinx":60}})"#;

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(2);
        let_assert!(Err(LoadError::NotFound { .. }) = cache.get(&dir.path().join("searchindex.js")).await);
    }

    #[tokio::test]
    async fn test_invalid_file_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("searchindex.js");
        std::fs::write(&path, "Search.setIndex({").unwrap();

        let cache = IndexCache::new(2);
        let_assert!(Err(LoadError::Invalid { .. }) = cache.get(&path).await);
        check!(!cache.is_cached(&path).await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_loads_share_one_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("searchindex.js");
        std::fs::write(&path, MINIMAL).unwrap();

        let cache = IndexCache::new(2);
        let (a, b) = tokio::join!(cache.get(&path), cache.get(&path));
        let_assert!(Ok(a) = a);
        let_assert!(Ok(b) = b);
        check!(Arc::ptr_eq(&a, &b));
        check!(cache.is_cached(&path).await);

        cache.clear().await;
        check!(!cache.is_cached(&path).await);
    }

    #[test]
    fn test_fetcher_follows_index_directory() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join("searchindex.js");
        let state = SearchState::new(&Config::default());
        check!(state.fetcher_for(&index_path).is_none());

        std::fs::create_dir(dir.path().join("_sources")).unwrap();
        let_assert!(Some(fetcher) = state.fetcher_for(&index_path));
        check!(fetcher.root() == dir.path());
    }

    #[test]
    fn test_no_index_configured() {
        let state = SearchState::new(&Config::default());
        check!(state.resolve_index_path(None).is_err());
        check!(state.resolve_index_path(Some("/tmp/x.js")) == Ok(PathBuf::from("/tmp/x.js")));
    }
}
