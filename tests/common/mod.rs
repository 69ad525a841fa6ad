//! Shared test fixtures and utilities for integration tests.
//!
//! # Test Isolation Strategy
//!
//! Tests that touch the filesystem get their own built-site directory:
//! - A fresh temporary directory with the fixture `searchindex.js` copied in
//! - `_sources/` text for some (not all) pages, so snippet fallbacks are exercised
//! - Their own `SearchState` with an empty index cache
//!
//! # Available Fixtures
//!
//! - `fixture_index`: the bare-script documentation index, parsed
//! - `site`: an isolated built site with sources for `errors`, `index`, `options`
//!
//! # Shared Infrastructure
//!
//! [`TempWorkspace`] provides a reusable temp directory abstraction for any test
//! that needs filesystem isolation.

use rstest::fixture;
use sphinx_search_mcp::{Config, IndexStore, SearchState, SourceDirFetcher};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Returns the project root directory (where Cargo.toml lives).
pub fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Path of the checked-in bare-script `searchindex.js`.
pub fn fixture_index_path() -> PathBuf {
    project_root().join("tests/fixtures/searchindex.js")
}

/// The bare-script documentation index (5 pages, Python domain objects).
#[fixture]
pub fn fixture_index() -> IndexStore {
    let raw = std::fs::read_to_string(fixture_index_path()).expect("Failed to read fixture index");
    IndexStore::load(&raw).expect("Fixture index should load")
}

/// A temporary workspace directory for test isolation.
///
/// Provides basic filesystem operations within a temp directory that is
/// automatically cleaned up when dropped.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    /// Creates a new empty temporary workspace.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    /// Returns the root path of this workspace.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content within this workspace.
    ///
    /// Parent directories are created automatically if they don't exist.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
    }

    /// Copies a file from the real filesystem into this workspace.
    ///
    /// # Panics
    /// Panics if copying fails.
    pub fn copy_file(&self, source: &Path, dest_relative: &str) {
        let dest = self.root.join(dest_relative);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!(
                    "Failed to create parent directory for '{}': {}",
                    dest_relative, e
                )
            });
        }
        std::fs::copy(source, &dest).unwrap_or_else(|e| {
            panic!(
                "Failed to copy '{}' to '{}': {}",
                source.display(),
                dest_relative,
                e
            )
        });
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

const ERRORS_SOURCE: &str = "\
Errors
======

The bare-script library raises BareScriptParserError when a script fails to
parse, and BareScriptRuntimeError when a running script fails.

.. autoexception:: bare_script.BareScriptParserError
";

const INDEX_SOURCE: &str = "\
bare-script
===========

BareScript is a simple, lightweight, and portable programming language. Its
Pythonic syntax is influenced by JavaScript, C, and the Unix Shell. BareScript
also has a library of built-in functions for common programming operations.

Executing BareScript
--------------------

Use the execute_script function to run a parsed script. The fetch function
option controls how scripts read resources over the network.

MarkdownUp, a Markdown Viewer with BareScript
---------------------------------------------

MarkdownUp is a Markdown viewer that runs BareScript code blocks.
";

const OPTIONS_SOURCE: &str = "\
Options
=======

.. autoclass:: ExecuteScriptOptions

Fetch Functions
---------------

The fetch function retrieves a URL on behalf of a script. Use fetch_http to
read over the network, or fetch_read_only to read local files.
";

/// A built documentation site in a temp directory.
///
/// `expressions` and `scripts` deliberately have no source text.
#[allow(dead_code)] // Fields used across different integration test crates
pub struct SiteWorkspace {
    workspace: TempWorkspace,
    pub index_path: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl SiteWorkspace {
    pub fn new() -> Self {
        let workspace = TempWorkspace::new();
        workspace.copy_file(&fixture_index_path(), "searchindex.js");
        workspace.create_file("_sources/errors.rst.txt", ERRORS_SOURCE);
        workspace.create_file("_sources/index.rst.txt", INDEX_SOURCE);
        workspace.create_file("_sources/options.rst.txt", OPTIONS_SOURCE);

        let index_path = workspace.path().join("searchindex.js");
        Self {
            workspace,
            index_path,
        }
    }

    pub fn root(&self) -> &Path {
        self.workspace.path()
    }

    pub fn fetcher(&self) -> SourceDirFetcher {
        SourceDirFetcher::new(self.root())
    }

    /// Server state whose default index is this site's.
    pub fn state(&self) -> SearchState {
        SearchState::new(&Config {
            index: Some(self.index_path.clone()),
            ..Config::default()
        })
    }
}

/// Fixture: an isolated built site.
#[fixture]
pub fn site() -> SiteWorkspace {
    SiteWorkspace::new()
}
