//! Search engine and MCP server for Sphinx documentation sites.
//!
//! Queries run against the `searchindex.js` Sphinx writes next to the built HTML.
//! The [`search`] module holds the engine; [`server`] and [`cli`] expose it.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod search;
pub mod server;
pub mod state;
pub mod tools;

pub use config::{Config, SearchOptions};
pub use error::{FetchError, IndexError, IndexFormatError, IndexIntegrityError, LoadError, Superseded};
pub use fetch::{SourceDirFetcher, TextFetcher};
pub use search::{
    IndexStore, NormalizedTerm, ObjectMatch, SearchHit, SearchOutcome, SearchSession, Snippet,
    Tokenizer, match_objects, search_with_snippets,
};
pub use state::{IndexCache, SearchState, load_index_file};
