use crate::config::{Config, expand_path};
use crate::error::Result;
use crate::logging::LogFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sphinx-search-mcp")]
#[command(version, about = "Search Sphinx documentation from the terminal or over MCP", long_about = None)]
pub struct Cli {
    /// Sphinx searchindex.js to query
    #[arg(long, short = 'i', global = true, env = "SPHINX_SEARCH_INDEX")]
    pub index: Option<PathBuf>,

    /// Built HTML root containing _sources/ (default: the index's directory)
    #[arg(long, global = true)]
    pub sources: Option<PathBuf>,

    /// Config file path (default: ~/.config/sphinx-search-mcp/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Maximum number of results
    #[arg(long, short = 'n', global = true)]
    pub limit: Option<usize>,

    /// Write logs to stderr as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Full-text search over page titles and bodies
    Search {
        /// Query words; quote a phrase to highlight it exactly
        #[arg(required = true)]
        query: Vec<String>,
        /// Skip reading page sources for excerpts
        #[arg(long)]
        no_snippets: bool,
        /// Also try English word stems as exact terms
        #[arg(long)]
        stem: bool,
    },
    /// Look up API objects by dotted path
    Object { query: String },
    /// Summarize the index
    Info,
    /// Serve the MCP tools over stdio
    Serve,
}

impl Cli {
    /// Load the config file and apply command-line overrides on top.
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(index) = &self.index {
            config.index = Some(expand_path(index));
        }
        if let Some(sources) = &self.sources {
            config.sources = Some(expand_path(sources));
        }
        if let Some(limit) = self.limit {
            config.search.result_limit = Some(limit);
        }
        if let Commands::Search { stem: true, .. } = self.command {
            config.search.stem_fallback = true;
        }

        Ok(config)
    }

    pub fn log_format(&self) -> LogFormat {
        if self.log_json {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }
}
