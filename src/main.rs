use anyhow::anyhow;
use clap::Parser;
use rmcp::{ServiceExt, transport::stdio};
use sphinx_search_mcp::cli::{Cli, Commands};
use sphinx_search_mcp::config::Config;
use sphinx_search_mcp::logging;
use sphinx_search_mcp::server::SearchServer;
use sphinx_search_mcp::state::SearchState;
use sphinx_search_mcp::tools::{
    IndexInfoRequest, LookupObjectRequest, SearchRequest, handle_index_info, handle_lookup_object,
    handle_search,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format());

    let config = cli.resolve_config()?;

    match cli.command {
        Commands::Serve => serve(&config).await,
        Commands::Search {
            query,
            no_snippets,
            stem: _,
        } => {
            let state = SearchState::new(&config);
            let request = SearchRequest {
                query: query.join(" "),
                index_path: None,
                limit: None,
                snippets: Some(!no_snippets),
            };
            print_output(handle_search(&state, request).await)
        }
        Commands::Object { query } => {
            let state = SearchState::new(&config);
            let request = LookupObjectRequest {
                query,
                index_path: None,
                limit: config.search.result_limit.or(Some(20)),
            };
            print_output(handle_lookup_object(&state, request).await)
        }
        Commands::Info => {
            let state = SearchState::new(&config);
            print_output(handle_index_info(&state, IndexInfoRequest { index_path: None }).await)
        }
    }
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Starting sphinx-search-mcp MCP server");

    if let Some(index) = &config.index {
        tracing::info!("Default search index: {}", index.display());
    } else {
        tracing::warn!("No default index configured; tools require index_path");
    }

    // Create and serve the MCP server over stdio
    let server = SearchServer::new(config);
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;

    // Wait for the service to complete
    service.waiting().await?;

    Ok(())
}

fn print_output(output: Result<String, String>) -> anyhow::Result<()> {
    let text = output.map_err(|e| anyhow!(e))?;
    print!("{}", text);
    Ok(())
}
