//! MCP server implementation.

use crate::config::Config;
use crate::state::SearchState;
use crate::tools::index_info::{IndexInfoRequest, handle_index_info};
use crate::tools::lookup_object::{LookupObjectRequest, handle_lookup_object};
use crate::tools::search::{SearchRequest, handle_search};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// MCP Server for Sphinx documentation search
#[derive(Clone)]
pub struct SearchServer {
    /// Shared search state (index cache, session, defaults)
    state: Arc<SearchState>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for SearchServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchServer")
            .field("state", &self.state)
            .finish()
    }
}

#[tool_router]
impl SearchServer {
    pub fn new(config: &Config) -> Self {
        Self {
            state: Arc::new(SearchState::new(config)),
            tool_router: Self::tool_router(),
        }
    }

    /// Get a reference to the shared SearchState.
    pub fn state(&self) -> &Arc<SearchState> {
        &self.state
    }

    #[tool(
        description = "Full-text search over a Sphinx documentation site. Returns pages ranked by relevance: title matches beat body matches, exact words beat partial words, and pages matching every query word beat pages matching only some. Each result includes the best section anchor and, when page sources are available, a highlighted excerpt.",
        input_schema = inline_schema_for_type::<SearchRequest>()
    )]
    async fn search_docs(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> std::result::Result<String, String> {
        handle_search(&self.state, request).await
    }

    #[tool(
        description = "Look up documented API objects (functions, classes, attributes, ...) by dotted path, such as 'fetch_fn' or 'bare_script.fetch'. Exact name matches are listed before prefix matches.",
        input_schema = inline_schema_for_type::<LookupObjectRequest>()
    )]
    async fn lookup_object(
        &self,
        Parameters(request): Parameters<LookupObjectRequest>,
    ) -> std::result::Result<String, String> {
        handle_lookup_object(&self.state, request).await
    }

    #[tool(
        description = "Summarize a Sphinx search index: document, term, object and section counts, the Sphinx environment version, and available domains.",
        input_schema = inline_schema_for_type::<IndexInfoRequest>()
    )]
    async fn index_info(
        &self,
        Parameters(request): Parameters<IndexInfoRequest>,
    ) -> std::result::Result<String, String> {
        handle_index_info(&self.state, request).await
    }
}

#[tool_handler]
impl ServerHandler for SearchServer {
    fn get_info(&self) -> ServerInfo {
        // `ServerInfo` is non-exhaustive; start from its default
        let mut info = ServerInfo::default();
        info.protocol_version = ProtocolVersion::V_2024_11_05;
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = Implementation::from_build_env();
        info.instructions = Some(
            "sphinx-search-mcp: Search a Sphinx documentation site through its searchindex.js. \
             Use search_docs for free-text questions and lookup_object for API names. \
             Every tool accepts an optional index_path; without it the index configured at \
             startup is used."
                .to_string(),
        );
        info
    }
}

/// Generate an inline JSON schema for MCP tools
///
/// Unlike rmcp's default `schema_for_type()`, this function sets `inline_subschemas = true`
/// to generate inline definitions instead of $ref patterns, which MCP clients render
/// more reliably.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let object = serde_json::to_value(schema).expect("failed to serialize schema");

    let json_object = match object {
        serde_json::Value::Object(object) => object,
        _ => panic!("Schema serialization produced non-object value"),
    };

    Arc::new(json_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};

    #[test]
    fn test_search_schema_is_inline() {
        let schema = inline_schema_for_type::<SearchRequest>();
        let_assert!(Some(serde_json::Value::Object(properties)) = schema.get("properties"));
        check!(properties.contains_key("query"));
        check!(properties.contains_key("index_path"));
        check!(!schema.contains_key("$defs"));
    }

    #[test]
    fn test_server_advertises_tools() {
        let server = SearchServer::new(&Config::default());
        let info = server.get_info();
        check!(info.capabilities.tools.is_some());
        let_assert!(Some(instructions) = info.instructions);
        check!(instructions.contains("lookup_object"));
    }
}
