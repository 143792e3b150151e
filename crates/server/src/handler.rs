//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use assetcache_client::{AssetCache, CachingFetch};

use crate::tools::asset_fetch::{AssetFetchParams, fetch_impl};
use crate::tools::cache::{CacheWarmParams, clear_impl, status_impl, warm_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for asset-cache.
#[derive(Clone)]
pub struct AssetCacheServer {
    cache: Arc<AssetCache>,
    adapter: CachingFetch,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl AssetCacheServer {
    /// Create a new server handler over `cache`.
    pub fn new(cache: Arc<AssetCache>) -> Self {
        let adapter = CachingFetch::new(Arc::clone(&cache));
        Self { cache, adapter, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Fetch a URL. Static assets (.js, .css, images) are served from the local cache when present \
                       and refreshed in the background once older than the max age."
    )]
    async fn asset_fetch(&self, params: Parameters<AssetFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.adapter, params.0).await
    }

    #[tool(description = "Pre-populate the cache from a list of candidate URLs. Non-asset URLs are skipped.")]
    async fn cache_warm(&self, params: Parameters<CacheWarmParams>) -> Result<CallToolResult, McpError> {
        warm_impl(&self.cache, params.0).await
    }

    #[tool(description = "Delete every cached asset.")]
    async fn cache_clear(&self) -> Result<CallToolResult, McpError> {
        clear_impl(&self.cache).await
    }

    #[tool(description = "Report the number of cached assets and their total size in bytes.")]
    async fn cache_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.cache).await
    }
}

impl ServerHandler for AssetCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "asset-cache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
