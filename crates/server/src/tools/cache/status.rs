//! cache_status tool implementation.

use assetcache_client::AssetCache;
use assetcache_core::CacheStatus;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;

use crate::tools::json_result;

/// Output from the cache_status tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheStatusOutput {
    #[serde(flatten)]
    pub status: CacheStatus,
    /// Background revalidations not yet finished.
    pub pending_revalidations: usize,
    pub max_age_ms: u64,
}

/// Implementation of the cache_status tool.
pub async fn status_impl(cache: &AssetCache) -> Result<CallToolResult, McpError> {
    let status = cache.status().await?;
    let output =
        CacheStatusOutput { status, pending_revalidations: cache.pending_revalidations(), max_age_ms: cache.max_age_ms() };
    Ok(json_result(&output)?)
}
