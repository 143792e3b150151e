//! cache_clear tool implementation.

use assetcache_client::AssetCache;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Output from the cache_clear tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearOutput {
    /// Number of entries deleted.
    pub deleted: u64,
}

/// Implementation of the cache_clear tool.
pub async fn clear_impl(cache: &AssetCache) -> Result<CallToolResult, McpError> {
    let deleted = cache.clear().await?;
    Ok(json_result(&CacheClearOutput { deleted })?)
}
