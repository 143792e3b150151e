//! MCP tool implementations.
//!
//! This module contains all tools exposed by the asset-cache server.

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

use crate::error::ServerError;

pub mod asset_fetch;
pub mod cache;

/// Wrap `output` as a pretty-printed JSON text result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, ServerError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| ServerError::OutputFailed(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
