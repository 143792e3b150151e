//! cache_warm tool implementation.
//!
//! Hands candidate URLs to the opportunistic warm-up path. Ineligible URLs
//! are reported, not rejected.

use assetcache_client::{AssetCache, WarmOutcome, WarmReport};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::tools::json_result;

/// Upper bound on URLs accepted by a single call.
const MAX_WARM_URLS: usize = 256;

/// Parameters for the cache_warm tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheWarmParams {
    /// Candidate URLs, e.g. every `src`/`href` found on a page.
    pub urls: Vec<String>,
}

/// Output from the cache_warm tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheWarmOutput {
    /// Per-URL outcome, in input order.
    pub reports: Vec<WarmReport>,
    /// Number of URLs newly stored.
    pub populated: usize,
    pub failed: usize,
}

/// Implementation of the cache_warm tool.
pub async fn warm_impl(cache: &AssetCache, params: CacheWarmParams) -> Result<CallToolResult, McpError> {
    if params.urls.is_empty() {
        return Err(ServerError::InvalidInput("urls cannot be empty".into()).into());
    }
    if params.urls.len() > MAX_WARM_URLS {
        return Err(ServerError::InvalidInput(format!("at most {MAX_WARM_URLS} urls per call")).into());
    }

    let mut reports = cache.consider_many(params.urls.iter().cloned()).await;
    reports.sort_by_key(|r| params.urls.iter().position(|u| *u == r.url));

    let count = |outcome| reports.iter().filter(|r| r.outcome == outcome).count();
    let output = CacheWarmOutput {
        populated: count(WarmOutcome::Populated),
        failed: count(WarmOutcome::Failed),
        reports,
    };

    tracing::info!(urls = params.urls.len(), populated = output.populated, failed = output.failed, "cache warmed");
    Ok(json_result(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{FixedFetcher, output_json};
    use assetcache_core::CacheDb;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_warm_reports_in_input_order() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(FixedFetcher::new(200, "a{}"));
        let cache = AssetCache::new(db.clone(), fetcher.clone());

        let params = CacheWarmParams {
            urls: vec!["https://example.com/page".into(), "https://example.com/site.css".into()],
        };
        let out = output_json(&warm_impl(&cache, params).await.unwrap());

        assert_eq!(out["reports"][0]["outcome"], "ineligible");
        assert_eq!(out["reports"][1]["url"], "https://example.com/site.css");
        assert_eq!(out["reports"][1]["outcome"], "populated");
        assert_eq!(out["populated"], 1);
        assert_eq!(out["failed"], 0);
        assert_eq!(fetcher.call_count(), 1);
        assert!(db.get_entry("https://example.com/site.css").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_warm_counts_failures() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let cache = AssetCache::new(db, Arc::new(FixedFetcher::new(503, "")));

        let params = CacheWarmParams { urls: vec!["https://example.com/app.js".into()] };
        let out = output_json(&warm_impl(&cache, params).await.unwrap());

        assert_eq!(out["reports"][0]["outcome"], "failed");
        assert_eq!(out["failed"], 1);
    }

    #[tokio::test]
    async fn test_warm_rejects_empty_list() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let cache = AssetCache::new(db, Arc::new(FixedFetcher::new(200, "")));

        assert!(warm_impl(&cache, CacheWarmParams { urls: vec![] }).await.is_err());
    }
}
