//! asset_fetch tool implementation.
//!
//! Issues a request through the caching fetch adapter, so eligible static
//! assets are served from (and stored into) the cache.

use std::collections::BTreeMap;

use assetcache_client::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use assetcache_client::intercept::served_from_cache;
use assetcache_client::{CachingFetch, FetchOptions, Method};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ServerError;

/// Input parameters for the asset_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetFetchParams {
    /// The URL to request.
    pub url: String,

    /// HTTP method (default: GET). Only GET is ever served from the cache.
    #[serde(default)]
    pub method: Option<String>,

    /// Extra request headers.
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
}

/// Output structure for the asset_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetFetchOutput {
    pub url: String,
    pub status: u16,
    /// Whether the body came from the cache rather than the network.
    pub from_cache: bool,
    pub content_type: Option<String>,
    /// Body size in bytes.
    pub size: usize,
    pub headers: BTreeMap<String, String>,
    /// Body as text, for textual content types only.
    pub text: Option<String>,
}

fn parse_method(method: Option<&str>) -> Result<Method, ServerError> {
    match method {
        None => Ok(Method::GET),
        Some(m) => Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| ServerError::InvalidInput(format!("invalid method: {m}"))),
    }
}

fn parse_headers(headers: Option<BTreeMap<String, String>>) -> Result<HeaderMap, ServerError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers.unwrap_or_default() {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ServerError::InvalidInput(format!("invalid header name: {name}")))?;
        let header_value = HeaderValue::from_str(&value)
            .map_err(|_| ServerError::InvalidInput(format!("invalid value for header {name}")))?;
        map.append(header_name, header_value);
    }
    Ok(map)
}

fn is_textual(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    essence.starts_with("text/")
        || essence.ends_with("javascript")
        || essence.ends_with("json")
        || essence.ends_with("xml")
}

/// Implementation of the asset_fetch tool.
pub async fn fetch_impl(adapter: &CachingFetch, params: AssetFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ServerError::InvalidInput("url cannot be empty".into()).into());
    }

    let method = parse_method(params.method.as_deref())?;
    let headers = parse_headers(params.headers)?;
    let options = FetchOptions { method: Some(method), headers, body: None };

    let response = adapter.fetch(params.url.as_str(), options).await?;

    let content_type = response
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let text = content_type
        .as_deref()
        .filter(|ct| is_textual(ct))
        .map(|_| String::from_utf8_lossy(&response.bytes).into_owned());
    let headers = response
        .headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();

    let output = AssetFetchOutput {
        url: params.url,
        status: response.status.as_u16(),
        from_cache: served_from_cache(&response.headers),
        content_type,
        size: response.bytes.len(),
        headers,
        text,
    };

    tracing::info!(url = %output.url, status = output.status, from_cache = output.from_cache, "asset fetched");
    Ok(json_result(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{FixedFetcher, output_json};
    use assetcache_client::AssetCache;
    use assetcache_core::CacheDb;
    use std::sync::Arc;

    async fn adapter(fetcher: Arc<FixedFetcher>) -> CachingFetch {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        CachingFetch::new(Arc::new(AssetCache::new(db, fetcher)))
    }

    fn params(url: &str) -> AssetFetchParams {
        AssetFetchParams { url: url.to_string(), method: None, headers: None }
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let fetcher = Arc::new(FixedFetcher::new(200, "console.log(1)"));
        let adapter = adapter(fetcher.clone()).await;

        let first = output_json(&fetch_impl(&adapter, params("https://example.com/app.js")).await.unwrap());
        assert_eq!(first["from_cache"], false);

        let second = output_json(&fetch_impl(&adapter, params("https://example.com/app.js")).await.unwrap());
        assert_eq!(second["from_cache"], true);
        assert_eq!(second["status"], 200);
        assert_eq!(second["content_type"], "application/javascript");
        assert_eq!(second["text"], "console.log(1)");
        assert_eq!(second["size"], 14);
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_non_static_url_is_not_cached() {
        let fetcher = Arc::new(FixedFetcher::new(200, "{}"));
        let adapter = adapter(fetcher.clone()).await;

        fetch_impl(&adapter, params("https://example.com/api/data")).await.unwrap();
        let out = output_json(&fetch_impl(&adapter, params("https://example.com/api/data")).await.unwrap());

        assert_eq!(out["from_cache"], false);
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let adapter = adapter(Arc::new(FixedFetcher::new(200, ""))).await;

        assert!(fetch_impl(&adapter, params("  ")).await.is_err());

        let bad_method =
            AssetFetchParams { method: Some("GE T".into()), ..params("https://example.com/app.js") };
        assert!(fetch_impl(&adapter, bad_method).await.is_err());

        let bad_header = AssetFetchParams {
            headers: Some(BTreeMap::from([("bad header".to_string(), "x".to_string())])),
            ..params("https://example.com/app.js")
        };
        assert!(fetch_impl(&adapter, bad_header).await.is_err());
    }

    #[test]
    fn test_is_textual() {
        assert!(is_textual("text/css"));
        assert!(is_textual("application/javascript; charset=utf-8"));
        assert!(is_textual("image/svg+xml"));
        assert!(!is_textual("image/png"));
        assert!(!is_textual("application/octet-stream"));
    }
}
