//! Caching adapter for a promise-style `fetch(target, options)` surface.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use url::Url;

use assetcache_core::classify::{is_cache_eligible, is_cache_eligible_method};
use assetcache_core::{CacheEntry, Error};

use super::hit_headers;
use crate::engine::AssetCache;
use crate::fetch::{FetchRequest, FetchResponse};

/// Anything `fetch` accepts as its first argument.
#[derive(Debug, Clone)]
pub enum RequestTarget {
    /// A URL string, used verbatim as the cache key.
    Url(String),
    /// A parsed URL, keyed by its serialization.
    Parsed(Url),
    /// A complete request descriptor.
    Request(FetchRequest),
}

impl From<&str> for RequestTarget {
    fn from(url: &str) -> Self {
        RequestTarget::Url(url.to_string())
    }
}

impl From<String> for RequestTarget {
    fn from(url: String) -> Self {
        RequestTarget::Url(url)
    }
}

impl From<Url> for RequestTarget {
    fn from(url: Url) -> Self {
        RequestTarget::Parsed(url)
    }
}

impl From<&Url> for RequestTarget {
    fn from(url: &Url) -> Self {
        RequestTarget::Parsed(url.clone())
    }
}

impl From<FetchRequest> for RequestTarget {
    fn from(request: FetchRequest) -> Self {
        RequestTarget::Request(request)
    }
}

/// The optional second argument to `fetch`.
///
/// Fields that are set override the corresponding parts of a
/// [`RequestTarget::Request`]; headers are merged, options winning.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub method: Option<Method>,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl FetchOptions {
    pub fn method(method: Method) -> Self {
        Self { method: Some(method), ..Default::default() }
    }
}

impl RequestTarget {
    /// The URL string this target resolves to.
    pub fn url(&self) -> &str {
        match self {
            RequestTarget::Url(url) => url,
            RequestTarget::Parsed(url) => url.as_str(),
            RequestTarget::Request(request) => &request.url,
        }
    }

    fn into_request(self, options: FetchOptions) -> FetchRequest {
        let mut request = match self {
            RequestTarget::Url(url) => FetchRequest::get(url),
            RequestTarget::Parsed(url) => FetchRequest::get(String::from(url)),
            RequestTarget::Request(request) => request,
        };
        if let Some(method) = options.method {
            request.method = method;
        }
        for (name, value) in &options.headers {
            request.headers.insert(name.clone(), value.clone());
        }
        if options.body.is_some() {
            request.body = options.body;
        }
        request
    }
}

/// `fetch` with the asset cache in front of it.
#[derive(Clone)]
pub struct CachingFetch {
    cache: Arc<AssetCache>,
}

impl CachingFetch {
    pub fn new(cache: Arc<AssetCache>) -> Self {
        Self { cache }
    }

    /// Issue a request, answering eligible GETs from the cache when possible.
    ///
    /// # Errors
    ///
    /// Only errors the uncached request would also have produced: the cache
    /// layer never turns a request that would succeed into a failure.
    pub async fn fetch(
        &self, target: impl Into<RequestTarget>, options: FetchOptions,
    ) -> Result<FetchResponse, Error> {
        let request = target.into().into_request(options);

        if !is_cache_eligible_method(Some(request.method.as_str())) || !is_cache_eligible(&request.url) {
            return self.passthrough(request).await;
        }

        match self.cache.lookup(&request.url).await {
            Ok(Some(entry)) => {
                self.cache.on_hit(&entry);
                return Ok(hit_response(&entry));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache lookup failed; using network");
                return self.passthrough(request).await;
            }
        }

        self.fetch_and_store(request).await
    }

    async fn fetch_and_store(&self, request: FetchRequest) -> Result<FetchResponse, Error> {
        tracing::debug!(url = %request.url, "cache miss");

        let response = match self.cache.fetcher().fetch(request.clone()).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "miss fetch failed; retrying uncached");
                return self.passthrough(request).await;
            }
        };

        if response.is_cacheable()
            && let Err(e) = self
                .cache
                .store_fetched(&request.url, &response.headers, &response.bytes)
                .await
        {
            tracing::warn!(url = %request.url, error = %e, "failed to cache response");
        }

        Ok(response)
    }

    async fn passthrough(&self, request: FetchRequest) -> Result<FetchResponse, Error> {
        self.cache.fetcher().fetch(request).await
    }
}

/// A 200 response carrying a copy of the cached bytes.
fn hit_response(entry: &CacheEntry) -> FetchResponse {
    FetchResponse {
        url: entry.url.clone(),
        status: StatusCode::OK,
        headers: hit_headers(&entry.url),
        bytes: Bytes::copy_from_slice(entry.payload.bytes()),
        fetch_ms: 0,
    }
}
