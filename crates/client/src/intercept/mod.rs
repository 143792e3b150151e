//! Request interception.
//!
//! Two adapters put the cache in front of two request surfaces without
//! changing their contracts:
//!
//! - [`fetch_api::CachingFetch`]: a promise-style `fetch(target, options)`.
//! - [`xhr::CachingRequest`]: an event-driven `open`/`send` request object.
//!
//! Both follow the same per-request path. Ineligible requests pass through
//! untouched. Eligible ones are looked up; a hit is served from the store
//! (revalidating in the background when stale), a miss is fetched and
//! written back. A fault in the cache layer always degrades to the plain
//! network path.

pub mod fetch_api;
pub mod xhr;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use assetcache_core::classify::content_type_for;

/// Header marking a response synthesized from the cache.
pub const CACHE_MARKER_HEADER: &str = "x-asset-cache";

/// Value of [`CACHE_MARKER_HEADER`] on cache hits.
pub const CACHE_MARKER_HIT: &str = "hit";

/// Headers of a response synthesized for a cache hit on `url`.
pub fn hit_headers(url: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type_for(url)));
    headers.insert(HeaderName::from_static(CACHE_MARKER_HEADER), HeaderValue::from_static(CACHE_MARKER_HIT));
    headers
}

/// Whether `headers` belong to a response served from the cache.
pub fn served_from_cache(headers: &HeaderMap) -> bool {
    headers
        .get(CACHE_MARKER_HEADER)
        .is_some_and(|v| v.as_bytes() == CACHE_MARKER_HIT.as_bytes())
}
