//! Conditional revalidation of cached assets.
//!
//! A revalidation sends `If-None-Match` with the stored etag (or nothing,
//! for entries without one) and reconciles the answer into the store:
//!
//! - `304 Not Modified`: keep payload and etag, advance the timestamp.
//! - a complete `2xx` body: replace payload, etag and timestamp together.
//! - anything else: leave the entry untouched and report the error.

use std::sync::Arc;

use assetcache_core::freshness::now_ms;
use assetcache_core::{CacheEntry, CacheStore, Error, Payload};
use reqwest::StatusCode;
use reqwest::header::{HeaderValue, IF_NONE_MATCH};

use crate::fetch::{FetchRequest, Fetcher};

/// How a revalidation changed the stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevalidationOutcome {
    /// Origin answered 304; only the timestamp moved.
    NotModified,
    /// Origin sent new content; payload and etag were replaced.
    Replaced,
}

/// Runs conditional requests against the origin and writes the result back.
#[derive(Clone)]
pub struct Revalidator {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
}

impl Revalidator {
    pub fn new(store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { store, fetcher }
    }

    /// Build the request for revalidating `entry`.
    pub fn conditional_request(url: &str, entry: &CacheEntry) -> FetchRequest {
        let request = FetchRequest::get(url);
        match entry.etag.as_deref().map(HeaderValue::from_str) {
            Some(Ok(etag)) => request.with_header(IF_NONE_MATCH, etag),
            Some(Err(_)) => {
                tracing::debug!(url, "stored etag is not a valid header value, refetching unconditionally");
                request
            }
            None => request,
        }
    }

    /// Revalidate `entry` against the origin and update the store.
    ///
    /// # Errors
    ///
    /// Returns the transport error, `Error::HttpStatus` for an unusable
    /// status, or the store error from the write. The stored entry is not
    /// modified in any of these cases.
    pub async fn revalidate(&self, url: &str, entry: &CacheEntry) -> Result<RevalidationOutcome, Error> {
        let response = self.fetcher.fetch(Self::conditional_request(url, entry)).await?;
        let now = now_ms().max(entry.timestamp);

        if response.status == StatusCode::NOT_MODIFIED {
            self.store.put(&entry.refreshed(now)).await?;
            tracing::debug!(url, "revalidated: not modified");
            return Ok(RevalidationOutcome::NotModified);
        }

        if response.is_cacheable() {
            let fresh = CacheEntry::new(url, Payload::from_bytes(response.bytes.to_vec()), response.etag(), now);
            self.store.put(&fresh).await?;
            tracing::debug!(url, bytes = fresh.payload.len(), "revalidated: replaced");
            return Ok(RevalidationOutcome::Replaced);
        }

        Err(Error::HttpStatus(response.status.as_u16()))
    }
}
