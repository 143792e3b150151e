//! Opportunistic cache warm-up.
//!
//! Page scanners hand candidate URLs to [`AssetCache::consider_for_cache`].
//! Each URL is handled in isolation: a failure is logged and reported for
//! that URL only.

use futures_util::{Stream, StreamExt, stream};
use serde::Serialize;

use assetcache_core::Error;
use assetcache_core::classify::is_cache_eligible;

use crate::engine::AssetCache;
use crate::fetch::FetchRequest;

/// Candidate URLs processed concurrently by [`AssetCache::consider_many`].
pub const DEFAULT_WARM_CONCURRENCY: usize = 4;

/// What warm-up did with a candidate URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WarmOutcome {
    /// Not a cacheable static asset.
    Ineligible,
    /// Fetched and stored for the first time.
    Populated,
    /// Already cached and within max age.
    Fresh,
    /// Cached but stale; a background revalidation was started.
    Revalidating,
    /// The fetch or the store failed.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct WarmReport {
    pub url: String,
    pub outcome: WarmOutcome,
}

impl AssetCache {
    /// Make sure `url` is cached if it is a static asset.
    pub async fn consider_for_cache(&self, url: &str) -> WarmOutcome {
        if !is_cache_eligible(url) {
            return WarmOutcome::Ineligible;
        }

        match self.warm(url).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(url, error = %e, "warm-up failed");
                WarmOutcome::Failed
            }
        }
    }

    async fn warm(&self, url: &str) -> Result<WarmOutcome, Error> {
        if let Some(entry) = self.lookup(url).await? {
            if self.is_stale(&entry) {
                self.spawn_revalidation(url, entry);
                return Ok(WarmOutcome::Revalidating);
            }
            return Ok(WarmOutcome::Fresh);
        }

        let response = self.fetcher().fetch(FetchRequest::get(url)).await?;
        if !response.is_cacheable() {
            return Err(Error::HttpStatus(response.status.as_u16()));
        }
        self.store_fetched(url, &response.headers, &response.bytes).await?;
        Ok(WarmOutcome::Populated)
    }

    /// Consider every URL from `urls`, at most `concurrency` at a time.
    ///
    /// Reports come back in completion order.
    pub async fn consider_stream<S>(&self, urls: S, concurrency: usize) -> Vec<WarmReport>
    where
        S: Stream<Item = String>,
    {
        urls.map(|url| async move {
            let outcome = self.consider_for_cache(&url).await;
            WarmReport { url, outcome }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
    }

    /// Consider a batch of candidate URLs.
    pub async fn consider_many<I>(&self, urls: I) -> Vec<WarmReport>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        self.consider_stream(stream::iter(urls), DEFAULT_WARM_CONCURRENCY).await
    }
}
