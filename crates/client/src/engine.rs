//! The caching engine shared by both interception adapters.
//!
//! [`AssetCache`] is an explicitly constructed handle over one store and
//! one fetcher. Adapters hold it behind an `Arc`; nothing here is global.

use std::sync::Arc;
use std::time::Duration;

use assetcache_core::freshness::{DEFAULT_MAX_AGE_MS, now_ms};
use assetcache_core::{CacheEntry, CacheStatus, CacheStore, Error, Payload};
use reqwest::header::HeaderMap;

use crate::fetch::{Fetcher, etag_of};
use crate::revalidate::{RevalidationOutcome, Revalidator};
use crate::tasks::BackgroundTasks;

/// Cache-aside engine with stale-while-revalidate refresh.
pub struct AssetCache {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    revalidator: Revalidator,
    tasks: BackgroundTasks,
    max_age_ms: u64,
}

impl AssetCache {
    pub fn new(store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        let revalidator = Revalidator::new(Arc::clone(&store), Arc::clone(&fetcher));
        Self { store, fetcher, revalidator, tasks: BackgroundTasks::new(), max_age_ms: DEFAULT_MAX_AGE_MS }
    }

    /// Set the age after which entries are revalidated.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age_ms = u64::try_from(max_age.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn max_age_ms(&self) -> u64 {
        self.max_age_ms
    }

    /// The fetcher used for misses and for uncached pass-through requests.
    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    pub fn is_stale(&self, entry: &CacheEntry) -> bool {
        entry.is_stale(now_ms(), self.max_age_ms)
    }

    /// Read the entry for `url`. A store fault is an error, not a miss.
    pub async fn lookup(&self, url: &str) -> Result<Option<CacheEntry>, Error> {
        self.store.get(url).await
    }

    /// Record a hit: schedules a background revalidation if `entry` is stale.
    ///
    /// Returns whether the entry was stale.
    pub fn on_hit(&self, entry: &CacheEntry) -> bool {
        let stale = self.is_stale(entry);
        tracing::debug!(url = %entry.url, stale, "cache hit");
        if stale {
            self.spawn_revalidation(&entry.url, entry.clone());
        }
        stale
    }

    /// Write a freshly fetched body for `url` into the store.
    pub async fn store_fetched(&self, url: &str, headers: &HeaderMap, body: &[u8]) -> Result<CacheEntry, Error> {
        let entry = CacheEntry::new(url, Payload::from_bytes(body), etag_of(headers), now_ms());
        self.store.put(&entry).await?;
        tracing::debug!(url, bytes = entry.payload.len(), etag = ?entry.etag, "cached");
        Ok(entry)
    }

    /// Revalidate `entry` and wait for the outcome.
    pub async fn revalidate(&self, url: &str, entry: &CacheEntry) -> Result<RevalidationOutcome, Error> {
        self.revalidator.revalidate(url, entry).await
    }

    /// Revalidate `entry` in the background. Failures are logged and dropped.
    pub fn spawn_revalidation(&self, url: &str, entry: CacheEntry) {
        let revalidator = self.revalidator.clone();
        let url = url.to_string();
        self.tasks.spawn(async move {
            if let Err(e) = revalidator.revalidate(&url, &entry).await {
                tracing::warn!(url = %url, error = %e, "background revalidation failed; keeping cached copy");
            }
        });
    }

    /// Remove every cached entry.
    pub async fn clear(&self) -> Result<u64, Error> {
        let deleted = self.store.clear().await?;
        tracing::info!(deleted, "cache cleared");
        Ok(deleted)
    }

    pub async fn status(&self) -> Result<CacheStatus, Error> {
        self.store.status().await
    }

    /// Number of background revalidations not yet reaped.
    pub fn pending_revalidations(&self) -> usize {
        self.tasks.in_flight()
    }

    /// Wait for all background revalidations to finish.
    pub async fn drain(&self) {
        self.tasks.drain().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingStore, StubFetcher};
    use assetcache_core::CacheDb;
    use reqwest::header::{ETAG, HeaderValue};

    const URL: &str = "https://example.com/app.js";

    async fn engine(fetcher: StubFetcher) -> (Arc<CacheDb>, Arc<StubFetcher>, AssetCache) {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(fetcher);
        let cache = AssetCache::new(db.clone(), fetcher.clone());
        (db, fetcher, cache)
    }

    #[tokio::test]
    async fn test_store_fetched_extracts_etag() {
        let (db, _fetcher, cache) = engine(StubFetcher::unreachable()).await;
        let mut headers = HeaderMap::new();
        headers.insert(ETAG, HeaderValue::from_static("\"abc\""));

        cache.store_fetched(URL, &headers, b"x()").await.unwrap();

        let stored = db.get_entry(URL).await.unwrap().unwrap();
        assert_eq!(stored.etag.as_deref(), Some("\"abc\""));
        assert_eq!(stored.payload.bytes(), b"x()");
    }

    #[tokio::test]
    async fn test_fresh_hit_does_not_revalidate() {
        let (_db, fetcher, cache) = engine(StubFetcher::status(304)).await;
        let entry = CacheEntry::new(URL, Payload::from_bytes("a"), None, now_ms());

        assert!(!cache.on_hit(&entry));
        cache.drain().await;
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_hit_revalidates_in_background() {
        let (db, fetcher, cache) = engine(StubFetcher::status(304)).await;
        let entry = CacheEntry::new(URL, Payload::from_bytes("a"), Some("\"v1\"".into()), 0);
        db.put_entry(&entry).await.unwrap();

        assert!(cache.on_hit(&entry));
        cache.drain().await;

        assert_eq!(fetcher.call_count(), 1);
        assert!(db.get_entry(URL).await.unwrap().unwrap().timestamp > 0);
    }

    #[tokio::test]
    async fn test_background_failure_is_swallowed() {
        let (db, _fetcher, cache) = engine(StubFetcher::unreachable()).await;
        let entry = CacheEntry::new(URL, Payload::from_bytes("a"), None, 0);
        db.put_entry(&entry).await.unwrap();

        cache.spawn_revalidation(URL, entry.clone());
        cache.drain().await;

        assert_eq!(db.get_entry(URL).await.unwrap().unwrap(), entry);
    }

    #[tokio::test]
    async fn test_custom_max_age() {
        let (_db, _fetcher, cache) = engine(StubFetcher::unreachable()).await;
        let cache = cache.with_max_age(Duration::from_secs(1));
        assert_eq!(cache.max_age_ms(), 1_000);

        let entry = CacheEntry::new(URL, Payload::from_bytes("a"), None, now_ms() - 5_000);
        assert!(cache.is_stale(&entry));
    }

    #[tokio::test]
    async fn test_status_and_clear_surface_store_errors() {
        let cache = AssetCache::new(Arc::new(FailingStore), Arc::new(StubFetcher::unreachable()));
        assert!(cache.status().await.is_err());
        assert!(cache.clear().await.is_err());
        assert!(cache.lookup(URL).await.is_err());
    }
}
