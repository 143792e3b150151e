//! The storage seam used by the caching engine.

use async_trait::async_trait;

use super::connection::CacheDb;
use super::entries::{CacheEntry, CacheStatus};
use crate::Error;

/// Persistent key-value store of cached assets, keyed by exact URL.
///
/// A read failure is an error, never a miss. A successful `put` is visible
/// to every later `get` in the same process. Concurrent writers to the same
/// URL are not ordered: the last `put` to complete wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, url: &str) -> Result<Option<CacheEntry>, Error>;

    async fn put(&self, entry: &CacheEntry) -> Result<(), Error>;

    /// Remove every entry, returning how many were removed.
    async fn clear(&self) -> Result<u64, Error>;

    async fn status(&self) -> Result<CacheStatus, Error>;

    async fn count(&self) -> Result<u64, Error> {
        Ok(self.status().await?.count)
    }

    async fn total_bytes(&self) -> Result<u64, Error> {
        Ok(self.status().await?.total_bytes)
    }
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn get(&self, url: &str) -> Result<Option<CacheEntry>, Error> {
        self.get_entry(url).await
    }

    async fn put(&self, entry: &CacheEntry) -> Result<(), Error> {
        self.put_entry(entry).await
    }

    async fn clear(&self) -> Result<u64, Error> {
        self.clear_entries().await
    }

    async fn status(&self) -> Result<CacheStatus, Error> {
        self.entry_status().await
    }
}
