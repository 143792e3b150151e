//! Cached asset entries and their CRUD operations.

use super::connection::CacheDb;
use crate::Error;
use crate::freshness;
use serde::Serialize;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Response body kept in two views derived from one byte source.
///
/// The text view is the lossy UTF-8 decoding of the bytes; invalid
/// sequences become U+FFFD, so decoding never rejects a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    bytes: Vec<u8>,
    text: String,
}

impl Payload {
    /// Build a payload from raw bytes, deriving the text view.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        Self { bytes, text }
    }

    /// Rehydrate a payload from its stored columns.
    pub(crate) fn from_stored(bytes: Vec<u8>, text: String) -> Self {
        Self { bytes, text }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A cached static asset.
///
/// `timestamp` is the epoch-millisecond instant the entry was last
/// confirmed fresh, either by the original fetch or by a revalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub url: String,
    pub payload: Payload,
    pub etag: Option<String>,
    pub timestamp: i64,
}

impl CacheEntry {
    pub fn new(url: impl Into<String>, payload: Payload, etag: Option<String>, timestamp: i64) -> Self {
        Self { url: url.into(), payload, etag, timestamp }
    }

    /// Same payload and etag, confirmed fresh at `timestamp`.
    pub fn refreshed(&self, timestamp: i64) -> Self {
        Self { timestamp, ..self.clone() }
    }

    pub fn is_stale(&self, now_ms: i64, max_age_ms: u64) -> bool {
        freshness::is_stale(self.timestamp, now_ms, max_age_ms)
    }
}

/// Entry count and payload volume, for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct CacheStatus {
    pub count: u64,
    pub total_bytes: u64,
}

impl CacheDb {
    /// Get the entry stored for `url`, if any.
    pub async fn get_entry(&self, url: &str) -> Result<Option<CacheEntry>, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare("SELECT url, body, body_text, etag, timestamp FROM assets WHERE url = ?1")?;

                let result = stmt.query_row(params![url], |row| {
                    Ok(CacheEntry {
                        url: row.get(0)?,
                        payload: Payload::from_stored(row.get(1)?, row.get(2)?),
                        etag: row.get(3)?,
                        timestamp: row.get(4)?,
                    })
                });

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace the entry for `entry.url`.
    ///
    /// Payload and etag are written in one statement, so a reader never sees
    /// a body paired with another response's validator.
    pub async fn put_entry(&self, entry: &CacheEntry) -> Result<(), Error> {
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO assets (url, body, body_text, etag, timestamp)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(url) DO UPDATE SET
                        body = excluded.body,
                        body_text = excluded.body_text,
                        etag = excluded.etag,
                        timestamp = excluded.timestamp",
                    params![&entry.url, entry.payload.bytes(), entry.payload.text(), &entry.etag, entry.timestamp],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry.
    ///
    /// Returns the number of deleted entries.
    pub async fn clear_entries(&self) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM assets", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Count entries and sum their payload sizes with a full scan.
    pub async fn entry_status(&self) -> Result<CacheStatus, Error> {
        self.conn
            .call(move |conn| -> Result<CacheStatus, Error> {
                let (count, total_bytes): (i64, i64) =
                    conn.query_row("SELECT COUNT(*), COALESCE(SUM(LENGTH(body)), 0) FROM assets", [], |row| {
                        Ok((row.get(0)?, row.get(1)?))
                    })?;
                Ok(CacheStatus { count: count as u64, total_bytes: total_bytes as u64 })
            })
            .await
            .map_err(Error::from)
    }
}
