//! SQLite-backed store for cached static assets.
//!
//! One row per exact request URL, holding the body bytes, their text
//! decoding, the origin's etag and the last-confirmed-fresh timestamp.
//! Entries are only removed by a total clear.

pub mod connection;
pub mod entries;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{CacheEntry, CacheStatus, Payload};
pub use store::CacheStore;
