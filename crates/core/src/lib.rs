//! Core types and shared functionality for asset-cache.
//!
//! This crate provides:
//! - Asset store with SQLite backend
//! - Resource classification and staleness policy
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod freshness;

pub use cache::{CacheDb, CacheEntry, CacheStatus, CacheStore, Payload};
pub use config::AppConfig;
pub use error::Error;
