//! Client side of the asset cache.
//!
//! This crate provides the HTTP fetch pipeline, the caching engine with its
//! background revalidation, and the two request interception adapters.

pub mod engine;
pub mod fetch;
pub mod intercept;
pub mod revalidate;
pub mod tasks;
pub mod warm;

#[cfg(test)]
mod test_support;

pub use engine::AssetCache;
pub use fetch::{FetchClient, FetchConfig, FetchRequest, FetchResponse, Fetcher};
pub use intercept::fetch_api::{CachingFetch, FetchOptions, RequestTarget};
pub use intercept::xhr::{CachingRequest, EventedRequest, NetworkRequest, ReadyState, RequestEvent, ResponseSnapshot};
pub use revalidate::{RevalidationOutcome, Revalidator};
pub use tasks::BackgroundTasks;
pub use warm::{DEFAULT_WARM_CONCURRENCY, WarmOutcome, WarmReport};

pub use bytes::Bytes;
pub use reqwest::{Method, StatusCode, header};
