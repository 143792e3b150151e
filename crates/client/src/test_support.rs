//! Scripted collaborators for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use assetcache_core::{CacheEntry, CacheStatus, CacheStore, Error};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::fetch::{FetchRequest, FetchResponse, Fetcher};

type Handler = Box<dyn Fn(&FetchRequest) -> Result<FetchResponse, Error> + Send + Sync>;

pub(crate) fn response(status: u16, body: &[u8], etag: Option<&str>) -> FetchResponse {
    let mut headers = HeaderMap::new();
    if let Some(etag) = etag {
        headers.insert(header::ETAG, HeaderValue::from_str(etag).unwrap());
    }
    FetchResponse {
        url: String::new(),
        status: StatusCode::from_u16(status).unwrap(),
        headers,
        bytes: Bytes::copy_from_slice(body),
        fetch_ms: 0,
    }
}

/// A [`Fetcher`] that records every request and answers from a closure.
pub(crate) struct StubFetcher {
    handler: Handler,
    calls: Mutex<Vec<FetchRequest>>,
}

impl StubFetcher {
    pub(crate) fn new(handler: impl Fn(&FetchRequest) -> Result<FetchResponse, Error> + Send + Sync + 'static) -> Self {
        Self { handler: Box::new(handler), calls: Mutex::new(Vec::new()) }
    }

    pub(crate) fn ok(body: &'static str, etag: Option<&'static str>) -> Self {
        Self::new(move |_| Ok(response(200, body.as_bytes(), etag)))
    }

    pub(crate) fn status(status: u16) -> Self {
        Self::new(move |_| Ok(response(status, b"", None)))
    }

    pub(crate) fn unreachable() -> Self {
        Self::new(|_| Err(Error::Transport("connection refused".into())))
    }

    pub(crate) fn calls(&self) -> Vec<FetchRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, Error> {
        self.calls.lock().unwrap().push(request.clone());
        let mut response = (self.handler)(&request)?;
        response.url = request.url;
        Ok(response)
    }
}

/// A [`CacheStore`] whose every operation fails.
pub(crate) struct FailingStore;

#[async_trait]
impl CacheStore for FailingStore {
    async fn get(&self, _url: &str) -> Result<Option<CacheEntry>, Error> {
        Err(Error::store_closed())
    }

    async fn put(&self, _entry: &CacheEntry) -> Result<(), Error> {
        Err(Error::store_closed())
    }

    async fn clear(&self) -> Result<u64, Error> {
        Err(Error::store_closed())
    }

    async fn status(&self) -> Result<CacheStatus, Error> {
        Err(Error::store_closed())
    }
}

/// A [`CacheStore`] that is empty and rejects every write.
#[derive(Default)]
pub(crate) struct WriteFailingStore {
    puts: AtomicUsize,
}

impl WriteFailingStore {
    pub(crate) fn put_attempts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for WriteFailingStore {
    async fn get(&self, _url: &str) -> Result<Option<CacheEntry>, Error> {
        Ok(None)
    }

    async fn put(&self, _entry: &CacheEntry) -> Result<(), Error> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        Err(Error::store_closed())
    }

    async fn clear(&self) -> Result<u64, Error> {
        Ok(0)
    }

    async fn status(&self) -> Result<CacheStatus, Error> {
        Ok(CacheStatus::default())
    }
}
