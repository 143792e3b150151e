//! Caching adapter for an event-driven request object.
//!
//! The surface mirrors the classic `open(method, url)` / `send(body)`
//! lifecycle. Completion is never returned from `send`: it is announced
//! through [`RequestEvent`]s delivered on a channel, and the final state is
//! read from [`ResponseSnapshot`] afterwards.
//!
//! A cache hit yields to the runtime once before publishing its completion
//! events, so listeners never observe them synchronously inside `send`.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, StatusCode};
use reqwest::header::HeaderMap;
use tokio::sync::mpsc;

use assetcache_core::CacheEntry;
use assetcache_core::classify::{is_cache_eligible, is_cache_eligible_method};

use super::hit_headers;
use crate::engine::AssetCache;
use crate::fetch::{FetchRequest, Fetcher, is_cacheable_status};

/// Lifecycle stage of a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    #[default]
    Unsent,
    Opened,
    HeadersReceived,
    Loading,
    Done,
}

/// Events emitted while a request runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestEvent {
    ReadyStateChange(ReadyState),
    /// The request completed with a response.
    Load,
    /// The request failed without a response.
    Error(String),
}

/// Where a request publishes its events.
pub type EventSink = mpsc::UnboundedSender<RequestEvent>;

fn emit(events: &EventSink, event: RequestEvent) {
    // A dropped receiver only means nobody is listening.
    let _ = events.send(event);
}

/// Observable state of a request.
#[derive(Debug, Clone, Default)]
pub struct ResponseSnapshot {
    pub ready_state: ReadyState,
    /// 0 until a response arrives, and after a network error.
    pub status: u16,
    pub headers: HeaderMap,
    pub response: Bytes,
    pub response_text: String,
}

impl ResponseSnapshot {
    fn completed(status: u16, headers: HeaderMap, body: Bytes) -> Self {
        let response_text = String::from_utf8_lossy(&body).into_owned();
        Self { ready_state: ReadyState::Done, status, headers, response: body, response_text }
    }

    fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            ready_state: ReadyState::Done,
            status: 200,
            headers: hit_headers(&entry.url),
            response: Bytes::copy_from_slice(entry.payload.bytes()),
            response_text: entry.payload.text().to_string(),
        }
    }

    /// Finished with a status whose body is the whole asset.
    pub fn is_cacheable(&self) -> bool {
        self.ready_state == ReadyState::Done && StatusCode::from_u16(self.status).is_ok_and(is_cacheable_status)
    }
}

/// An event-driven request implementation.
#[async_trait]
pub trait EventedRequest: Send {
    fn open(&mut self, method: Method, url: &str);

    /// Run the request to completion, publishing lifecycle events on `events`.
    async fn send(&mut self, body: Option<Bytes>, events: &EventSink);

    fn snapshot(&self) -> &ResponseSnapshot;
}

/// The uncached request object, backed by a [`Fetcher`].
pub struct NetworkRequest {
    fetcher: Arc<dyn Fetcher>,
    method: Method,
    url: String,
    headers: HeaderMap,
    snapshot: ResponseSnapshot,
}

impl NetworkRequest {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            method: Method::GET,
            url: String::new(),
            headers: HeaderMap::new(),
            snapshot: ResponseSnapshot::default(),
        }
    }

    /// Add a header to the next `send`.
    pub fn set_request_header(&mut self, name: reqwest::header::HeaderName, value: reqwest::header::HeaderValue) {
        self.headers.append(name, value);
    }
}

#[async_trait]
impl EventedRequest for NetworkRequest {
    fn open(&mut self, method: Method, url: &str) {
        self.method = method;
        self.url = url.to_string();
        self.headers.clear();
        self.snapshot = ResponseSnapshot { ready_state: ReadyState::Opened, ..Default::default() };
    }

    async fn send(&mut self, body: Option<Bytes>, events: &EventSink) {
        let request = FetchRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body,
        };

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.snapshot = ResponseSnapshot {
                    ready_state: ReadyState::HeadersReceived,
                    status: response.status.as_u16(),
                    headers: response.headers.clone(),
                    ..Default::default()
                };
                emit(events, RequestEvent::ReadyStateChange(ReadyState::HeadersReceived));
                emit(events, RequestEvent::ReadyStateChange(ReadyState::Loading));
                self.snapshot = ResponseSnapshot::completed(response.status.as_u16(), response.headers, response.bytes);
                emit(events, RequestEvent::ReadyStateChange(ReadyState::Done));
                emit(events, RequestEvent::Load);
            }
            Err(e) => {
                self.snapshot = ResponseSnapshot { ready_state: ReadyState::Done, ..Default::default() };
                emit(events, RequestEvent::ReadyStateChange(ReadyState::Done));
                emit(events, RequestEvent::Error(e.to_string()));
            }
        }
    }

    fn snapshot(&self) -> &ResponseSnapshot {
        &self.snapshot
    }
}

/// Wraps an [`EventedRequest`] so eligible GETs are answered from the cache.
pub struct CachingRequest<R> {
    inner: R,
    cache: Arc<AssetCache>,
    method: Option<Method>,
    url: Option<String>,
    served: Option<ResponseSnapshot>,
    events_tx: EventSink,
    events_rx: Option<mpsc::UnboundedReceiver<RequestEvent>>,
}

impl<R: EventedRequest> CachingRequest<R> {
    pub fn new(inner: R, cache: Arc<AssetCache>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self { inner, cache, method: None, url: None, served: None, events_tx, events_rx: Some(events_rx) }
    }

    /// Take the event stream. Only the first call returns it.
    pub fn events(&mut self) -> Option<mpsc::UnboundedReceiver<RequestEvent>> {
        self.events_rx.take()
    }

    /// Mutable access to the wrapped request, e.g. to set request headers.
    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Record the target and open the wrapped request.
    pub fn open(&mut self, method: Method, url: &str) {
        self.method = Some(method.clone());
        self.url = Some(url.to_string());
        self.served = None;
        self.inner.open(method, url);
    }

    /// Send the request. Completion is signalled through [`Self::events`].
    pub async fn send(&mut self, body: Option<Bytes>) {
        let Some(url) = self.eligible_url() else {
            self.inner.send(body, &self.events_tx).await;
            return;
        };

        match self.cache.lookup(&url).await {
            Ok(Some(entry)) => {
                self.cache.on_hit(&entry);
                self.served = Some(ResponseSnapshot::from_entry(&entry));
                tokio::task::yield_now().await;
                emit(&self.events_tx, RequestEvent::ReadyStateChange(ReadyState::Done));
                emit(&self.events_tx, RequestEvent::Load);
            }
            Ok(None) => {
                self.inner.send(body, &self.events_tx).await;
                self.store_if_cacheable(&url).await;
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "cache lookup failed; using network");
                self.inner.send(body, &self.events_tx).await;
            }
        }
    }

    fn eligible_url(&self) -> Option<String> {
        let method = self.method.as_ref().map(Method::as_str);
        match &self.url {
            Some(url) if is_cache_eligible_method(method) && is_cache_eligible(url) => Some(url.clone()),
            _ => None,
        }
    }

    async fn store_if_cacheable(&self, url: &str) {
        let snapshot = self.inner.snapshot();
        if !snapshot.is_cacheable() {
            return;
        }
        if let Err(e) = self.cache.store_fetched(url, &snapshot.headers, &snapshot.response).await {
            tracing::warn!(url, error = %e, "failed to cache response");
        }
    }

    /// Current state: the synthesized hit, or the wrapped request's own.
    pub fn snapshot(&self) -> &ResponseSnapshot {
        self.served.as_ref().unwrap_or_else(|| self.inner.snapshot())
    }

    pub fn ready_state(&self) -> ReadyState {
        self.snapshot().ready_state
    }

    pub fn status(&self) -> u16 {
        self.snapshot().status
    }

    pub fn response(&self) -> &Bytes {
        &self.snapshot().response
    }

    pub fn response_text(&self) -> &str {
        &self.snapshot().response_text
    }
}
