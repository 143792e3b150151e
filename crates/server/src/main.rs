//! asset-cache server entry point.
//!
//! Boots the MCP server on stdio transport. Logging goes to stderr to avoid
//! interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use assetcache_client::{AssetCache, FetchClient};
use assetcache_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        db_path = %config.db_path.display(),
        max_age_ms = config.max_age_ms,
        "Starting asset-cache server on stdio transport"
    );

    let db = Arc::new(CacheDb::open(&config.db_path).await?);
    let fetcher = Arc::new(FetchClient::new((&config).into())?);
    let cache = Arc::new(AssetCache::new(db.clone(), fetcher).with_max_age(config.max_age()));

    let handler = handler::AssetCacheServer::new(Arc::clone(&cache));
    let server = serve_server(handler, stdio()).await?;
    server.waiting().await?;

    tracing::info!(pending = cache.pending_revalidations(), "shutting down; draining revalidations");
    cache.drain().await;
    drop(cache);

    match Arc::try_unwrap(db) {
        Ok(db) => db.close().await?,
        Err(_) => tracing::warn!("cache store still referenced at shutdown; skipping close"),
    }

    Ok(())
}
