//! Async HTTP client with an in-memory response cache.
//!
//! GET responses are cached per client with a TTL. Each request picks a
//! strategy: `cache-first`, `network-first` (falls back to cached data when
//! the network fails) or `cache-only`. The cache can be inspected and
//! invalidated by regex through [`HttpClient::cache`], and expired entries
//! are dropped lazily on read, by [`HttpCache::prune`], or on a background
//! interval.
//!
//! ```rust,no_run
//! use http_cache_client::{CacheOptions, CacheStrategy, ClientConfig, HttpClient, RequestOptions};
//! use serde_json::Value;
//!
//! # async fn run() -> http_cache_client::Result<()> {
//! let client = HttpClient::new(ClientConfig::new("https://api.example.com"))?;
//!
//! let options = RequestOptions::new()
//!     .cache(CacheOptions::new().strategy(CacheStrategy::NetworkFirst));
//! let user: Value = client.get("/users/1", options).await?;
//!
//! client.cache().invalidate_pattern(r"^GET:.*/users/")?;
//! client.destroy();
//! # let _ = user;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod error;

pub use api::{
    CacheOptions, CacheStrategy, HttpClient, HttpClientBuilder, Method, ReqwestTransport,
    RequestOptions, Transport, TransportError, TransportRequest, TransportResponse, endpoints,
};
pub use cache::{CacheEntry, HttpCache, Params};
pub use config::ClientConfig;
pub use diagnostics::{DiagnosticSink, LogLevel, LogRecord, MemorySink, NoopSink, TracingSink};
pub use error::{ErrorKind, HttpError, Result};
pub use tokio_util::sync::CancellationToken;
