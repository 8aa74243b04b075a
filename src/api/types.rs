// Request types for the caching HTTP client.
// Defines methods, per-request options and per-request cache options.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::cache::Params;
use crate::error::HttpError;

/// HTTP methods supported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Only read-only requests are ever cached.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Policy for choosing between cached data and a live request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStrategy {
    /// Serve fresh cached data, otherwise go to the network.
    #[default]
    CacheFirst,
    /// Go to the network, fall back to cached data on failure.
    NetworkFirst,
    /// Serve cached data only, never touch the network.
    CacheOnly,
}

impl CacheStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStrategy::CacheFirst => "cache-first",
            CacheStrategy::NetworkFirst => "network-first",
            CacheStrategy::CacheOnly => "cache-only",
        }
    }
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheStrategy {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cache-first" => Ok(CacheStrategy::CacheFirst),
            "network-first" => Ok(CacheStrategy::NetworkFirst),
            "cache-only" => Ok(CacheStrategy::CacheOnly),
            other => Err(HttpError::validation(format!(
                "unknown cache strategy: {}",
                other
            ))),
        }
    }
}

/// Predicate deciding whether cached data may still be served.
pub type Validator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Per-request cache options.
#[derive(Clone)]
pub struct CacheOptions {
    /// Set to false to bypass the cache for this request.
    pub enabled: bool,
    /// Lifetime of the stored response; the client default when absent.
    pub ttl: Option<Duration>,
    /// Explicit cache key instead of the derived one.
    pub key: Option<String>,
    pub strategy: CacheStrategy,
    /// Rejecting cached data forces a network request (cache-first only).
    pub is_valid: Option<Validator>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: None,
            key: None,
            strategy: CacheStrategy::default(),
            is_valid: None,
        }
    }
}

impl fmt::Debug for CacheOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheOptions")
            .field("enabled", &self.enabled)
            .field("ttl", &self.ttl)
            .field("key", &self.key)
            .field("strategy", &self.strategy)
            .field("is_valid", &self.is_valid.is_some())
            .finish()
    }
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that turn caching off for one request.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn strategy(mut self, strategy: CacheStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn is_valid<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.is_valid = Some(Arc::new(validator));
        self
    }

    /// Whether cached `data` passes the validator, if any.
    pub fn accepts(&self, data: &Value) -> bool {
        self.is_valid.as_ref().is_none_or(|valid| valid(data))
    }
}

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub params: Option<Params>,
    pub headers: BTreeMap<String, String>,
    /// Overrides the client's default timeout.
    pub timeout: Option<Duration>,
    /// Aborts the request when cancelled.
    pub cancel: Option<CancellationToken>,
    pub cache: CacheOptions,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(Params::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn cache(mut self, cache: CacheOptions) -> Self {
        self.cache = cache;
        self
    }
}
