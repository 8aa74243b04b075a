// Client configuration.
// Loads base URL, cache defaults and timeouts from the environment and validates them.

use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

use crate::cache::DEFAULT_TTL;
use crate::error::{HttpError, Result};

/// Default per-request timeout: 10 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const ENV_API_URL: &str = "API_URL";
pub const ENV_DEFAULT_CACHE_TTL: &str = "API_DEFAULT_CACHE_TTL_MS";
pub const ENV_DEFAULT_TIMEOUT: &str = "API_DEFAULT_TIMEOUT_MS";
pub const ENV_ENABLE_CACHE: &str = "API_ENABLE_CACHE";
pub const ENV_AUTO_PRUNE_INTERVAL: &str = "API_AUTO_PRUNE_INTERVAL_MS";

/// Client-wide settings.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every endpoint is resolved against.
    pub base_url: String,
    /// Master switch for response caching.
    #[serde(default = "default_enable_cache")]
    pub enable_cache: bool,
    /// TTL for cached responses when a request doesn't set one.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "default_cache_ttl_ms", default = "default_ttl")]
    pub default_cache_ttl: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "default_timeout_ms", default = "default_timeout")]
    pub default_timeout: Duration,
    /// Prune expired entries on this interval when set.
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(rename = "auto_prune_interval_ms", default)]
    pub auto_prune_interval: Option<Duration>,
}

fn default_enable_cache() -> bool {
    true
}

fn default_ttl() -> Duration {
    DEFAULT_TTL
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

impl ClientConfig {
    /// Config with defaults for everything but the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            enable_cache: true,
            default_cache_ttl: DEFAULT_TTL,
            default_timeout: DEFAULT_TIMEOUT,
            auto_prune_interval: None,
        }
    }

    pub fn enable_cache(mut self, enabled: bool) -> Self {
        self.enable_cache = enabled;
        self
    }

    pub fn default_cache_ttl(mut self, ttl: Duration) -> Self {
        self.default_cache_ttl = ttl;
        self
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn auto_prune_interval(mut self, interval: Duration) -> Self {
        self.auto_prune_interval = Some(interval);
        self
    }

    /// Load config from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load config from any variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_API_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| invalid(ENV_API_URL, "is required"))?;

        let mut config = Self::new(base_url);

        if let Some(ttl) = lookup(ENV_DEFAULT_CACHE_TTL) {
            config.default_cache_ttl = parse_millis(ENV_DEFAULT_CACHE_TTL, &ttl)?;
        }
        if let Some(timeout) = lookup(ENV_DEFAULT_TIMEOUT) {
            config.default_timeout = parse_millis(ENV_DEFAULT_TIMEOUT, &timeout)?;
        }
        if let Some(enabled) = lookup(ENV_ENABLE_CACHE) {
            config.enable_cache = parse_bool(ENV_ENABLE_CACHE, &enabled)?;
        }
        if let Some(interval) = lookup(ENV_AUTO_PRUNE_INTERVAL) {
            let interval = parse_millis(ENV_AUTO_PRUNE_INTERVAL, &interval)?;
            config.auto_prune_interval = (!interval.is_zero()).then_some(interval);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the base URL is an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| invalid(ENV_API_URL, &format!("is not a valid URL: {}", e)))?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                ENV_API_URL,
                &format!("has unsupported scheme {}", scheme),
            )),
        }
    }
}

fn invalid(name: &str, reason: &str) -> HttpError {
    HttpError::config(format!("Environment variable \"{}\" {}", name, reason))
}

fn parse_millis(name: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| invalid(name, &format!("must be a non-negative integer, got {:?}", value)))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(name, &format!("must be a boolean, got {:?}", value))),
    }
}
