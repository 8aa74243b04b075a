// HTTP client with response caching.
// Applies the per-request cache strategy around the transport and manages background pruning.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cache::{HttpCache, saturating_millis};
use crate::config::ClientConfig;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::{HttpError, Result};

use super::transport::{ReqwestTransport, Transport, TransportRequest, header_map};
use super::types::{CacheStrategy, Method, RequestOptions};

/// Builds an [`HttpClient`] with a custom diagnostic sink or transport.
pub struct HttpClientBuilder {
    config: ClientConfig,
    sink: Arc<dyn DiagnosticSink>,
}

impl HttpClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            sink: Arc::new(TracingSink),
        }
    }

    /// Where request and cache diagnostics go. Defaults to `tracing`.
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Build a client on top of reqwest.
    pub fn build(self) -> Result<HttpClient<ReqwestTransport>> {
        let transport = ReqwestTransport::new()?;
        self.build_with(transport)
    }

    /// Build a client on top of any transport.
    ///
    /// Starts auto-pruning when the config asks for it, which needs a tokio runtime.
    pub fn build_with<T: Transport>(self, transport: T) -> Result<HttpClient<T>> {
        self.config.validate()?;

        let client = HttpClient {
            transport,
            base_url: self.config.base_url.trim_end_matches('/').to_string(),
            cache: Arc::new(HttpCache::with_sink(self.sink.clone())),
            sink: self.sink,
            prune_task: Mutex::new(None),
            config: self.config,
        };

        if let Some(interval) = client.config.auto_prune_interval {
            client.start_auto_prune(interval)?;
        }

        Ok(client)
    }
}

/// HTTP client that caches GET responses in memory.
///
/// Each client owns its cache; nothing is shared between instances.
pub struct HttpClient<T = ReqwestTransport> {
    transport: T,
    base_url: String,
    config: ClientConfig,
    cache: Arc<HttpCache>,
    sink: Arc<dyn DiagnosticSink>,
    prune_task: Mutex<Option<JoinHandle<()>>>,
}

/// Resolved caching parameters for one request.
struct CachePlan {
    key: String,
    ttl: Duration,
    strategy: CacheStrategy,
}

impl HttpClient {
    /// Create a reqwest-backed client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        HttpClientBuilder::new(config).build()
    }

    pub fn builder(config: ClientConfig) -> HttpClientBuilder {
        HttpClientBuilder::new(config)
    }

    /// Create a client from `API_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }
}

impl<T: Transport> HttpClient<T> {
    /// Create a client on top of a custom transport.
    pub fn with_transport(transport: T, config: ClientConfig) -> Result<Self> {
        HttpClientBuilder::new(config).build_with(transport)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The cache, for manual inspection and invalidation.
    pub fn cache(&self) -> &HttpCache {
        &self.cache
    }

    /// Resolve an endpoint against the base URL with exactly one slash between them.
    pub fn build_url(&self, endpoint: &str) -> Result<String> {
        if endpoint.is_empty() {
            return Err(HttpError::validation("Endpoint cannot be empty"));
        }
        Ok(format!(
            "{}/{}",
            self.base_url,
            endpoint.trim_start_matches('/')
        ))
    }

    /// GET request. The only method that reads or writes the cache.
    pub async fn get<R: DeserializeOwned>(&self, url: &str, options: RequestOptions) -> Result<R> {
        let data = self.execute(Method::Get, url, None, options).await?;
        Ok(serde_json::from_value(data)?)
    }

    pub async fn delete<R: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<R> {
        let data = self.execute(Method::Delete, url, None, options).await?;
        Ok(serde_json::from_value(data)?)
    }

    pub async fn post<B, R>(&self, url: &str, body: &B, options: RequestOptions) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_with_body(Method::Post, url, body, options).await
    }

    pub async fn put<B, R>(&self, url: &str, body: &B, options: RequestOptions) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_with_body(Method::Put, url, body, options).await
    }

    pub async fn patch<B, R>(&self, url: &str, body: &B, options: RequestOptions) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_with_body(Method::Patch, url, body, options).await
    }

    async fn send_with_body<B, R>(
        &self,
        method: Method,
        url: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let data = self.execute(method, url, Some(body), options).await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Run one request through the cache strategy.
    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<Value> {
        let url = self.build_url(endpoint)?;
        let RequestOptions {
            params,
            headers,
            timeout,
            cancel,
            cache: cache_options,
        } = options;
        let headers = header_map(&headers)?;

        let caching = self.config.enable_cache && cache_options.enabled && method.is_cacheable();
        let plan = caching.then(|| CachePlan {
            key: cache_options.key.clone().unwrap_or_else(|| {
                self.cache.generate_key(method.as_str(), &url, params.as_ref())
            }),
            ttl: cache_options.ttl.unwrap_or(self.config.default_cache_ttl),
            strategy: cache_options.strategy,
        });

        if let Some(plan) = &plan {
            match plan.strategy {
                CacheStrategy::CacheOnly => {
                    return self
                        .cache
                        .get(&plan.key)
                        .ok_or_else(HttpError::no_cached_data);
                }
                CacheStrategy::CacheFirst => {
                    if let Some(cached) = self.cache.get(&plan.key) {
                        if cache_options.accepts(&cached) {
                            return Ok(cached);
                        }
                        self.cache.delete(&plan.key);
                    }
                }
                CacheStrategy::NetworkFirst => {}
            }
        }

        let request = TransportRequest {
            method,
            url,
            params,
            body,
            headers,
            timeout: timeout.unwrap_or(self.config.default_timeout),
        };

        match self.send(request, cancel.as_ref()).await {
            Ok(data) => {
                if let Some(plan) = &plan {
                    if !data.is_null() {
                        self.cache.set(plan.key.clone(), data.clone(), plan.ttl);
                    }
                }
                Ok(data)
            }
            Err(HttpError::Cancelled) => Err(HttpError::Cancelled),
            Err(err) => match plan {
                Some(plan) if plan.strategy == CacheStrategy::NetworkFirst => {
                    match self.cache.get(&plan.key) {
                        Some(cached) => {
                            self.sink.warn(
                                &format!(
                                    "Returning cached data after network error for {}",
                                    endpoint
                                ),
                                &json!({ "key": plan.key, "error": err.to_string() }),
                            );
                            Ok(cached)
                        }
                        None => Err(err),
                    }
                }
                _ => Err(err),
            },
        }
    }

    /// Hand a request to the transport, racing the cancellation token if any.
    async fn send(
        &self,
        request: TransportRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<Value> {
        let method = request.method;
        let url = request.url.clone();
        let started = Instant::now();

        self.sink.info(&format!("[HTTP {}] {} started", method, url), &Value::Null);

        let outcome = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    result = self.transport.send(request) => Some(result),
                }
            }
            None => Some(self.transport.send(request).await),
        };
        let duration_ms = saturating_millis(started.elapsed());

        match outcome {
            None => {
                self.sink.warn(
                    &format!("[HTTP {}] {} cancelled", method, url),
                    &json!({ "duration_ms": duration_ms }),
                );
                Err(HttpError::Cancelled)
            }
            Some(Ok(response)) => {
                self.sink.info(
                    &format!("[HTTP {}] {} success", method, url),
                    &json!({ "duration_ms": duration_ms, "status": response.status }),
                );
                Ok(response.data)
            }
            Some(Err(err)) => {
                let err = HttpError::from_transport(err);
                self.sink.error(
                    &format!("[HTTP {}] {} failed", method, url),
                    &json!({
                        "duration_ms": duration_ms,
                        "type": err.kind().as_str(),
                        "status": err.status(),
                        "message": err.to_string(),
                    }),
                );
                Err(err)
            }
        }
    }

    /// Prune expired entries every `interval` on a background task.
    ///
    /// Replaces any running prune task. Needs a tokio runtime.
    pub fn start_auto_prune(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(HttpError::validation("Auto-prune interval must be positive"));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| HttpError::config("Auto-prune requires a running tokio runtime"))?;

        self.stop_auto_prune();

        let cache = Arc::downgrade(&self.cache);
        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match cache.upgrade() {
                    Some(cache) => {
                        cache.prune();
                    }
                    None => break,
                }
            }
        });

        *self.prune_task.lock() = Some(task);
        self.sink.info(
            "[Cache AUTO-PRUNE] started",
            &json!({ "interval_ms": saturating_millis(interval) }),
        );
        Ok(())
    }

    /// Stop background pruning. Safe to call when nothing is running.
    pub fn stop_auto_prune(&self) {
        if let Some(task) = self.prune_task.lock().take() {
            task.abort();
            self.sink.info("[Cache AUTO-PRUNE] stopped", &Value::Null);
        }
    }

    pub fn is_auto_pruning(&self) -> bool {
        self.prune_task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Stop background pruning and drop every cached entry. Idempotent.
    pub fn destroy(&self) {
        self.stop_auto_prune();
        self.cache.clear();
    }
}

impl<T> Drop for HttpClient<T> {
    fn drop(&mut self) {
        if let Some(task) = self.prune_task.get_mut().take() {
            task.abort();
        }
    }
}
