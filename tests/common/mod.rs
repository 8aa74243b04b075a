// Shared test helpers.
// A scripted in-memory transport that counts calls and replays queued results.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use http_cache_client::{
    ClientConfig, HttpClient, MemorySink, Transport, TransportError, TransportRequest,
    TransportResponse,
};

pub const BASE_URL: &str = "https://api.example.com";

type Outcome = Result<TransportResponse, TransportError>;

/// Replays queued outcomes in order, then repeats the fallback.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    queue: Mutex<VecDeque<Outcome>>,
    fallback: Mutex<Option<Outcome>>,
    requests: Mutex<Vec<TransportRequest>>,
    calls: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request with `data`.
    pub fn always(data: Value) -> Self {
        let transport = Self::new();
        *transport.inner.fallback.lock() = Some(Ok(ok(data)));
        transport
    }

    pub fn then_ok(self, data: Value) -> Self {
        self.inner.queue.lock().push_back(Ok(ok(data)));
        self
    }

    pub fn then_err(self, err: TransportError) -> Self {
        self.inner.queue.lock().push_back(Err(err));
        self
    }

    /// Sleep before answering, so requests can be cancelled mid-flight.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.inner.delay.lock() = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.inner.requests.lock().clone()
    }
}

fn ok(data: Value) -> TransportResponse {
    TransportResponse { status: 200, data }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Outcome {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.requests.lock().push(request);

        let delay = *self.inner.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.inner.queue.lock().pop_front();
        match next {
            Some(outcome) => outcome,
            None => self
                .inner
                .fallback
                .lock()
                .clone()
                .unwrap_or_else(|| Err(TransportError::network("no scripted response"))),
        }
    }
}

/// Client with caching enabled and a one second default TTL.
pub fn cached_client(transport: &ScriptedTransport) -> HttpClient<ScriptedTransport> {
    let config = ClientConfig::new(BASE_URL).default_cache_ttl(Duration::from_secs(1));
    HttpClient::with_transport(transport.clone(), config).expect("client should build")
}

/// Client with caching switched off globally.
pub fn uncached_client(transport: &ScriptedTransport) -> HttpClient<ScriptedTransport> {
    let config = ClientConfig::new(BASE_URL).enable_cache(false);
    HttpClient::with_transport(transport.clone(), config).expect("client should build")
}

pub fn client_with_sink(
    transport: &ScriptedTransport,
    sink: Arc<MemorySink>,
) -> HttpClient<ScriptedTransport> {
    let config = ClientConfig::new(BASE_URL).default_cache_ttl(Duration::from_secs(1));
    HttpClient::builder(config)
        .sink(sink)
        .build_with(transport.clone())
        .expect("client should build")
}

/// Install a test subscriber once so `TracingSink` output shows up with `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
