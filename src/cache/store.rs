// In-memory cache store for HTTP responses.
// Handles TTL checking, lazy expiry on read, pattern invalidation and pruning.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use regex::Regex;
use serde_json::{Value, json};

use crate::diagnostics::{DiagnosticSink, NoopSink};
use crate::error::{HttpError, Result};

use super::entry::{CacheEntry, saturating_millis};
use super::key::{Params, generate_key};

/// Key-value store of cached responses with expiry timestamps.
///
/// Expired entries are removed lazily when read, or in bulk by [`HttpCache::prune`].
pub struct HttpCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Default for HttpCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HttpCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCache")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl HttpCache {
    /// Create an empty cache that reports nowhere.
    pub fn new() -> Self {
        Self::with_sink(Arc::new(NoopSink))
    }

    /// Create an empty cache reporting hits, misses and mutations to `sink`.
    pub fn with_sink(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            sink,
        }
    }

    /// Derive the key for a request. See [`generate_key`].
    pub fn generate_key(&self, method: &str, url: &str, params: Option<&Params>) -> String {
        generate_key(method, url, params)
    }

    /// Get a fresh entry's data. Stale entries are evicted and reported as a miss.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = Utc::now();
        let mut entries = self.entries.lock();

        let hit = match entries.get(key) {
            Some(entry) if entry.is_fresh_at(now) => Some((
                entry.data.clone(),
                json!({
                    "age_ms": saturating_millis(entry.age_at(now)),
                    "ttl_ms": saturating_millis(entry.remaining_at(now)),
                }),
            )),
            _ => None,
        };

        if hit.is_none() && entries.remove(key).is_some() {
            drop(entries);
            self.sink.info(&format!("[Cache EXPIRED] {}", key), &Value::Null);
            return None;
        }
        drop(entries);

        match hit {
            Some((data, context)) => {
                self.sink.info(&format!("[Cache HIT] {}", key), &context);
                Some(data)
            }
            None => {
                self.sink.info(&format!("[Cache MISS] {}", key), &Value::Null);
                None
            }
        }
    }

    /// Insert or overwrite an entry that stays fresh for `ttl`.
    pub fn set(&self, key: impl Into<String>, data: Value, ttl: Duration) {
        let key = key.into();
        let entry = CacheEntry::new(data, Utc::now(), ttl);

        self.entries.lock().insert(key.clone(), entry);
        self.sink.info(
            &format!("[Cache SET] {}", key),
            &json!({ "ttl_ms": saturating_millis(ttl) }),
        );
    }

    /// Remove an entry. Returns true if it existed.
    pub fn delete(&self, key: &str) -> bool {
        let deleted = self.entries.lock().remove(key).is_some();
        if deleted {
            self.sink.info(&format!("[Cache DELETE] {}", key), &Value::Null);
        }
        deleted
    }

    /// Remove every entry whose key matches `pattern`. Returns the number removed.
    pub fn invalidate(&self, pattern: &Regex) -> usize {
        let removed = {
            let mut entries = self.entries.lock();
            let before = entries.len();
            entries.retain(|key, _| !pattern.is_match(key));
            before - entries.len()
        };

        if removed > 0 {
            self.sink.info(
                &format!("[Cache INVALIDATE] {}", pattern.as_str()),
                &json!({ "count": removed }),
            );
        }
        removed
    }

    /// Compile `pattern` as a regular expression and invalidate matching keys.
    pub fn invalidate_pattern(&self, pattern: &str) -> Result<usize> {
        let regex = Regex::new(pattern)
            .map_err(|e| HttpError::validation(format!("invalid cache pattern: {}", e)))?;
        Ok(self.invalidate(&regex))
    }

    /// Remove all entries.
    pub fn clear(&self) {
        let cleared = {
            let mut entries = self.entries.lock();
            let size = entries.len();
            entries.clear();
            size
        };
        self.sink.info("[Cache CLEAR]", &json!({ "cleared": cleared }));
    }

    /// Remove every entry that is no longer fresh. Returns the number removed.
    pub fn prune(&self) -> usize {
        let now = Utc::now();
        let pruned = {
            let mut entries = self.entries.lock();
            let before = entries.len();
            entries.retain(|_, entry| entry.is_fresh_at(now));
            before - entries.len()
        };

        if pruned > 0 {
            self.sink.info("[Cache PRUNE]", &json!({ "pruned": pruned }));
        }
        pruned
    }

    /// Number of entries, including expired ones not yet pruned.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Snapshot of current keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Whether `key` is present, fresh or not. Does not trigger expiry.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }
}
