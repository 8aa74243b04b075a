// Diagnostic sinks for request and cache activity.
// Records leveled messages with structured context; purely observational.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;

/// Log level for diagnostic messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Destination for request and cache diagnostics.
///
/// Implementations must not fail or block for long; the client calls them inline.
pub trait DiagnosticSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, context: &Value);

    fn info(&self, message: &str, context: &Value) {
        self.log(LogLevel::Info, message, context);
    }

    fn warn(&self, message: &str, context: &Value) {
        self.log(LogLevel::Warn, message, context);
    }

    fn error(&self, message: &str, context: &Value) {
        self.log(LogLevel::Error, message, context);
    }
}

/// Forwards diagnostics to `tracing`. The application installs the subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str, context: &Value) {
        match level {
            LogLevel::Info => tracing::info!(target: "http_cache_client", %context, "{}", message),
            LogLevel::Warn => tracing::warn!(target: "http_cache_client", %context, "{}", message),
            LogLevel::Error => {
                tracing::error!(target: "http_cache_client", %context, "{}", message)
            }
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn log(&self, _level: LogLevel, _message: &str, _context: &Value) {}
}

/// A recorded diagnostic message.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub context: Value,
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>, context: Value) -> Self {
        Self {
            level,
            message: message.into(),
            context,
            timestamp: Utc::now(),
        }
    }
}

/// Keeps every message in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Messages at the given level.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.message.clone())
            .collect()
    }

    /// Whether any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|r| r.message.contains(needle))
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn log(&self, level: LogLevel, message: &str, context: &Value) {
        self.records
            .lock()
            .push(LogRecord::new(level, message, context.clone()));
    }
}
