// Error types for the caching HTTP client.
// Maps transport failures to client/server/unknown kinds, plus validation and config errors.

use serde_json::Value;
use thiserror::Error;

use crate::api::transport::TransportError;

/// Message used when a cache-only lookup finds nothing.
pub const NO_CACHED_DATA: &str = "No cached data available";

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Client error ({status}): {message}")]
    Client { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request failed: {message}")]
    Unknown { status: Option<u16>, message: String },

    #[error("Request was cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of an [`HttpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Client,
    Server,
    Unknown,
    Cancelled,
    Decode,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Client => "client",
            ErrorKind::Server => "server",
            ErrorKind::Unknown => "unknown",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Decode => "decode",
            ErrorKind::Config => "config",
        }
    }
}

impl HttpError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// The error returned by a cache-only request that misses.
    pub fn no_cached_data() -> Self {
        Self::Client {
            status: 404,
            message: NO_CACHED_DATA.to_string(),
        }
    }

    /// Translate a transport failure into the error taxonomy.
    ///
    /// Failures without a status (connection loss, timeouts) become `Unknown`.
    /// The message prefers a `message` field from the response body.
    pub fn from_transport(err: TransportError) -> Self {
        let message = body_message(err.data.as_ref()).unwrap_or(err.message);

        match err.status {
            None => Self::Unknown {
                status: None,
                message,
            },
            Some(status @ 400..=499) => Self::Client { status, message },
            Some(status @ 500..=599) => Self::Server { status, message },
            Some(status) => Self::Unknown {
                status: Some(status),
                message,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            HttpError::Validation(_) => ErrorKind::Validation,
            HttpError::Client { .. } => ErrorKind::Client,
            HttpError::Server { .. } => ErrorKind::Server,
            HttpError::Unknown { .. } => ErrorKind::Unknown,
            HttpError::Cancelled => ErrorKind::Cancelled,
            HttpError::Json(_) => ErrorKind::Decode,
            HttpError::Config(_) => ErrorKind::Config,
        }
    }

    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Client { status, .. } | HttpError::Server { status, .. } => Some(*status),
            HttpError::Unknown { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, HttpError::Cancelled)
    }
}

fn body_message(data: Option<&Value>) -> Option<String> {
    match data? {
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}

pub type Result<T> = std::result::Result<T, HttpError>;
