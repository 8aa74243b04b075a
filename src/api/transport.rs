// Network transport used by the HTTP client.
// Defines the request executor seam and its reqwest-backed implementation.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, Response,
    header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, USER_AGENT},
};
use serde_json::Value;

use crate::cache::Params;
use crate::error::{HttpError, Result};

use super::types::Method;

const CLIENT_USER_AGENT: &str = concat!("http-cache-client/", env!("CARGO_PKG_VERSION"));

/// A fully-resolved request handed to the transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub params: Option<Params>,
    pub body: Option<Value>,
    /// Per-request headers, already checked by [`header_map`].
    pub headers: HeaderMap,
    pub timeout: Duration,
}

/// A successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub data: Value,
}

/// A transport-level failure. `status` is absent when no response arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportError {
    pub status: Option<u16>,
    pub data: Option<Value>,
    pub message: String,
}

impl TransportError {
    /// A failure with no response (connection loss, timeout).
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            data: None,
            message: message.into(),
        }
    }

    /// A failure carrying a response status and body.
    pub fn with_status(status: u16, data: Value) -> Self {
        Self {
            status: Some(status),
            data: Some(data),
            message: format!("Request failed with status code {}", status),
        }
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

/// Executes requests over the network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// Transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with JSON accept and user-agent default headers.
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| HttpError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an already-configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Check response status and read the body.
    async fn check_response(
        response: Response,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::network(e.to_string()))?;
        let data = parse_body(&text);

        if status.is_success() {
            Ok(TransportResponse {
                status: status.as_u16(),
                data,
            })
        } else {
            Err(TransportError::with_status(status.as_u16(), data))
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .headers(request.headers)
            .timeout(request.timeout);

        if let Some(params) = &request.params {
            builder = builder.query(&query_pairs(params));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::network(format!(
                    "timeout of {}ms exceeded",
                    request.timeout.as_millis()
                ))
            } else {
                TransportError::network(e.to_string())
            }
        })?;

        Self::check_response(response).await
    }
}

/// Convert caller-supplied headers, rejecting names or values HTTP cannot carry.
pub fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            HttpError::validation(format!("invalid header name {:?}: {}", name, e))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            HttpError::validation(format!("invalid value for header {:?}: {}", name, e))
        })?;
        map.insert(header, value);
    }
    Ok(map)
}

/// Flatten params into query pairs. Strings are sent bare, other values as JSON.
fn query_pairs(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.clone(), value)
        })
        .collect()
}

/// Empty bodies are null; non-JSON bodies are kept as text.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
