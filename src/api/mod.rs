// HTTP API module.
// Provides the caching client, its transport and request types.

pub mod client;
pub mod endpoints;
pub mod transport;
pub mod types;

pub use client::{HttpClient, HttpClientBuilder};
pub use transport::{
    ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse, header_map,
};
pub use types::{CacheOptions, CacheStrategy, Method, RequestOptions, Validator};
