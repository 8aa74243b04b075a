// Cache module for in-memory response caching.
// Stores GET responses with expiry timestamps behind the HTTP client.

pub mod entry;
pub mod key;
pub mod store;

pub use entry::{CacheEntry, DEFAULT_TTL};
pub(crate) use entry::saturating_millis;
pub use key::{Params, generate_key};
pub use store::HttpCache;
