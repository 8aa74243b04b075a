// Cache key derivation.
// Builds deterministic keys from method, URL and query parameters.

use std::collections::BTreeMap;

use serde_json::Value;

/// Query parameters. Ordered so serialization is stable.
pub type Params = BTreeMap<String, Value>;

/// Derive the cache key for a request.
///
/// Format is `METHOD:url` or `METHOD:url:{params-json}`. Absent and empty
/// params produce the same key.
pub fn generate_key(method: &str, url: &str, params: Option<&Params>) -> String {
    match params.filter(|p| !p.is_empty()) {
        Some(params) => {
            // Serializing a map of `Value`s cannot fail.
            let params = serde_json::to_string(params).unwrap_or_default();
            format!("{}:{}:{}", method, url, params)
        }
        None => format!("{}:{}", method, url),
    }
}
