// API endpoint paths.
// Typed builders for the endpoint paths the application calls.

/// Todo endpoints.
pub mod todos {
    pub fn list() -> String {
        "/todos".to_string()
    }

    pub fn by_id(id: u64) -> String {
        format!("/todos/{}", id)
    }
}

/// User endpoints.
pub mod users {
    use serde_json::json;

    use crate::cache::Params;

    /// The authenticated user.
    pub fn me() -> String {
        "/users/me".to_string()
    }

    /// User listing. Pass [`page`] as request params to paginate.
    pub fn list() -> String {
        "/users".to_string()
    }

    /// Query params selecting one page of [`list`].
    ///
    /// Pagination stays out of the path so the cache key matches a request
    /// that sets `page` with `RequestOptions::param`.
    pub fn page(page: u32) -> Params {
        Params::from([("page".to_string(), json!(page))])
    }
}
