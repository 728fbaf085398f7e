//! Request utilities: bucket/object extraction and request IDs.

use axum::http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Split a path-style request path into bucket and object key.
///
/// `/b/a/c.txt` → `("b", "a/c.txt")`; `/b` → `("b", "")`; `/` → `("", "")`.
/// Extraction never fails: anything unresolvable yields an empty bucket
/// label, and metrics are still recorded under it.
pub fn extract_bucket_and_object(path: &str) -> (String, String) {
    let trimmed = path.trim_start_matches('/');
    match trimmed.split_once('/') {
        Some((bucket, object)) => (bucket.to_string(), object.to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

/// Attaches a UUID v4 `x-request-id` to every request, as early as possible
/// so it flows through tracing spans and error logs.
#[derive(Clone, Copy, Default)]
pub struct MakeGatewayRequestId;

impl MakeRequestId for MakeGatewayRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}
