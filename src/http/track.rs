//! Instrumentation decorator for request handlers.
//!
//! `track` wraps a handler so that latency, status, in-flight concurrency
//! and read/write billing counters are recorded on every invocation without
//! altering the handler's behavior. It runs on every request of the gateway,
//! so the bookkeeping here must stay cheap and lock-free.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::classify::{classify, is_conditional, OperationCategory};
use crate::http::request::extract_bucket_and_object;
use crate::observability::StatsSink;

/// A boxed request handler, the unit the decorator composes over.
pub type GatewayHandler =
    Arc<dyn Fn(Request<Body>) -> BoxFuture<'static, Response> + Send + Sync>;

/// Decrements the in-flight gauge when dropped, so the count is restored on
/// every exit path including panic unwinds.
struct InFlightGuard {
    stats: Arc<dyn StatsSink>,
    action: &'static str,
}

impl InFlightGuard {
    fn new(stats: Arc<dyn StatsSink>, action: &'static str) -> Self {
        stats.inc_in_flight(action);
        Self { stats, action }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.stats.dec_in_flight(self.action);
    }
}

/// Wrap `inner` with request accounting for the given action name.
///
/// Per invocation the returned handler:
/// 1. holds the in-flight gauge up for the duration of the call,
/// 2. delegates to `inner` synchronously and observes the returned status,
/// 3. redacts the bucket label when the status is 403 Forbidden, so auth
///    failures are counted without leaking bucket identity,
/// 4. records the bucket as active, then latency and a status-coded request
///    count, all under the possibly-redacted label,
/// 5. records exactly one read/write/other billing increment; a conditional
///    write additionally bills one read (a conditional write must first read
///    resource state, and is double-counted by design).
pub fn track(
    stats: Arc<dyn StatsSink>,
    action: &'static str,
    inner: GatewayHandler,
) -> GatewayHandler {
    Arc::new(move |req: Request<Body>| {
        let stats = Arc::clone(&stats);
        let inner = Arc::clone(&inner);
        async move {
            let _in_flight = InFlightGuard::new(Arc::clone(&stats), action);

            let (bucket, _object) = extract_bucket_and_object(req.uri().path());

            // Captured before the request moves into the handler.
            let conditional = is_conditional(req.headers());
            let method = req.method().clone();

            let start = Instant::now();
            let response = inner(req).await;
            let status = response.status();

            let bucket = if status == StatusCode::FORBIDDEN {
                ""
            } else {
                bucket.as_str()
            };

            stats.record_bucket_active(bucket);
            stats.observe_latency(action, bucket, start.elapsed());
            stats.inc_request(action, status.as_u16(), bucket);

            match classify(action, &method) {
                OperationCategory::Read => stats.inc_read(bucket),
                OperationCategory::Write => {
                    stats.inc_write(bucket);
                    if conditional {
                        stats.inc_read(bucket);
                    }
                }
                OperationCategory::Other => stats.inc_other(bucket),
            }

            response
        }
        .boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use futures_util::FutureExt;
    use std::collections::HashMap;
    use std::panic::AssertUnwindSafe;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every sink call into plain maps for assertions.
    #[derive(Default)]
    struct RecordingSink {
        counters: Mutex<HashMap<String, u64>>,
        in_flight: Mutex<HashMap<String, i64>>,
        latencies: Mutex<Vec<(String, String)>>,
    }

    impl RecordingSink {
        fn bump(&self, key: String) {
            *self.counters.lock().unwrap().entry(key).or_default() += 1;
        }

        fn counter(&self, key: &str) -> u64 {
            self.counters.lock().unwrap().get(key).copied().unwrap_or(0)
        }

        fn in_flight(&self, action: &str) -> i64 {
            self.in_flight.lock().unwrap().get(action).copied().unwrap_or(0)
        }
    }

    impl StatsSink for RecordingSink {
        fn inc_in_flight(&self, action: &str) {
            *self.in_flight.lock().unwrap().entry(action.into()).or_default() += 1;
        }
        fn dec_in_flight(&self, action: &str) {
            *self.in_flight.lock().unwrap().entry(action.into()).or_default() -= 1;
        }
        fn observe_latency(&self, action: &str, bucket: &str, _elapsed: Duration) {
            self.latencies.lock().unwrap().push((action.into(), bucket.into()));
        }
        fn inc_request(&self, action: &str, status: u16, bucket: &str) {
            self.bump(format!("req/{action}/{status}/{bucket}"));
        }
        fn inc_read(&self, bucket: &str) {
            self.bump(format!("read/{bucket}"));
        }
        fn inc_write(&self, bucket: &str) {
            self.bump(format!("write/{bucket}"));
        }
        fn inc_other(&self, bucket: &str) {
            self.bump(format!("other/{bucket}"));
        }
        fn observe_ttfb(&self, _action: &str, _bucket: &str, _elapsed: Duration) {}
        fn add_bytes_received(&self, _bucket: &str, _n: u64) {}
        fn add_bytes_sent(&self, _bucket: &str, _n: u64) {}
        fn add_external_bytes_sent(&self, _bucket: &str, _n: u64) {}
        fn record_bucket_active(&self, bucket: &str) {
            self.bump(format!("active/{bucket}"));
        }
    }

    fn fixed_status(status: StatusCode) -> GatewayHandler {
        Arc::new(move |_req| async move { status.into_response() }.boxed())
    }

    fn request(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_read_request_counted_once() {
        let sink = Arc::new(RecordingSink::default());
        let handler = track(sink.clone(), "GetObject", fixed_status(StatusCode::OK));

        let _ = handler(request("/b/k")).await;

        assert_eq!(sink.counter("read/b"), 1);
        assert_eq!(sink.counter("write/b"), 0);
        assert_eq!(sink.counter("req/GetObject/200/b"), 1);
        assert_eq!(sink.counter("active/b"), 1);
        assert_eq!(sink.in_flight("GetObject"), 0);
        assert_eq!(sink.latencies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_conditional_write_also_bills_read() {
        let sink = Arc::new(RecordingSink::default());
        let handler = track(sink.clone(), "PutObject", fixed_status(StatusCode::OK));

        let req = Request::builder()
            .method("PUT")
            .uri("/b/k")
            .header("if-match", "\"etag\"")
            .body(Body::empty())
            .unwrap();
        let _ = handler(req).await;

        assert_eq!(sink.counter("write/b"), 1);
        assert_eq!(sink.counter("read/b"), 1);
    }

    #[tokio::test]
    async fn test_unconditional_write_bills_no_read() {
        let sink = Arc::new(RecordingSink::default());
        let handler = track(sink.clone(), "PutObject", fixed_status(StatusCode::OK));

        let _ = handler(request("/b/k")).await;

        assert_eq!(sink.counter("write/b"), 1);
        assert_eq!(sink.counter("read/b"), 0);
    }

    #[tokio::test]
    async fn test_forbidden_redacts_bucket_label() {
        let sink = Arc::new(RecordingSink::default());
        let handler = track(sink.clone(), "GetObject", fixed_status(StatusCode::FORBIDDEN));

        let _ = handler(request("/secret-bucket/k")).await;

        // The event is still counted, but under an empty bucket label.
        assert_eq!(sink.counter("req/GetObject/403/"), 1);
        assert_eq!(sink.counter("req/GetObject/403/secret-bucket"), 0);
        assert_eq!(sink.counter("read/"), 1);
        assert_eq!(sink.counter("read/secret-bucket"), 0);
        assert_eq!(sink.counter("active/"), 1);
        assert_eq!(sink.counter("active/secret-bucket"), 0);
        assert_eq!(
            sink.latencies.lock().unwrap()[0],
            ("GetObject".to_string(), "".to_string())
        );
    }

    #[tokio::test]
    async fn test_unclassified_action_counts_other() {
        let sink = Arc::new(RecordingSink::default());
        let handler = track(sink.clone(), "Unknown", fixed_status(StatusCode::OK));

        let req = Request::builder()
            .method("PATCH")
            .uri("/b/k")
            .body(Body::empty())
            .unwrap();
        let _ = handler(req).await;

        assert_eq!(sink.counter("other/b"), 1);
        assert_eq!(sink.counter("read/b"), 0);
        assert_eq!(sink.counter("write/b"), 0);
    }

    #[tokio::test]
    async fn test_response_passes_through_unaltered() {
        let sink = Arc::new(RecordingSink::default());
        let inner: GatewayHandler =
            Arc::new(|_req| async { (StatusCode::CREATED, "payload").into_response() }.boxed());
        let handler = track(sink, "PutObject", inner);

        let response = handler(request("/b/k")).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"payload");
    }

    #[tokio::test]
    async fn test_in_flight_restored_after_panic() {
        let sink = Arc::new(RecordingSink::default());
        let inner: GatewayHandler =
            Arc::new(|_req| async { panic!("handler blew up") }.boxed());
        let handler = track(sink.clone(), "GetObject", inner);

        let result = AssertUnwindSafe(handler(request("/b/k"))).catch_unwind().await;
        assert!(result.is_err());
        assert_eq!(sink.in_flight("GetObject"), 0);
    }
}
