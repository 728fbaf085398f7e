//! Metrics recording sink.
//!
//! # Metrics
//! - `s3_in_flight_requests` (gauge): currently executing requests by action
//! - `s3_request_duration_seconds` (histogram): latency by action, bucket
//! - `s3_requests_total` (counter): requests by action, status, bucket
//! - `s3_read_requests_total` / `s3_write_requests_total` /
//!   `s3_other_requests_total` (counters): billing events by bucket
//! - `s3_time_to_first_byte_ms` (histogram): TTFB by action, bucket
//! - `s3_bucket_traffic_received_bytes_total` (counter): ingress by bucket
//! - `s3_bucket_traffic_sent_bytes_total` (counter): total egress by bucket
//! - `s3_bucket_external_sent_bytes_total` (counter): billable egress to
//!   clients outside the configured internal ranges
//! - `s3_bucket_last_active_seconds` (gauge): unix time of last activity,
//!   used for bucket keep-alive tracking

use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Write-only recording sink for request accounting.
///
/// All implementations must be concurrency-safe: every method may be called
/// from arbitrarily many request tasks at once.
pub trait StatsSink: Send + Sync {
    fn inc_in_flight(&self, action: &str);
    fn dec_in_flight(&self, action: &str);
    fn observe_latency(&self, action: &str, bucket: &str, elapsed: Duration);
    fn inc_request(&self, action: &str, status: u16, bucket: &str);
    fn inc_read(&self, bucket: &str);
    fn inc_write(&self, bucket: &str);
    fn inc_other(&self, bucket: &str);
    fn observe_ttfb(&self, action: &str, bucket: &str, elapsed: Duration);
    fn add_bytes_received(&self, bucket: &str, n: u64);
    fn add_bytes_sent(&self, bucket: &str, n: u64);
    fn add_external_bytes_sent(&self, bucket: &str, n: u64);
    fn record_bucket_active(&self, bucket: &str);
}

/// Production sink recording through the `metrics` facade, exported by the
/// Prometheus scrape endpoint installed in [`init_exporter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PromSink;

impl StatsSink for PromSink {
    fn inc_in_flight(&self, action: &str) {
        gauge!("s3_in_flight_requests", "action" => action.to_string()).increment(1.0);
    }

    fn dec_in_flight(&self, action: &str) {
        gauge!("s3_in_flight_requests", "action" => action.to_string()).decrement(1.0);
    }

    fn observe_latency(&self, action: &str, bucket: &str, elapsed: Duration) {
        histogram!(
            "s3_request_duration_seconds",
            "action" => action.to_string(),
            "bucket" => bucket.to_string()
        )
        .record(elapsed.as_secs_f64());
    }

    fn inc_request(&self, action: &str, status: u16, bucket: &str) {
        counter!(
            "s3_requests_total",
            "action" => action.to_string(),
            "status" => status.to_string(),
            "bucket" => bucket.to_string()
        )
        .increment(1);
    }

    fn inc_read(&self, bucket: &str) {
        counter!("s3_read_requests_total", "bucket" => bucket.to_string()).increment(1);
    }

    fn inc_write(&self, bucket: &str) {
        counter!("s3_write_requests_total", "bucket" => bucket.to_string()).increment(1);
    }

    fn inc_other(&self, bucket: &str) {
        counter!("s3_other_requests_total", "bucket" => bucket.to_string()).increment(1);
    }

    fn observe_ttfb(&self, action: &str, bucket: &str, elapsed: Duration) {
        histogram!(
            "s3_time_to_first_byte_ms",
            "action" => action.to_string(),
            "bucket" => bucket.to_string()
        )
        .record(elapsed.as_secs_f64() * 1000.0);
    }

    fn add_bytes_received(&self, bucket: &str, n: u64) {
        counter!("s3_bucket_traffic_received_bytes_total", "bucket" => bucket.to_string())
            .increment(n);
    }

    fn add_bytes_sent(&self, bucket: &str, n: u64) {
        counter!("s3_bucket_traffic_sent_bytes_total", "bucket" => bucket.to_string())
            .increment(n);
    }

    fn add_external_bytes_sent(&self, bucket: &str, n: u64) {
        counter!("s3_bucket_external_sent_bytes_total", "bucket" => bucket.to_string())
            .increment(n);
    }

    fn record_bucket_active(&self, bucket: &str) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        gauge!("s3_bucket_last_active_seconds", "bucket" => bucket.to_string()).set(now);
    }
}

/// Install the Prometheus recorder and start the scrape endpoint.
///
/// Failure to install is logged and otherwise ignored: metrics export is an
/// observability concern and must not prevent the gateway from serving.
pub fn init_exporter(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_metrics();
            tracing::info!(address = %addr, "Prometheus exporter listening");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Prometheus exporter");
        }
    }
}

fn describe_metrics() {
    describe_gauge!(
        "s3_in_flight_requests",
        "Number of currently executing S3 requests, by action"
    );
    describe_histogram!(
        "s3_request_duration_seconds",
        Unit::Seconds,
        "S3 request latency, by action and bucket"
    );
    describe_counter!(
        "s3_requests_total",
        "Total S3 requests, by action, status and bucket"
    );
    describe_counter!(
        "s3_read_requests_total",
        "Billable read operations, by bucket"
    );
    describe_counter!(
        "s3_write_requests_total",
        "Billable write operations, by bucket"
    );
    describe_counter!(
        "s3_other_requests_total",
        "Requests that classified as neither read nor write, by bucket"
    );
    describe_histogram!(
        "s3_time_to_first_byte_ms",
        Unit::Milliseconds,
        "Time to first response byte, by action and bucket"
    );
    describe_counter!(
        "s3_bucket_traffic_received_bytes_total",
        Unit::Bytes,
        "Bytes received from clients, by bucket"
    );
    describe_counter!(
        "s3_bucket_traffic_sent_bytes_total",
        Unit::Bytes,
        "Bytes sent to clients, by bucket"
    );
    describe_counter!(
        "s3_bucket_external_sent_bytes_total",
        Unit::Bytes,
        "Bytes sent to clients outside the internal network ranges, by bucket"
    );
    describe_gauge!(
        "s3_bucket_last_active_seconds",
        "Unix timestamp of the last request touching each bucket"
    );
}
