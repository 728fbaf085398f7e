//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request};
use axum::Router;

use s3_stats_gateway::config::GatewayConfig;
use s3_stats_gateway::http::HttpServer;
use s3_stats_gateway::observability::StatsSink;

/// Records every sink call into plain maps for assertions.
#[derive(Default)]
pub struct RecordingSink {
    counters: Mutex<HashMap<String, u64>>,
    in_flight: Mutex<HashMap<String, i64>>,
}

#[allow(dead_code)]
impl RecordingSink {
    fn bump(&self, key: String, n: u64) {
        *self.counters.lock().unwrap().entry(key).or_default() += n;
    }

    pub fn counter(&self, key: &str) -> u64 {
        self.counters.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn in_flight(&self, action: &str) -> i64 {
        self.in_flight.lock().unwrap().get(action).copied().unwrap_or(0)
    }

    /// True when every in-flight gauge is back to zero.
    pub fn all_idle(&self) -> bool {
        self.in_flight.lock().unwrap().values().all(|&v| v == 0)
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
        self.bump(format!("latency/{action}/{bucket}"), 1);
    }
    fn inc_request(&self, action: &str, status: u16, bucket: &str) {
        self.bump(format!("req/{action}/{status}/{bucket}"), 1);
    }
    fn inc_read(&self, bucket: &str) {
        self.bump(format!("read/{bucket}"), 1);
    }
    fn inc_write(&self, bucket: &str) {
        self.bump(format!("write/{bucket}"), 1);
    }
    fn inc_other(&self, bucket: &str) {
        self.bump(format!("other/{bucket}"), 1);
    }
    fn observe_ttfb(&self, action: &str, bucket: &str, _elapsed: Duration) {
        self.bump(format!("ttfb/{action}/{bucket}"), 1);
    }
    fn add_bytes_received(&self, bucket: &str, n: u64) {
        self.bump(format!("recv/{bucket}"), n);
    }
    fn add_bytes_sent(&self, bucket: &str, n: u64) {
        self.bump(format!("sent/{bucket}"), n);
    }
    fn add_external_bytes_sent(&self, bucket: &str, n: u64) {
        self.bump(format!("sent_ext/{bucket}"), n);
    }
    fn record_bucket_active(&self, bucket: &str) {
        self.bump(format!("active/{bucket}"), 1);
    }
}

/// Build a gateway router with a recording sink and the given internal ranges.
#[allow(dead_code)]
pub fn gateway(internal_cidrs: &str) -> (Arc<RecordingSink>, Router) {
    let mut config = GatewayConfig::default();
    config.network.internal_cidrs = internal_cidrs.to_string();

    let sink = Arc::new(RecordingSink::default());
    let server = HttpServer::with_sink(config, sink.clone());
    (sink, server.router())
}

/// Build a request carrying a transport peer address, as the connect-info
/// service would attach it on a live socket.
#[allow(dead_code)]
pub fn request(method: Method, path: &str, body: Body, xff: Option<&str>, peer: &str) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(v) = xff {
        builder = builder.header("x-forwarded-for", v);
    }
    let mut request = builder.body(body).unwrap();
    let peer: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}
