//! Per-bucket traffic accounting, called from inside handler bodies.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwapOption;
use axum::http::request::Parts;

use crate::classify::client_addr::{client_addr, peer_addr};
use crate::classify::PrefixSet;
use crate::http::request::extract_bucket_and_object;
use crate::observability::StatsSink;

/// Records byte counts and first-byte latency for object traffic, splitting
/// egress into internal and external using the configured prefix set.
///
/// The prefix set is held behind an atomically-swappable snapshot: readers
/// never lock, and a future reload path can replace the set wholesale.
pub struct TrafficRecorder {
    stats: Arc<dyn StatsSink>,
    internal: Arc<ArcSwapOption<PrefixSet>>,
}

impl TrafficRecorder {
    pub fn new(stats: Arc<dyn StatsSink>, internal: Arc<ArcSwapOption<PrefixSet>>) -> Self {
        Self { stats, internal }
    }

    /// True iff the address is covered by a configured internal range.
    /// Absent configuration or an unresolvable address is external.
    pub fn is_internal(&self, addr: Option<IpAddr>) -> bool {
        let set = self.internal.load();
        match (set.as_ref(), addr) {
            (Some(set), Some(ip)) => set.contains(ip),
            _ => false,
        }
    }

    /// Record elapsed time from `start` until now as time-to-first-byte.
    pub fn time_to_first_byte(&self, action: &str, start: Instant, parts: &Parts) {
        let (bucket, _) = extract_bucket_and_object(parts.uri.path());
        self.stats.observe_ttfb(action, &bucket, start.elapsed());
        self.stats.record_bucket_active(&bucket);
    }

    /// Add `n` to the bucket's received-bytes counter.
    pub fn bytes_received(&self, n: u64, parts: &Parts) {
        let (bucket, _) = extract_bucket_and_object(parts.uri.path());
        self.stats.record_bucket_active(&bucket);
        self.stats.add_bytes_received(&bucket, n);
    }

    /// Add `n` to the bucket's total sent-bytes counter and, when the client
    /// resolves outside the internal ranges, to the external counter as well
    /// so billing can charge externally-routed egress only.
    pub fn bytes_sent(&self, n: u64, parts: &Parts) {
        let (bucket, _) = extract_bucket_and_object(parts.uri.path());
        self.stats.record_bucket_active(&bucket);

        let client = client_addr(&parts.headers, peer_addr(&parts.extensions));
        if !self.is_internal(client) {
            self.stats.add_external_bytes_sent(&bucket, n);
        }
        self.stats.add_bytes_sent(&bucket, n);
    }
}
