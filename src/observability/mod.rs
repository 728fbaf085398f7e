//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! decorator + traffic recorders produce:
//!     → metrics.rs (StatsSink: counters, gauges, histograms)
//!     → tracing events (structured log records)
//!
//! Consumers:
//!     → Prometheus scrape endpoint (metrics exporter)
//!     → Log aggregation (stdout)
//! ```
//!
//! # Design Decisions
//! - Metric updates are cheap (atomic increments through the `metrics` facade)
//! - The sink is a trait so tests can observe recordings without a registry
//! - This layer is write-only toward the sink; it never reads metrics back

pub mod logging;
pub mod metrics;

pub use metrics::{PromSink, StatsSink};
