//! HTTP layer: S3 route dispatch and request accounting.
//!
//! # Data Flow
//! ```text
//! request
//!     → server.rs (dispatch: method + path shape → action name)
//!     → track.rs (in-flight gauge, latency, status, billing counters)
//!     → handlers.rs (object operations over storage/)
//!         → traffic.rs (TTFB, bytes received/sent, internal/external split)
//! ```
//!
//! # Design Decisions
//! - Action names are fixed at registration time, one tracked handler each
//! - The accounting wrapper is purely observational: it never alters status,
//!   body, or error propagation of the inner handler

pub mod handlers;
pub mod request;
pub mod server;
pub mod track;
pub mod traffic;

pub use server::HttpServer;
pub use track::{track, GatewayHandler};
pub use traffic::TrafficRecorder;
