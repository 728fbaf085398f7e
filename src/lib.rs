//! S3 Traffic-Accounting Gateway Library

pub mod classify;
pub mod config;
pub mod http;
pub mod observability;
pub mod storage;

pub use config::GatewayConfig;
pub use http::HttpServer;
