//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → env overrides (S3_INTERNAL_CIDRS)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared with all subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the process must be restarted to change it
//! - All fields have defaults so a missing config file is not fatal
//! - CIDR tokens are NOT validated here: invalid entries are skipped at
//!   PrefixSet build time by design, partial configuration is used

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::GatewayConfig;
pub use schema::LimitsConfig;
pub use schema::ListenerConfig;
pub use schema::NetworkConfig;
pub use schema::ObservabilityConfig;
