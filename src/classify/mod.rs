//! Request classification subsystem.
//!
//! # Data Flow
//! ```text
//! config (internal_cidrs string)
//!     → prefix.rs (PrefixSet, built once at startup)
//!
//! per request:
//!     headers + peer address
//!         → client_addr.rs (best-effort client IP)
//!         → PrefixSet::contains → internal / external
//!     action name + method + conditional headers
//!         → operation.rs → Read / Write / Other
//! ```
//!
//! # Design Decisions
//! - PrefixSet is immutable after construction; concurrent reads need no locks
//! - Malformed config tokens are skipped, never fatal (availability over strictness)
//! - All classification degrades to a safe default on bad input (external, Other)

pub mod client_addr;
pub mod operation;
pub mod prefix;

pub use client_addr::client_addr;
pub use operation::{classify, is_conditional, OperationCategory};
pub use prefix::PrefixSet;
