//! Request-processing stages.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → alive_check.rs (GET to a watched path? answer 200 OK and stop)
//!     → allowed_hosts.rs (reject unknown Host headers)
//!     → application router
//! ```
//!
//! # Design Decisions
//! - The aliveness check must sit in front of host validation; it warns
//!   at startup when it does not
//! - Configuration problems in the aliveness check never fail startup
//! - Watched paths are resolved once and shared read-only between clones

pub mod alive_check;
pub mod allowed_hosts;
pub mod paths;

pub use alive_check::{check_position, AliveCheck, AliveCheckLayer, AliveCheckSettings};
pub use allowed_hosts::{allowed_hosts_middleware, AllowedHosts};
pub use paths::{resolve_paths, AlivenessSetting, WatchedPaths};
