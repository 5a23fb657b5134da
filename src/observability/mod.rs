//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging through `tracing`; every subsystem logs with fields
//! - Per-request spans come from the optional `TraceLayer` pipeline stage

pub mod logging;

pub use logging::init_logging;
