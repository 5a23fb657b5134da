//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum serve, graceful shutdown)
//!     → current pipeline (swapped atomically on reload)
//!     → pipeline.rs stages, in `middleware` order
//!     → application router
//! ```

pub mod pipeline;
pub mod server;

pub use pipeline::{Pipeline, Stage};
pub use server::{default_app, HttpServer};
