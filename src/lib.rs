//! Load balancer aliveness check for axum/tower services.
//!
//! # Architecture Overview
//!
//! ```text
//!     Load balancer check ──┐
//!                           ▼
//!     ┌───────────────────────────────────────────────────────────┐
//!     │ pipeline (built from `middleware`, outermost first)       │
//!     │                                                           │
//!     │  ┌─────────────┐  GET watched path → 200 "200 OK\n"       │
//!     │  │ AliveCheck  │──────────────────────────────────────────┼──▶
//!     │  └──────┬──────┘                                          │
//!     │         ▼ everything else                                 │
//!     │  ┌──────────────┐   ┌─────────┐   ┌──────────────────┐    │
//!     │  │ AllowedHosts │──▶│ timeout │──▶│ application      │    │
//!     │  └──────────────┘   └─────────┘   │ router           │    │
//!     │                                   └──────────────────┘    │
//!     └───────────────────────────────────────────────────────────┘
//!
//!     Cross-cutting: config (load, validate, watch) · observability · lifecycle
//! ```
//!
//! The check can also be used on its own with any tower stack:
//!
//! ```rust,no_run
//! use axum::{routing::get, Router};
//! use lb_health_check::middleware::{AliveCheckLayer, AliveCheckSettings};
//! use serde_json::json;
//!
//! let paths = json!(["/health-check/"]);
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "hello" }))
//!     .layer(AliveCheckLayer::new(AliveCheckSettings {
//!         aliveness_url: Some(&paths),
//!         middleware: None,
//!     }));
//! ```

// Core
pub mod middleware;

// Hosting
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use middleware::{AliveCheck, AliveCheckLayer};
