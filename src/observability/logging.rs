//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber
//! - Pick the log filter: CLI flag, then `RUST_LOG`, then config
//! - Switch between pretty and JSON output
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber.
///
/// Filter priority: `cli_filter` > `RUST_LOG` > `config.log_level`.
pub fn init_logging(cli_filter: Option<String>, config: &ObservabilityConfig) {
    let log_filter = cli_filter
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| config.log_level.clone());

    let registry = tracing_subscriber::registry().with(EnvFilter::new(&log_filter));

    if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
