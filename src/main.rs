//! lb-health-check server.
//!
//! Loads configuration, assembles the middleware pipeline around the
//! built-in application and serves it until SIGTERM or Ctrl-C.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use lb_health_check::config::{load_config, watcher::ConfigWatcher};
use lb_health_check::lifecycle::{shutdown_signal, Shutdown};
use lb_health_check::observability::init_logging;
use lb_health_check::HttpServer;

/// Answers load balancer aliveness checks ahead of the application pipeline
#[derive(Parser, Debug)]
#[command(name = "lb-health-check", version, about)]
struct Args {
    /// Path to configuration file (.toml or .json)
    #[arg(short, long, default_value = "lb-health-check.toml")]
    config: PathBuf,

    /// Log level filter (e.g., "lb_health_check=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Reload the pipeline when the configuration file changes
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args.config)?;
    init_logging(args.log_level, &config.observability);

    tracing::info!(
        path = %args.config.display(),
        bind_address = %config.listener.bind_address,
        middleware = ?config.middleware,
        "Configuration loaded"
    );

    // The watcher must stay alive for updates to keep flowing.
    let (_watcher, config_updates) = if args.watch {
        let (watcher, updates) = ConfigWatcher::new(&args.config);
        (Some(watcher.run()?), updates)
    } else {
        let (_, updates) = mpsc::unbounded_channel();
        (None, updates)
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    HttpServer::new(config).run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
