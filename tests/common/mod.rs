//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use lb_health_check::config::AppConfig;
use lb_health_check::http::HttpServer;
use lb_health_check::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<AppConfig>,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the built-in application with `config` on 127.0.0.1:0.
pub async fn start_server(config: AppConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(async move { server.run(listener, updates_rx, server_shutdown).await });

    TestServer {
        addr,
        shutdown,
        config_updates,
        handle,
    }
}

/// A config with the standard stage order and the given aliveness setting.
pub fn config_with(aliveness_url: Option<serde_json::Value>) -> AppConfig {
    let mut config = AppConfig::default();
    config.aliveness_url = aliveness_url;
    config.allowed_hosts = vec!["127.0.0.1".to_string()];
    config.middleware = Some(vec![
        "tower_http::request_id::SetRequestIdLayer".to_string(),
        "lb_health_check::middleware::AliveCheck".to_string(),
        "lb_health_check::middleware::AllowedHosts".to_string(),
        "tower_http::timeout::TimeoutLayer".to_string(),
    ]);
    config
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
