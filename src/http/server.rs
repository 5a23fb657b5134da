//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the application router
//! - Assemble the middleware pipeline from configuration
//! - Bind server to listener and serve with graceful shutdown
//! - Rebuild and swap the pipeline when a new configuration arrives

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use arc_swap::ArcSwap;
use axum::{
    extract::Request,
    response::Response,
    routing::get,
    Router,
    ServiceExt as _,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::{util::Oneshot, Service, ServiceExt as _};

use crate::config::AppConfig;
use crate::http::pipeline::{Pipeline, Stage};

/// HTTP server hosting the application behind the configured pipeline.
pub struct HttpServer {
    app: Router,
    config: AppConfig,
    pipeline: Arc<ArcSwap<Pipeline>>,
}

impl HttpServer {
    /// Create a new HTTP server serving the built-in application.
    pub fn new(config: AppConfig) -> Self {
        Self::with_app(config, default_app())
    }

    /// Create a new HTTP server serving `app`.
    pub fn with_app(config: AppConfig, app: Router) -> Self {
        let pipeline = Pipeline::build(&config, app.clone());
        Self {
            app,
            config,
            pipeline: Arc::new(ArcSwap::from_pointee(pipeline)),
        }
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Every config received on `config_updates` rebuilds the pipeline.
    /// Requests already in flight finish on the pipeline they started on.
    /// Listener settings are only read at startup.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let reloader = {
            let pipeline = Arc::clone(&self.pipeline);
            let app = self.app.clone();
            let bind_address = self.config.listener.bind_address.clone();

            tokio::spawn(async move {
                while let Some(config) = config_updates.recv().await {
                    if config.listener.bind_address != bind_address {
                        tracing::warn!(
                            bind_address = %config.listener.bind_address,
                            "listener.bind_address changed; restart to apply"
                        );
                    }
                    pipeline.store(Arc::new(Pipeline::build(&config, app.clone())));
                    tracing::info!("Pipeline rebuilt from new configuration");
                }
            })
        };

        let service = Reloadable {
            current: Arc::clone(&self.pipeline),
        };

        axum::serve(listener, service.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the startup config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The pipeline currently serving requests.
    pub fn pipeline(&self) -> Stage {
        self.pipeline.load().service()
    }
}

/// The built-in application: `GET /` and nothing else.
pub fn default_app() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> &'static str {
    "lb-health-check\n"
}

/// Service that dispatches each request to the current pipeline.
#[derive(Clone)]
struct Reloadable {
    current: Arc<ArcSwap<Pipeline>>,
}

impl Service<Request> for Reloadable {
    type Response = Response;
    type Error = Infallible;
    type Future = Oneshot<Stage, Request>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        self.current.load().service().oneshot(req)
    }
}
