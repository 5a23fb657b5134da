//! Pipeline assembly from the `middleware` setting.
//!
//! Stages are applied in list order, first entry outermost, around the
//! application router. Each stage is type-erased to [`Stage`] so the order
//! can come from configuration.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::Request,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    Router,
};
use tower::{util::BoxCloneSyncService, Layer, ServiceBuilder};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::middleware::{
    alive_check, allowed_hosts, allowed_hosts_middleware, AliveCheckLayer, AliveCheckSettings,
    AllowedHosts,
};

/// A type-erased pipeline stage, or the whole pipeline.
pub type Stage = BoxCloneSyncService<Request, Response, Infallible>;

pub const TRACE: &str = "tower_http::trace::TraceLayer";
pub const REQUEST_ID: &str = "tower_http::request_id::SetRequestIdLayer";
pub const TIMEOUT: &str = "tower_http::timeout::TimeoutLayer";

/// Every identifier [`Pipeline::build`] knows how to turn into a stage.
pub const KNOWN_STAGES: &[&str] = &[
    alive_check::IDENTIFIER,
    allowed_hosts::IDENTIFIER,
    TRACE,
    REQUEST_ID,
    TIMEOUT,
];

/// The assembled request pipeline.
#[derive(Clone)]
pub struct Pipeline {
    service: Stage,
}

impl Pipeline {
    /// Wrap `app` in the stages listed in `config.middleware`.
    ///
    /// A missing `middleware` setting serves `app` bare. Unknown identifiers
    /// are logged and skipped; `validate_config` rejects them earlier for
    /// configs loaded from disk.
    pub fn build(config: &AppConfig, app: Router) -> Self {
        let mut service = Stage::new(app);

        for id in config.middleware.iter().flatten().rev() {
            service = wrap(id, service, config);
        }

        Self { service }
    }

    /// A handle to the assembled service.
    pub fn service(&self) -> Stage {
        self.service.clone()
    }
}

#[allow(deprecated)]
fn wrap(id: &str, next: Stage, config: &AppConfig) -> Stage {
    match id {
        alive_check::IDENTIFIER => {
            Stage::new(AliveCheckLayer::new(AliveCheckSettings::from(config)).layer(next))
        }
        allowed_hosts::IDENTIFIER => Stage::new(
            from_fn_with_state(
                AllowedHosts::new(&config.allowed_hosts),
                allowed_hosts_middleware,
            )
            .layer(next),
        ),
        TRACE => Stage::new(
            ServiceBuilder::new()
                .map_response(IntoResponse::into_response)
                .layer(TraceLayer::new_for_http())
                .service(next),
        ),
        REQUEST_ID => Stage::new(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .service(next),
        ),
        TIMEOUT => Stage::new(
            TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)).layer(next),
        ),
        unknown => {
            tracing::warn!(stage = %unknown, "Skipping unknown middleware");
            next
        }
    }
}
