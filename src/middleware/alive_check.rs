//! Load balancer aliveness check.
//!
//! Answers `GET` requests to the configured aliveness paths with a fixed
//! `200 OK` before they reach host validation, request ids or the
//! application router. A load balancer probing an internal address usually
//! sends a Host header the application would reject.
//!
//! All configuration problems are logged and degrade the check. None of
//! them stop the pipeline from being built.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{header, HeaderValue, Method, Request, Response};
use futures_util::future::{ready, Either, Ready};
use percent_encoding::percent_decode_str;
use serde_json::Value;
use tower::{Layer, Service};
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::middleware::allowed_hosts;
use crate::middleware::paths::{resolve_paths, AlivenessSetting, WatchedPaths};

/// Stage identifier used in the `middleware` setting.
pub const IDENTIFIER: &str = "lb_health_check::middleware::AliveCheck";

/// Stages the aliveness check has to run before.
pub const MUST_BE_AFTER: &[&str] = &[allowed_hosts::IDENTIFIER];

/// Body of every intercepted aliveness request.
pub const BODY: &str = "200 OK\n";

/// The slice of configuration the aliveness check reads at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct AliveCheckSettings<'a> {
    /// Raw `ALIVENESS_URL`; `None` when the key is missing.
    pub aliveness_url: Option<&'a Value>,
    /// Configured stage order; `None` when the key is missing.
    pub middleware: Option<&'a [String]>,
}

impl<'a> From<&'a AppConfig> for AliveCheckSettings<'a> {
    fn from(config: &'a AppConfig) -> Self {
        Self {
            aliveness_url: config.aliveness_url.as_ref(),
            middleware: config.middleware.as_deref(),
        }
    }
}

/// Layer that wraps services in [`AliveCheck`].
///
/// Building the layer resolves the watched paths and checks the stage
/// order, once. Every service it produces shares the same path set.
#[derive(Debug, Clone)]
pub struct AliveCheckLayer {
    paths: Arc<WatchedPaths>,
}

impl AliveCheckLayer {
    pub fn new(settings: AliveCheckSettings<'_>) -> Self {
        check_position(settings.middleware);

        let paths = resolve_paths(&AlivenessSetting::from(settings.aliveness_url));

        if paths.is_empty() {
            error!("No aliveness URLs are defined, check disabled");
        }

        for path in paths.iter() {
            info!("Intercepting GET requests to {} for aliveness check", path);
        }

        Self {
            paths: Arc::new(paths),
        }
    }

    pub fn watched_paths(&self) -> &WatchedPaths {
        &self.paths
    }
}

impl<S> Layer<S> for AliveCheckLayer {
    type Service = AliveCheck<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AliveCheck {
            inner,
            paths: Arc::clone(&self.paths),
        }
    }
}

/// Middleware that short-circuits aliveness checks.
#[derive(Debug, Clone)]
pub struct AliveCheck<S> {
    inner: S,
    paths: Arc<WatchedPaths>,
}

impl<S> AliveCheck<S> {
    /// The identifier this stage is listed under in the `middleware` setting.
    /// Same for every `S`; see [`IDENTIFIER`].
    pub const fn identifier() -> &'static str {
        IDENTIFIER
    }

    /// Wrap `inner` directly. Same diagnostics as [`AliveCheckLayer::new`].
    pub fn new(inner: S, settings: AliveCheckSettings<'_>) -> Self {
        AliveCheckLayer::new(settings).layer(inner)
    }

    pub fn watched_paths(&self) -> &WatchedPaths {
        &self.paths
    }

    /// Paths are compared after percent-decoding. A path that does not
    /// decode to UTF-8 never matches.
    fn is_aliveness_request<B>(&self, req: &Request<B>) -> bool {
        if req.method() != Method::GET {
            return false;
        }
        match percent_decode_str(req.uri().path()).decode_utf8() {
            Ok(path) => self.paths.contains(&path),
            Err(_) => false,
        }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AliveCheck<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: From<&'static str>,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Either<Ready<Result<Self::Response, Self::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        if self.is_aliveness_request(&req) {
            Either::Left(ready(Ok(alive_response())))
        } else {
            Either::Right(self.inner.call(req))
        }
    }
}

fn alive_response<B: From<&'static str>>() -> Response<B> {
    let mut response = Response::new(B::from(BODY));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain"),
    );
    response
}

/// Warn if the aliveness check is missing from, or misplaced in, the
/// configured stage order.
///
/// Only ever logs. A misplaced check may still work if the stages in front
/// of it happen to accept aliveness requests.
pub fn check_position(middleware: Option<&[String]>) {
    let middleware = middleware.unwrap_or_else(|| {
        debug!("middleware not defined in settings");
        &[][..]
    });

    let Some(my_position) = middleware.iter().position(|stage| stage == IDENTIFIER) else {
        warn!("{} not found in middleware", IDENTIFIER);
        return;
    };

    for name in MUST_BE_AFTER {
        match middleware.iter().position(|stage| stage == name) {
            Some(position) if position < my_position => warn!(
                "{} is before {} in middleware. Aliveness check may not work properly",
                name, IDENTIFIER
            ),
            Some(_) => {}
            None => debug!("{} not in middleware", name),
        }
    }
}
