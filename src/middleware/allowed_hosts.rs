//! Host header validation.
//!
//! Rejects requests whose Host does not match `allowed_hosts` with
//! `400 Bad Request`. Matching is case-insensitive and ignores the port.
//! `*` accepts any host; an entry starting with `.` accepts the domain and
//! every subdomain of it.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

/// Stage identifier used in the `middleware` setting.
pub const IDENTIFIER: &str = "lb_health_check::middleware::AllowedHosts";

/// Compiled `allowed_hosts` list. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AllowedHosts {
    patterns: Arc<[String]>,
}

impl AllowedHosts {
    pub const fn identifier() -> &'static str {
        IDENTIFIER
    }

    pub fn new(hosts: &[String]) -> Self {
        Self {
            patterns: hosts.iter().map(|h| h.to_ascii_lowercase()).collect(),
        }
    }

    /// Check a raw Host header value, port included.
    pub fn is_allowed(&self, host: &str) -> bool {
        let host = strip_port(host).to_ascii_lowercase();
        if host.is_empty() {
            return false;
        }

        self.patterns.iter().any(|pattern| match pattern.as_str() {
            "*" => true,
            p if p.starts_with('.') => host == p[1..] || host.ends_with(p),
            p => host == p,
        })
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal, keep the brackets
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }

    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Middleware function for Host header validation.
pub async fn allowed_hosts_middleware(
    State(allowed): State<AllowedHosts>,
    request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().host());

    match host {
        Some(host) if allowed.is_allowed(host) => next.run(request).await,
        _ => {
            warn!(host = ?host, path = %request.uri().path(), "Invalid Host header");
            (StatusCode::BAD_REQUEST, "Bad Request (400)").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(list: &[&str]) -> AllowedHosts {
        AllowedHosts::new(&list.iter().map(|h| h.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn test_exact_match_ignores_case_and_port() {
        let allowed = hosts(&["Example.com", "127.0.0.1"]);
        assert!(allowed.is_allowed("example.com"));
        assert!(allowed.is_allowed("EXAMPLE.COM:8080"));
        assert!(allowed.is_allowed("127.0.0.1:3000"));
        assert!(!allowed.is_allowed("10.0.0.5"));
        assert!(!allowed.is_allowed("www.example.com"));
    }

    #[test]
    fn test_subdomain_pattern() {
        let allowed = hosts(&[".example.com"]);
        assert!(allowed.is_allowed("example.com"));
        assert!(allowed.is_allowed("api.example.com"));
        assert!(!allowed.is_allowed("badexample.com"));
    }

    #[test]
    fn test_wildcard_and_empty() {
        assert!(hosts(&["*"]).is_allowed("anything.internal:81"));
        assert!(!hosts(&[]).is_allowed("localhost"));
        assert!(!hosts(&["*"]).is_allowed(""));
    }

    #[test]
    fn test_ipv6_literal() {
        let allowed = hosts(&["[::1]"]);
        assert!(allowed.is_allowed("[::1]:8080"));
        assert!(allowed.is_allowed("[::1]"));
    }
}
