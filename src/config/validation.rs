//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every `middleware` entry names a stage the pipeline can build
//! - Validate value ranges (timeouts > 0, bind address parses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - The aliveness setting is never validated here; the aliveness check
//!   degrades on its own and must not stop the server from starting

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;
use crate::http::pipeline::KNOWN_STAGES;

/// A single semantic problem in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("unknown middleware `{0}`")]
    UnknownStage(String),

    #[error("middleware `{0}` is listed more than once")]
    DuplicateStage(String),
}

/// Check an `AppConfig` for semantic errors.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    let mut seen = HashSet::new();
    for stage in config.middleware.iter().flatten() {
        if !KNOWN_STAGES.contains(&stage.as_str()) {
            errors.push(ValidationError::UnknownStage(stage.clone()));
        }
        if !seen.insert(stage.as_str()) {
            errors.push(ValidationError::DuplicateStage(stage.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
