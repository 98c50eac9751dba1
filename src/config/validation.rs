//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DialerConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::{CheckKind, DialerConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one upstream is required")]
    NoUpstreams,

    #[error("upstream address is empty")]
    EmptyUpstream,

    #[error("duplicate upstream: {0}")]
    DuplicateUpstream(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("health check path must start with '/': {0}")]
    InvalidPath(String),
}

pub fn validate_config(config: &DialerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstreams.is_empty() {
        errors.push(ValidationError::NoUpstreams);
    }
    for (i, upstream) in config.upstreams.iter().enumerate() {
        if upstream.trim().is_empty() {
            errors.push(ValidationError::EmptyUpstream);
        } else if config.upstreams[..i].contains(upstream) {
            errors.push(ValidationError::DuplicateUpstream(upstream.clone()));
        }
    }

    if config.eject_timeout_secs == 0 {
        errors.push(ValidationError::Zero("eject_timeout_secs"));
    }

    let health = &config.health_check;
    if health.kind != CheckKind::None {
        if health.interval_secs == 0 {
            errors.push(ValidationError::Zero("health_check.interval_secs"));
        }
        if health.timeout_secs == 0 {
            errors.push(ValidationError::Zero("health_check.timeout_secs"));
        }
        if health.threshold == 0 {
            errors.push(ValidationError::Zero("health_check.threshold"));
        }
    }
    if health.kind == CheckKind::Http && !health.path.starts_with('/') {
        errors.push(ValidationError::InvalidPath(health.path.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
