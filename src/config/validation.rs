//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Enforce loopback-only listening
//! - Validate value ranges (timeouts and body limit > 0)
//!
//! Returns all validation errors, not just the first.

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("listener.bind_address `{0}` is not a loopback address")]
    NonLoopbackBind(String),

    #[error("upstream.default_host must not be empty")]
    EmptyDefaultHost,

    #[error("upstream.scheme `{0}` must be \"http\" or \"https\"")]
    UnsupportedScheme(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("redaction.secret_markers must contain at least one non-empty marker")]
    NoSecretMarkers,

    #[error("observability.metrics_address `{0}` is not a valid socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.listener.bind_address.parse::<SocketAddr>() {
        Ok(addr) if !addr.ip().is_loopback() => {
            errors.push(ValidationError::NonLoopbackBind(
                config.listener.bind_address.clone(),
            ));
        }
        Ok(_) => {}
        Err(_) => errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        )),
    }

    let upstream = &config.upstream;
    if upstream.default_host.trim().is_empty() {
        errors.push(ValidationError::EmptyDefaultHost);
    }
    if upstream.scheme != "http" && upstream.scheme != "https" {
        errors.push(ValidationError::UnsupportedScheme(upstream.scheme.clone()));
    }
    if upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("upstream.timeout_secs"));
    }
    if upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("upstream.connect_timeout_secs"));
    }

    let redaction = &config.redaction;
    if !redaction.secret_markers.iter().any(|m| !m.is_empty()) {
        errors.push(ValidationError::NoSecretMarkers);
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroValue("limits.max_body_bytes"));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
