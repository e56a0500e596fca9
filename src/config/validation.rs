//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, ports valid)
//! - Check that allow-listed addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: StreamerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::IpAddr;

use crate::config::schema::StreamerConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &StreamerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.http_port == 0 {
        errors.push(ValidationError::new("listener.http_port", "must be non-zero"));
    }
    if config.tls.enabled {
        if config.listener.https_port == 0 {
            errors.push(ValidationError::new("listener.https_port", "must be non-zero"));
        } else if config.listener.https_port == config.listener.http_port {
            errors.push(ValidationError::new(
                "listener.https_port",
                "must differ from listener.http_port",
            ));
        }
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be > 0"));
    }

    if config.tail.poll_interval_ms == 0 {
        errors.push(ValidationError::new("tail.poll_interval_ms", "must be > 0"));
    }
    if config.tail.channel_capacity == 0 {
        errors.push(ValidationError::new("tail.channel_capacity", "must be > 0"));
    }
    if !config.tail.extension.starts_with('.') || config.tail.extension.len() < 2 {
        errors.push(ValidationError::new(
            "tail.extension",
            format!("'{}' must start with '.'", config.tail.extension),
        ));
    }

    if config.access.jwt_secret.is_empty() {
        errors.push(ValidationError::new("access.jwt_secret", "must not be empty"));
    }
    for ip in &config.access.allowed_ips {
        if ip.parse::<IpAddr>().is_err() {
            errors.push(ValidationError::new(
                "access.allowed_ips",
                format!("'{}' is not an IP address", ip),
            ));
        }
    }

    if config.lifecycle.stop_timeout_secs == 0 {
        errors.push(ValidationError::new("lifecycle.stop_timeout_secs", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
