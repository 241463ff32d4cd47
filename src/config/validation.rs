//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts >= 1, multiplier >= 1, timeouts > 0)
//! - Check endpoint templates carry the `{username}` placeholder
//! - Check the server timeout outlasts the upstream retry loop
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use url::Url;

use crate::config::schema::AppConfig;
use crate::resilience::RetryPolicy;
use crate::upstream::transport::USERNAME_PLACEHOLDER;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem, located by its dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check every section and collect all problems.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            "must be greater than 0",
        ));
    }

    let upstream = &config.upstream;
    match Url::parse(&upstream.base_url) {
        Ok(url) if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() => {
            errors.push(ValidationError::new(
                "upstream.base_url",
                "must be an absolute http(s) URL",
            ))
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new(
            "upstream.base_url",
            format!("invalid URL: {}", e),
        )),
    }
    for (field, template) in [
        ("upstream.user_path", &upstream.user_path),
        ("upstream.repos_path", &upstream.repos_path),
    ] {
        if !template.split('/').any(|s| s == USERNAME_PLACEHOLDER) {
            errors.push(ValidationError::new(
                field,
                format!("must contain '{}' as a path segment", USERNAME_PLACEHOLDER),
            ));
        }
    }
    if upstream.user_agent.trim().is_empty() {
        errors.push(ValidationError::new(
            "upstream.user_agent",
            "must not be empty",
        ));
    }
    if upstream.connect_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "upstream.connect_timeout_ms",
            "must be greater than 0",
        ));
    }
    if upstream.request_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "upstream.request_timeout_ms",
            "must be greater than 0",
        ));
    }

    let retry = &config.retry;
    if retry.max_attempts == 0 {
        errors.push(ValidationError::new(
            "retry.max_attempts",
            "must be at least 1",
        ));
    }
    if !(retry.multiplier >= 1.0 && retry.multiplier.is_finite()) {
        errors.push(ValidationError::new(
            "retry.multiplier",
            "must be a finite number >= 1.0",
        ));
    }
    if retry.max_delay_ms < retry.base_delay_ms {
        errors.push(ValidationError::new(
            "retry.max_delay_ms",
            "must not be smaller than retry.base_delay_ms",
        ));
    }

    if config.server.request_timeout_secs > 0
        && upstream.request_timeout_ms > 0
        && retry.max_attempts > 0
    {
        let server_timeout = Duration::from_secs(config.server.request_timeout_secs);
        let worst_case = RetryPolicy::from_config(retry)
            .worst_case(Duration::from_millis(upstream.request_timeout_ms));
        if server_timeout <= worst_case {
            errors.push(ValidationError::new(
                "server.request_timeout_secs",
                format!(
                    "{}s does not outlast the upstream retry loop ({}ms worst case)",
                    config.server.request_timeout_secs,
                    worst_case.as_millis()
                ),
            ));
        }
    }

    if config.cache.user_ttl_ms == 0 {
        errors.push(ValidationError::new(
            "cache.user_ttl_ms",
            "must be greater than 0",
        ));
    }
    if config.cache.repos_ttl_ms == 0 {
        errors.push(ValidationError::new(
            "cache.repos_ttl_ms",
            "must be greater than 0",
        ));
    }

    if config.cache.max_entries == 0 {
        errors.push(ValidationError::new(
            "cache.max_entries",
            "must be at least 1",
        ));
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", observability.log_level),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
