//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Inbound HTTP server settings.
    pub server: ServerConfig,

    /// Upstream API location, endpoints and timeouts.
    pub upstream: UpstreamConfig,

    /// Retry policy for rate-limited and failed upstream calls.
    pub retry: RetryConfig,

    /// Per-kind cache lifetimes.
    pub cache: CacheConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Total time allowed per inbound request, in seconds. Must exceed the
    /// worst case of the upstream retry loop.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Upstream API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the API (scheme, host, optional path prefix).
    pub base_url: String,

    /// User profile endpoint template; must contain `{username}` as a path segment.
    pub user_path: String,

    /// Repository list endpoint template; must contain `{username}` as a path segment.
    pub repos_path: String,

    /// User-Agent header sent upstream.
    pub user_agent: String,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Total time per upstream call in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            user_path: "/users/{username}".to_string(),
            repos_path: "/users/{username}/repos".to_string(),
            user_agent: "profile-aggregator".to_string(),
            connect_timeout_ms: 2_000,
            request_timeout_ms: 5_000,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per upstream call, including the first.
    pub max_attempts: u32,

    /// Delay after the first failed attempt, in milliseconds.
    pub base_delay_ms: u64,

    /// Growth factor applied per attempt.
    pub multiplier: f64,

    /// Upper bound for any single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 250,
            multiplier: 2.0,
            max_delay_ms: 3_000,
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a cached user profile, in milliseconds.
    pub user_ttl_ms: u64,

    /// Lifetime of a cached repository list, in milliseconds.
    pub repos_ttl_ms: u64,

    /// Most identifiers held per resource kind.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            user_ttl_ms: 600_000,
            repos_ttl_ms: 300_000,
            max_entries: 10_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
