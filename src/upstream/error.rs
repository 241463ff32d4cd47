//! Upstream and fetch error definitions.

use thiserror::Error;

use crate::upstream::types::ResourceKind;

/// A single failed upstream call, tagged with what was being fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// 404, or any other 4xx except 429. Never retried.
    #[error("{kind} '{identifier}' not found upstream (HTTP {status})")]
    NotFound {
        kind: ResourceKind,
        identifier: String,
        status: u16,
    },

    /// HTTP 429.
    #[error("upstream rate limited the {kind} lookup for '{identifier}'")]
    RateLimited {
        kind: ResourceKind,
        identifier: String,
    },

    /// 5xx, or a status outside the ranges the client understands.
    #[error("upstream returned HTTP {status} for {kind} '{identifier}'")]
    ServerError {
        kind: ResourceKind,
        identifier: String,
        status: u16,
    },

    /// Connection refused, DNS failure, timeout, truncated body.
    #[error("transport failure fetching {kind} '{identifier}': {message}")]
    TransportFailure {
        kind: ResourceKind,
        identifier: String,
        message: String,
    },
}

impl UpstreamError {
    pub fn kind(&self) -> ResourceKind {
        match self {
            UpstreamError::NotFound { kind, .. }
            | UpstreamError::RateLimited { kind, .. }
            | UpstreamError::ServerError { kind, .. }
            | UpstreamError::TransportFailure { kind, .. } => *kind,
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            UpstreamError::NotFound { identifier, .. }
            | UpstreamError::RateLimited { identifier, .. }
            | UpstreamError::ServerError { identifier, .. }
            | UpstreamError::TransportFailure { identifier, .. } => identifier,
        }
    }

    /// Rate limiting and transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UpstreamError::RateLimited { .. } | UpstreamError::TransportFailure { .. }
        )
    }

    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            UpstreamError::NotFound { .. } => "not_found",
            UpstreamError::RateLimited { .. } => "rate_limited",
            UpstreamError::ServerError { .. } => "server_error",
            UpstreamError::TransportFailure { .. } => "transport_failure",
        }
    }
}

/// Error returned by every fetch operation of the core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Missing or blank identifier.
    #[error("invalid identifier: {0}")]
    Validation(String),

    /// A non-retryable upstream failure, passed through unchanged.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// A retryable failure persisted past the retry budget.
    #[error("{kind} lookup for '{identifier}' failed after {attempts} attempts")]
    Exhausted {
        kind: ResourceKind,
        identifier: String,
        attempts: u32,
        #[source]
        last: UpstreamError,
    },

    /// A 2xx body that does not match the expected record.
    #[error("failed to decode {kind} payload for '{identifier}': {message}")]
    Decode {
        kind: ResourceKind,
        identifier: String,
        message: String,
    },

    /// The load task died before producing an outcome.
    #[error("{kind} load for '{identifier}' was aborted")]
    Aborted {
        kind: ResourceKind,
        identifier: String,
    },
}

impl FetchError {
    /// The resource kind this error occurred for, if any.
    pub fn kind(&self) -> Option<ResourceKind> {
        match self {
            FetchError::Validation(_) => None,
            FetchError::Upstream(e) => Some(e.kind()),
            FetchError::Exhausted { kind, .. }
            | FetchError::Decode { kind, .. }
            | FetchError::Aborted { kind, .. } => Some(*kind),
        }
    }

    /// True when upstream reported the resource as missing (404/4xx).
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Upstream(UpstreamError::NotFound { .. }))
    }

    /// The underlying upstream failure, looking through retry exhaustion.
    pub fn upstream(&self) -> Option<&UpstreamError> {
        match self {
            FetchError::Upstream(e) => Some(e),
            FetchError::Exhausted { last, .. } => Some(last),
            _ => None,
        }
    }
}

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;
