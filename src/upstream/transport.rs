//! HTTP transport to the upstream API.
//!
//! One `fetch` is exactly one GET. Retries belong to the resilience layer.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::upstream::error::UpstreamError;
use crate::upstream::types::{RawResponse, ResourceKind};

/// Placeholder substituted with the identifier in endpoint templates.
pub const USERNAME_PLACEHOLDER: &str = "{username}";

const GITHUB_API_VERSION: &str = "2022-11-28";

/// Errors raised while building the transport.
#[derive(Debug, Error)]
pub enum TransportBuildError {
    #[error("invalid upstream base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug)]
struct Endpoints {
    base_url: Url,
    user_path: String,
    repos_path: String,
}

/// Issues single GET requests against the user and repo-list endpoints.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoints: Arc<Endpoints>,
}

impl HttpTransport {
    /// Build a transport with bounded connect and request timeouts.
    pub fn new(config: &UpstreamConfig) -> Result<Self, TransportBuildError> {
        let base_url =
            Url::parse(&config.base_url).map_err(|source| TransportBuildError::InvalidBaseUrl {
                url: config.base_url.clone(),
                source,
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            endpoints: Arc::new(Endpoints {
                base_url,
                user_path: config.user_path.clone(),
                repos_path: config.repos_path.clone(),
            }),
        })
    }

    /// Resolve the endpoint URL for a resource, percent-encoding the identifier.
    pub fn endpoint(&self, kind: ResourceKind, identifier: &str) -> Result<Url, UpstreamError> {
        let template = match kind {
            ResourceKind::User => &self.endpoints.user_path,
            ResourceKind::Repos => &self.endpoints.repos_path,
        };

        let mut url = self.endpoints.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                transport_failure(kind, identifier, "base URL cannot carry a path")
            })?;
            segments.pop_if_empty();
            for segment in template.split('/').filter(|s| !s.is_empty()) {
                if segment == USERNAME_PLACEHOLDER {
                    segments.push(identifier);
                } else {
                    segments.push(segment);
                }
            }
        }
        Ok(url)
    }

    /// Perform one GET for `(kind, identifier)` and classify the outcome.
    pub async fn fetch(
        &self,
        kind: ResourceKind,
        identifier: &str,
    ) -> Result<RawResponse, UpstreamError> {
        if identifier.trim().is_empty() {
            return Err(transport_failure(
                kind,
                identifier,
                "identifier must not be blank",
            ));
        }

        let url = self.endpoint(kind, identifier)?;
        tracing::debug!(kind = %kind, identifier = %identifier, url = %url, "Upstream request");

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                let err = transport_failure(kind, identifier, &describe(&e));
                metrics::record_upstream_request(kind, err.label());
                return Err(err);
            }
        };

        let status = response.status();
        if let Err(err) = classify_status(kind, identifier, status) {
            metrics::record_upstream_request(kind, err.label());
            return Err(err);
        }

        let body = response.text().await.map_err(|e| {
            let err = transport_failure(kind, identifier, &describe(&e));
            metrics::record_upstream_request(kind, err.label());
            err
        })?;

        metrics::record_upstream_request(kind, "ok");
        Ok(RawResponse {
            kind,
            identifier: identifier.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

/// Map an HTTP status onto the upstream error taxonomy.
pub fn classify_status(
    kind: ResourceKind,
    identifier: &str,
    status: StatusCode,
) -> Result<(), UpstreamError> {
    let identifier = identifier.to_string();
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        Err(UpstreamError::RateLimited { kind, identifier })
    } else if status.is_client_error() {
        Err(UpstreamError::NotFound {
            kind,
            identifier,
            status: status.as_u16(),
        })
    } else {
        Err(UpstreamError::ServerError {
            kind,
            identifier,
            status: status.as_u16(),
        })
    }
}

fn transport_failure(kind: ResourceKind, identifier: &str, message: &str) -> UpstreamError {
    UpstreamError::TransportFailure {
        kind,
        identifier: identifier.to_string(),
        message: message.to_string(),
    }
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}
