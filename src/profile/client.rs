//! Resource client: binds each resource kind to its cache, retry and transport.

use std::time::Duration;

use crate::cache::ResourceCache;
use crate::config::AppConfig;
use crate::resilience::RetryPolicy;
use crate::upstream::transport::TransportBuildError;
use crate::upstream::{FetchError, FetchResult, HttpTransport, ResourceKind};

use super::types::{RepoSummary, UserProfile};

/// Cached, retrying access to the user and repo-list resources.
///
/// Cheap to clone; clones share caches and the HTTP connection pool.
#[derive(Clone)]
pub struct ResourceClient {
    transport: HttpTransport,
    retry: RetryPolicy,
    users: ResourceCache<UserProfile>,
    repos: ResourceCache<Vec<RepoSummary>>,
}

impl ResourceClient {
    pub fn new(
        transport: HttpTransport,
        retry: RetryPolicy,
        user_ttl: Duration,
        repos_ttl: Duration,
    ) -> Self {
        Self {
            transport,
            retry,
            users: ResourceCache::new(ResourceKind::User, user_ttl),
            repos: ResourceCache::new(ResourceKind::Repos, repos_ttl),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, TransportBuildError> {
        Ok(Self::new(
            HttpTransport::new(&config.upstream)?,
            RetryPolicy::from_config(&config.retry),
            Duration::from_millis(config.cache.user_ttl_ms),
            Duration::from_millis(config.cache.repos_ttl_ms),
        )
        .with_max_entries(config.cache.max_entries))
    }

    /// Bound both caches to `max_entries` identifiers each.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.users = self.users.with_max_entries(max_entries);
        self.repos = self.repos.with_max_entries(max_entries);
        self
    }

    /// Fetch the profile for `identifier`, from cache when live.
    pub async fn fetch_user(&self, identifier: &str) -> FetchResult<UserProfile> {
        require_identifier(identifier)?;
        let transport = self.transport.clone();
        let retry = self.retry.clone();
        let id = identifier.to_string();

        self.users
            .get_or_load(identifier, move || async move {
                let raw = retry
                    .execute(|| transport.fetch(ResourceKind::User, &id))
                    .await?;
                raw.decode()
            })
            .await
    }

    /// Fetch the repository list for `identifier`, from cache when live.
    pub async fn fetch_repos(&self, identifier: &str) -> FetchResult<Vec<RepoSummary>> {
        require_identifier(identifier)?;
        let transport = self.transport.clone();
        let retry = self.retry.clone();
        let id = identifier.to_string();

        self.repos
            .get_or_load(identifier, move || async move {
                let raw = retry
                    .execute(|| transport.fetch(ResourceKind::Repos, &id))
                    .await?;
                raw.decode()
            })
            .await
    }

    pub fn user_cache(&self) -> &ResourceCache<UserProfile> {
        &self.users
    }

    pub fn repos_cache(&self) -> &ResourceCache<Vec<RepoSummary>> {
        &self.repos
    }
}

fn require_identifier(identifier: &str) -> FetchResult<()> {
    if identifier.trim().is_empty() {
        return Err(FetchError::Validation(
            "identifier must not be blank".to_string(),
        ));
    }
    Ok(())
}
