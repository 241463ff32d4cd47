//! Fan-out/fan-in of the user and repo-list lookups.

use crate::profile::client::ResourceClient;
use crate::profile::types::AggregateResult;
use crate::upstream::FetchResult;

/// Combines a profile and its repositories into one result.
#[derive(Clone)]
pub struct ProfileService {
    client: ResourceClient,
}

impl ProfileService {
    pub fn new(client: ResourceClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ResourceClient {
        &self.client
    }

    /// Fetch the profile and repository list of `identifier` concurrently.
    ///
    /// Fails if either lookup fails. When both fail, the user lookup's error
    /// is reported. A branch that succeeded stays cached either way.
    pub async fn fetch_user_with_repos(&self, identifier: &str) -> FetchResult<AggregateResult> {
        let (user, repos) = tokio::join!(
            self.client.fetch_user(identifier),
            self.client.fetch_repos(identifier)
        );

        let profile = user.inspect_err(|e| {
            tracing::warn!(identifier = %identifier, branch = "user", error = %e, "Aggregate lookup failed");
        })?;
        let repos = repos.inspect_err(|e| {
            tracing::warn!(identifier = %identifier, branch = "repos", error = %e, "Aggregate lookup failed");
        })?;

        Ok(AggregateResult { profile, repos })
    }
}
