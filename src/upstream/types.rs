//! Resource kinds and raw upstream payloads.

use std::fmt;

use serde::de::DeserializeOwned;

use crate::upstream::error::{FetchError, FetchResult};

/// The two resource shapes served by the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A single user profile (`/users/{username}`).
    User,
    /// The repository list of a user (`/users/{username}/repos`).
    Repos,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Repos => "repos",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful (2xx) upstream response, body not yet decoded.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub kind: ResourceKind,
    pub identifier: String,
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    /// Decode the JSON body into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> FetchResult<T> {
        serde_json::from_str(&self.body).map_err(|e| FetchError::Decode {
            kind: self.kind,
            identifier: self.identifier.clone(),
            message: e.to_string(),
        })
    }
}
