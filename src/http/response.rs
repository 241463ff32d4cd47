//! Response bodies and error mapping.
//!
//! # Responsibilities
//! - Shape the aggregate into the public JSON document
//! - Map fetch errors to status codes with a uniform error body
//!
//! # Design Decisions
//! - Upstream failure details stay in the logs; clients get a fixed message
//! - Not found upstream maps to 404, every other upstream failure to 502

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::profile::{AggregateResult, RepoSummary};
use crate::upstream::FetchError;

pub const USER_NOT_FOUND: &str = "User not found";
pub const UPSTREAM_FAILURE: &str = "Upstream service error";
pub const BAD_PATH: &str = "Username required or path is incorrect";

/// Body of `GET /user/{username}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWithReposResponse {
    pub login: String,
    pub avatar_url: Option<String>,
    pub url: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub created_at: Option<String>,
    pub repos: Vec<RepoSummary>,
}

impl From<AggregateResult> for UserWithReposResponse {
    fn from(aggregate: AggregateResult) -> Self {
        let AggregateResult { profile, repos } = aggregate;
        Self {
            login: profile.login,
            avatar_url: profile.avatar_url,
            url: profile.url,
            name: profile.name,
            location: profile.location,
            email: profile.email,
            created_at: profile.created_at,
            repos,
        }
    }
}

/// Uniform error document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "errorMessages")]
    pub error_messages: Vec<String>,
}

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    InvalidUsername(Vec<String>),
    BadPath,
    Fetch(FetchError),
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        ApiError::Fetch(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidUsername(_) | ApiError::BadPath => StatusCode::BAD_REQUEST,
            ApiError::Fetch(FetchError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Fetch(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Fetch(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        match self {
            ApiError::InvalidUsername(violations) => violations.clone(),
            ApiError::BadPath => vec![BAD_PATH.to_string()],
            ApiError::Fetch(FetchError::Validation(message)) => vec![message.clone()],
            ApiError::Fetch(e) if e.is_not_found() => vec![USER_NOT_FOUND.to_string()],
            ApiError::Fetch(_) => vec![UPSTREAM_FAILURE.to_string()],
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error_messages: self.messages(),
        };
        (self.status(), Json(body)).into_response()
    }
}
