//! Request handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::http::response::{ApiError, UserWithReposResponse};
use crate::http::server::AppState;
use crate::http::validation::validate_username;

/// `GET /user/{username}`
pub async fn user_with_repos(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserWithReposResponse>, ApiError> {
    validate_username(&username).map_err(ApiError::InvalidUsername)?;

    let aggregate = state.service.fetch_user_with_repos(&username).await?;
    tracing::debug!(
        username = %username,
        repos = aggregate.repos.len(),
        "Aggregate served"
    );
    Ok(Json(aggregate.into()))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Any path without a handler.
pub async fn fallback() -> ApiError {
    ApiError::BadPath
}
