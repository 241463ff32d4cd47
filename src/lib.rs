//! Profile aggregation service library.
//!
//! Fetches a user profile and that user's repository list from the upstream
//! API, caches each per kind, retries rate-limited calls, and serves the
//! combination over HTTP.

// Core
pub mod cache;
pub mod profile;
pub mod resilience;
pub mod upstream;

// Surfaces and cross-cutting concerns
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use profile::{AggregateResult, ProfileService, ResourceClient};
pub use upstream::{FetchError, FetchResult, UpstreamError};
