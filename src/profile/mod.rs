//! Profile aggregation subsystem.
//!
//! # Data Flow
//! ```text
//! username
//!     → service.rs (fan out both lookups concurrently)
//!         → client.rs fetch_user  → cache[user]  → retry → transport
//!         → client.rs fetch_repos → cache[repos] → retry → transport
//!     → join both outcomes, user branch inspected first
//!     → AggregateResult, or the first failure
//! ```
//!
//! # Design Decisions
//! - Each branch caches on its own; a failed aggregate still leaves the
//!   successful branch cached
//! - The aggregate exists only fully formed

pub mod client;
pub mod service;
pub mod types;

pub use client::ResourceClient;
pub use service::ProfileService;
pub use types::{AggregateResult, RepoSummary, UserProfile};
