//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream call:
//!     → retries.rs (run operation, classify failure)
//!     → retryable? backoff.rs computes the jittered delay, sleep, try again
//!     → budget spent? surface FetchError::Exhausted wrapping the last failure
//! ```
//!
//! # Invariants
//! - RateLimited and TransportFailure are retried; everything else returns at once
//! - At most `max_attempts` calls per `execute`, including the first
//! - The policy holds configuration only; concurrent `execute` calls share nothing

pub mod backoff;
pub mod retries;

pub use backoff::Backoff;
pub use retries::RetryPolicy;
