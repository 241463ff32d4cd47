//! Upstream access subsystem.
//!
//! # Data Flow
//! ```text
//! (kind, identifier)
//!     → transport.rs (resolve endpoint template, one GET, classify status)
//!     → RawResponse on 2xx, UpstreamError otherwise
//!     → caller decodes the body into a typed record
//! ```
//!
//! # Responsibilities
//! - Own the HTTP client and its connect/request timeouts
//! - Map HTTP status ranges onto `UpstreamError`
//! - Never retry; exactly one network call per `fetch`

pub mod error;
pub mod transport;
pub mod types;

pub use error::{FetchError, FetchResult, UpstreamError};
pub use transport::HttpTransport;
pub use types::{RawResponse, ResourceKind};
