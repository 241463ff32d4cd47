//! HTTP surface subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request_id.rs (assign / propagate x-request-id)
//!     → handlers.rs (extract username)
//!     → validation.rs (length and character rules)
//!     → ProfileService::fetch_user_with_repos
//!     → response.rs (JSON body, error → status mapping)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request_id;
pub mod response;
pub mod server;
pub mod validation;

pub use request_id::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
