//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks, all errors collected)
//!     → AppConfig (validated, immutable)
//!     → handed to each subsystem's constructor at startup
//! ```
//!
//! Every field has a default, so an empty file is a complete configuration.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, CacheConfig, LogFormat, ObservabilityConfig, RetryConfig, ServerConfig,
    UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
