//! Per-resource caching subsystem.
//!
//! # Data Flow
//! ```text
//! get_or_load(identifier, loader)
//!     → live entry?            return a clone, loader untouched
//!     → load already running?  await the shared in-flight load
//!     → otherwise              spawn loader once, register it, await it
//!         → Ok:  store CacheEntry { value, inserted_at }, fan out to waiters
//!         → Err: store nothing, fan out the error, next call loads afresh
//! ```
//!
//! # Invariants
//! - At most one load in flight per identifier
//! - Expiry is checked on read; there is no sweeper task
//! - An entry becomes visible only once its value is complete
//! - Loads run in their own task and still populate the cache if every caller is dropped

pub mod entry;
pub mod store;

pub use entry::CacheEntry;
pub use store::ResourceCache;
