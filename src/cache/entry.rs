//! Cached values with insertion time.

use std::time::Duration;

use tokio::time::Instant;

/// A fully computed value and when it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn inserted_at(&self) -> Instant {
        self.inserted_at
    }

    pub fn age(&self) -> Duration {
        self.inserted_at.elapsed()
    }

    /// An entry expires `ttl` after insertion, regardless of reads.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }
}
