//! Single-flight TTL cache for one resource kind.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;

use crate::cache::entry::CacheEntry;
use crate::observability::metrics;
use crate::upstream::{FetchError, FetchResult, ResourceKind};

type SharedLoad<V> = Shared<BoxFuture<'static, FetchResult<V>>>;
type Slots<V> = DashMap<String, Slot<V>>;

struct InFlight<V> {
    id: u64,
    load: SharedLoad<V>,
}

/// Per-identifier state. The shard lock guarding it is never held across an await.
struct Slot<V> {
    entry: Option<CacheEntry<V>>,
    in_flight: Option<InFlight<V>>,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            entry: None,
            in_flight: None,
        }
    }
}

/// A TTL cache keyed by identifier that collapses concurrent loads of the same key.
#[derive(Clone)]
pub struct ResourceCache<V> {
    kind: ResourceKind,
    ttl: Duration,
    max_entries: usize,
    slots: Arc<Slots<V>>,
    next_load_id: Arc<AtomicU64>,
}

impl<V> ResourceCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(kind: ResourceKind, ttl: Duration) -> Self {
        Self {
            kind,
            ttl,
            max_entries: usize::MAX,
            slots: Arc::new(DashMap::new()),
            next_load_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Bound the number of identifiers held.
    ///
    /// When a new identifier would exceed the bound, expired entries are
    /// dropped first, then the oldest settled entries. Loads in flight are
    /// never evicted.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Return the live value for `identifier`, or run `loader` to produce it.
    ///
    /// Concurrent callers for the same identifier share a single invocation
    /// of `loader` and all observe its outcome. Failures are not stored.
    pub async fn get_or_load<F, Fut>(&self, identifier: &str, loader: F) -> FetchResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult<V>> + Send + 'static,
    {
        if let Some(value) = self.peek(identifier) {
            tracing::debug!(kind = %self.kind, identifier = %identifier, "Cache hit");
            metrics::record_cache_lookup(self.kind, "hit");
            return Ok(value);
        }

        if !self.slots.contains_key(identifier) && self.slots.len() >= self.max_entries {
            self.make_room();
        }

        let load = {
            let mut slot = self.slots.entry(identifier.to_string()).or_default();

            // Another caller may have stored a value since the read above.
            if let Some(entry) = slot.entry.as_ref() {
                if !entry.is_expired(self.ttl) {
                    tracing::debug!(kind = %self.kind, identifier = %identifier, "Cache hit");
                    metrics::record_cache_lookup(self.kind, "hit");
                    return Ok(entry.value().clone());
                }
            }
            slot.entry = None;

            let joined = slot.in_flight.as_ref().map(|f| f.load.clone());
            match joined {
                Some(load) => {
                    tracing::debug!(kind = %self.kind, identifier = %identifier, "Joining in-flight load");
                    metrics::record_cache_lookup(self.kind, "joined");
                    load
                }
                None => {
                    tracing::debug!(kind = %self.kind, identifier = %identifier, "Cache miss, loading");
                    metrics::record_cache_lookup(self.kind, "miss");
                    let id = self.next_load_id.fetch_add(1, Ordering::Relaxed);
                    let load = self.spawn_load(id, identifier.to_string(), loader());
                    slot.in_flight = Some(InFlight {
                        id,
                        load: load.clone(),
                    });
                    load
                }
            }
        };

        load.await
    }

    /// The live cached value, without loading or touching metrics.
    pub fn peek(&self, identifier: &str) -> Option<V> {
        self.slots.get(identifier).and_then(|slot| {
            slot.entry
                .as_ref()
                .filter(|entry| !entry.is_expired(self.ttl))
                .map(|entry| entry.value().clone())
        })
    }

    /// Drop the entry for `identifier`. A load in flight for it is detached
    /// and will not write its result back.
    pub fn invalidate(&self, identifier: &str) -> bool {
        self.slots.remove(identifier).is_some()
    }

    pub fn clear(&self) {
        self.slots.clear();
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| {
                slot.entry
                    .as_ref()
                    .is_some_and(|entry| !entry.is_expired(self.ttl))
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shrink the map below `max_entries`. Must not be called while holding a slot.
    fn make_room(&self) {
        let ttl = self.ttl;
        let before = self.slots.len();
        self.slots.retain(|_, slot| {
            slot.in_flight.is_some()
                || slot.entry.as_ref().is_some_and(|entry| !entry.is_expired(ttl))
        });

        let target = (self.max_entries - self.max_entries / 10).min(self.max_entries - 1);
        let len = self.slots.len();
        if len > target {
            let mut settled: Vec<(String, Instant)> = self
                .slots
                .iter()
                .filter(|slot| slot.in_flight.is_none())
                .filter_map(|slot| {
                    slot.entry
                        .as_ref()
                        .map(|entry| (slot.key().clone(), entry.inserted_at()))
                })
                .collect();
            settled.sort_by_key(|(_, inserted_at)| *inserted_at);

            for (key, _) in settled.into_iter().take(len - target) {
                self.slots.remove_if(&key, |_, slot| slot.in_flight.is_none());
            }
        }

        tracing::debug!(
            kind = %self.kind,
            evicted = before.saturating_sub(self.slots.len()),
            max_entries = self.max_entries,
            "Cache full, evicted entries"
        );
    }

    fn spawn_load<Fut>(&self, load_id: u64, identifier: String, load: Fut) -> SharedLoad<V>
    where
        Fut: Future<Output = FetchResult<V>> + Send + 'static,
    {
        let kind = self.kind;
        let slots = Arc::clone(&self.slots);
        let key = identifier.clone();

        let handle = tokio::spawn(async move {
            // Releases the slot even if `load` panics or the task is cancelled.
            let _release = ReleaseOnDrop {
                slots: Arc::clone(&slots),
                key: key.clone(),
                load_id,
            };

            let result = load.await;
            if let Some(mut slot) = slots.get_mut(&key) {
                if slot.in_flight.as_ref().is_some_and(|f| f.id == load_id) {
                    slot.in_flight = None;
                    if let Ok(value) = &result {
                        slot.entry = Some(CacheEntry::new(value.clone()));
                        tracing::debug!(kind = %kind, identifier = %key, "Cached");
                    }
                }
            }
            result
        });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(kind = %kind, identifier = %identifier, error = %e, "Cache load task failed");
                    Err(FetchError::Aborted { kind, identifier })
                }
            }
        }
        .boxed()
        .shared()
    }
}

/// Clears the in-flight marker of one load and drops the slot if nothing is left in it.
struct ReleaseOnDrop<V> {
    slots: Arc<Slots<V>>,
    key: String,
    load_id: u64,
}

impl<V> Drop for ReleaseOnDrop<V> {
    fn drop(&mut self) {
        if let Some(mut slot) = self.slots.get_mut(&self.key) {
            if slot.in_flight.as_ref().is_some_and(|f| f.id == self.load_id) {
                slot.in_flight = None;
            }
        }
        self.slots
            .remove_if(&self.key, |_, slot| slot.entry.is_none() && slot.in_flight.is_none());
    }
}
