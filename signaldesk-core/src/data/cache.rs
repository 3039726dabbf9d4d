//! Read-through bar cache with TTL expiry and per-key fetch coalescing.
//!
//! One `BarCache` lives for a scan session. Entries are keyed by
//! (symbol, lookback) and expire after the configured TTL. Concurrent misses
//! on the same key serialize on a per-key gate, so at most one provider fetch
//! per key is in flight; waiters re-read the cache once the gate opens.
//! Failed fetches are never cached.

use super::provider::{DataError, DataProvider};
use crate::domain::BarSeries;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub lookback: usize,
}

impl CacheKey {
    pub fn new(symbol: impl Into<String>, lookback: usize) -> Self {
        Self {
            symbol: symbol.into(),
            lookback,
        }
    }
}

struct CacheEntry {
    series: Arc<BarSeries>,
    expires_at: Instant,
}

/// Counters since construction (or the last `clear`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Thread-safe TTL cache of bar series.
pub struct BarCache {
    entries: DashMap<CacheKey, CacheEntry>,
    in_flight: DashMap<CacheKey, Arc<Mutex<()>>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl BarCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live entry for `key`. An expired entry is evicted and reported absent.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<BarSeries>> {
        let entry = self.entries.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(Arc::clone(&entry.series))
        } else {
            drop(entry);
            let now = Instant::now();
            self.entries.remove_if(key, |_, e| e.expires_at <= now);
            None
        }
    }

    pub fn insert(&self, key: CacheKey, series: Arc<BarSeries>) {
        self.entries.insert(
            key,
            CacheEntry {
                series,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Return the cached series for `key`, or run `fetch` and cache its result.
    ///
    /// Concurrent callers with the same key share one call to `fetch`.
    pub fn get_or_fetch<F>(&self, key: &CacheKey, fetch: F) -> Result<Arc<BarSeries>, DataError>
    where
        F: FnOnce() -> Result<BarSeries, DataError>,
    {
        if let Some(series) = self.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(series);
        }

        let gate = Arc::clone(&self.in_flight.entry(key.clone()).or_default());
        let guard = gate.lock().unwrap_or_else(|e| e.into_inner());

        let result = if let Some(series) = self.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(symbol = %key.symbol, "cache hit after waiting on in-flight fetch");
            Ok(series)
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            fetch().map(|series| {
                let series = Arc::new(series);
                self.insert(key.clone(), Arc::clone(&series));
                series
            })
        };

        drop(guard);
        self.release_gate(key, &gate);
        result
    }

    /// Drop the gate for `key` unless another caller still holds a clone.
    fn release_gate(&self, key: &CacheKey, gate: &Arc<Mutex<()>>) {
        // One reference lives in the map, one is `gate`.
        self.in_flight
            .remove_if(key, |_, g| Arc::ptr_eq(g, gate) && Arc::strong_count(g) == 2);
    }

    /// Drop one entry. Returns true if it was present.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry for `symbol`, whatever the lookback.
    pub fn invalidate_symbol(&self, symbol: &str) {
        self.entries.retain(|k, _| k.symbol != symbol);
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.in_flight.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Remove all expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, e| e.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

impl std::fmt::Debug for BarCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BarCache")
            .field("ttl", &self.ttl)
            .field("stats", &self.stats())
            .finish()
    }
}

/// A provider whose fetches go through a shared `BarCache`.
pub struct CachedProvider<P> {
    inner: P,
    cache: Arc<BarCache>,
}

impl<P: DataProvider> CachedProvider<P> {
    pub fn new(inner: P, cache: Arc<BarCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<BarCache> {
        &self.cache
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: DataProvider> DataProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self, symbol: &str, lookback: usize) -> Result<BarSeries, DataError> {
        let key = CacheKey::new(symbol, lookback);
        self.cache
            .get_or_fetch(&key, || self.inner.fetch(symbol, lookback))
            .map(|series| (*series).clone())
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}
