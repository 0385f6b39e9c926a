//! Time-windowed memoization of warehouse results
//!
//! Entries are keyed by the request parameter (the status filter, or `()` for
//! the summary) and are never evicted explicitly; an entry older than the
//! window is simply refetched on the next request.
//!
//! The lock is released while a value is being fetched, so two callers that
//! miss on the same key at the same time may both fetch. The last writer
//! wins and both get a complete value.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Default expiry window for cached results
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Source of "now" for expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
///
/// Clones share the same time, so one handle can drive several caches.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        *elapsed += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Hit/miss counters for a cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

struct CacheEntry<V> {
    value: Arc<V>,
    stored_at: Instant,
}

/// A TTL cache of shared results
pub struct ResultCache<K, V, C = SystemClock> {
    ttl: Duration,
    clock: C,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> ResultCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<K, V, C> ResultCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value for `key` if it is still fresh, otherwise run
    /// `fetch`, store its result and return it
    ///
    /// Errors from `fetch` are returned as-is and nothing is stored.
    pub fn get_or_try_insert_with<E, F>(&self, key: K, fetch: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = Arc::new(fetch()?);

        let mut entries = self.lock();
        entries.insert(
            key,
            CacheEntry {
                value: Arc::clone(&value),
                stored_at: self.clock.now(),
            },
        );
        Ok(value)
    }

    /// Fresh value for `key`, if any
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let now = self.clock.now();
        let entries = self.lock();
        entries
            .get(key)
            .filter(|entry| now.saturating_duration_since(entry.stored_at) < self.ttl)
            .map(|entry| Arc::clone(&entry.value))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.lock().len(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting_fetch(counter: &Cell<u32>, value: &'static str) -> Result<String, String> {
        counter.set(counter.get() + 1);
        Ok(value.to_string())
    }

    #[test]
    fn test_second_request_within_window_is_a_hit() {
        let clock = ManualClock::new();
        let cache = ResultCache::with_clock(DEFAULT_TTL, clock.clone());
        let fetches = Cell::new(0);

        let first = cache
            .get_or_try_insert_with("DENIED", || counting_fetch(&fetches, "a"))
            .unwrap();
        clock.advance(Duration::from_secs(299));
        let second = cache
            .get_or_try_insert_with("DENIED", || counting_fetch(&fetches, "b"))
            .unwrap();

        assert_eq!(fetches.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn test_request_after_window_refetches() {
        let clock = ManualClock::new();
        let cache = ResultCache::with_clock(DEFAULT_TTL, clock.clone());
        let fetches = Cell::new(0);

        let first = cache
            .get_or_try_insert_with("ALL", || counting_fetch(&fetches, "old"))
            .unwrap();
        clock.advance(DEFAULT_TTL);
        let second = cache
            .get_or_try_insert_with("ALL", || counting_fetch(&fetches, "new"))
            .unwrap();

        assert_eq!(fetches.get(), 2);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.as_str(), "new");
    }

    #[test]
    fn test_keys_are_independent() {
        let cache: ResultCache<&str, String, _> =
            ResultCache::with_clock(DEFAULT_TTL, ManualClock::new());
        let fetches = Cell::new(0);

        cache
            .get_or_try_insert_with("ALL", || counting_fetch(&fetches, "all"))
            .unwrap();
        let denied = cache
            .get_or_try_insert_with("DENIED", || counting_fetch(&fetches, "denied"))
            .unwrap();

        assert_eq!(fetches.get(), 2);
        assert_eq!(denied.as_str(), "denied");
        assert_eq!(cache.stats().entries, 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache: ResultCache<(), String, _> =
            ResultCache::with_clock(DEFAULT_TTL, ManualClock::new());

        let err = cache.get_or_try_insert_with((), || Err::<String, _>("offline"));
        assert_eq!(err.unwrap_err(), "offline");
        assert!(cache.get(&()).is_none());

        let ok = cache.get_or_try_insert_with((), || Ok::<_, &str>("back".to_string()));
        assert_eq!(ok.unwrap().as_str(), "back");
    }

    #[test]
    fn test_concurrent_callers_get_complete_values() {
        let cache = Arc::new(ResultCache::<u8, Vec<u32>>::new(DEFAULT_TTL));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache
                        .get_or_try_insert_with(0, || Ok::<_, ()>((0..100).collect()))
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            let value = handle.join().unwrap();
            assert_eq!(value.len(), 100);
        }
        assert_eq!(cache.stats().entries, 1);
    }
}
