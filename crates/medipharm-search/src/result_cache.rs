//! Result caching for resolved searches.
//!
//! Memoizes the outcome of a `(query, position)` tuple for a bounded
//! time window. Keys quantize coordinates so nearby callers share a
//! cache line and position-less queries collapse onto one sentinel line.
//!
//! ## Design
//!
//! - **Concurrent access**: DashMap, so mutation never locks out readers
//!   of unrelated keys; the last writer for a key wins.
//! - **LRU eviction**: a monotonic access tick per entry; inserting at
//!   capacity removes the least recently used entries first.
//! - **TTL**: fixed, checked at read time independently of LRU; expired
//!   entries are removed on read, and a probabilistic sweep on insert
//!   cleans the rest.
//!
//! Entries are immutable once written. A miss always triggers full
//! aggregation upstream, never partial reuse.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use medipharm_core::{GeoPoint, MedicationId};

use crate::config::CacheConfig;

/// Quantization scale for key coordinates: 1e-4 degrees, roughly eleven
/// meters of latitude.
const COORDINATE_SCALE: f64 = 10_000.0;

/// Sentinel for an absent coordinate so "no location" queries share a
/// cache line.
const NO_COORDINATE: i64 = i64::MIN;

/// Probability (1/N) of sweeping stale entries on insert.
const CLEANUP_PROBABILITY: u32 = 100; // 1% chance

/// Cache key: normalized query text plus quantized position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    text: String,
    lat_q: i64,
    lon_q: i64,
}

impl CacheKey {
    /// Key for a free-text search.
    pub fn for_search(query_lower: &str, origin: Option<GeoPoint>) -> Self {
        Self::build(query_lower.to_string(), origin)
    }

    /// Key for a single-medication availability lookup. The `#` prefix
    /// keeps id keys disjoint from any query text.
    pub fn for_medication(id: MedicationId, origin: Option<GeoPoint>) -> Self {
        Self::build(format!("#{id}"), origin)
    }

    fn build(text: String, origin: Option<GeoPoint>) -> Self {
        match origin {
            Some(p) => Self {
                text,
                lat_q: quantize(p.latitude),
                lon_q: quantize(p.longitude),
            },
            None => Self {
                text,
                lat_q: NO_COORDINATE,
                lon_q: NO_COORDINATE,
            },
        }
    }
}

fn quantize(degrees: f64) -> i64 {
    (degrees * COORDINATE_SCALE).round() as i64
}

struct CacheSlot<V> {
    value: V,
    cached_at: Instant,
    last_access: AtomicU64,
}

/// Thread-safe result cache with LRU eviction and a fixed TTL.
pub struct ResultCache<V> {
    entries: DashMap<CacheKey, CacheSlot<V>>,
    capacity: usize,
    ttl: Duration,
    /// Monotonic tick stamped on each access, for LRU ordering.
    clock: AtomicU64,
    stats: CacheStatistics,
}

impl<V> std::fmt::Debug for ResultCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("capacity", &self.capacity)
            .field("size", &self.entries.len())
            .field("ttl", &self.ttl)
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

impl<V: Clone> ResultCache<V> {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: config.capacity,
            ttl: config.ttl,
            clock: AtomicU64::new(0),
            stats: CacheStatistics::default(),
        }
    }

    /// Looks up a key, treating expired entries as misses and removing
    /// them.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        if let Some(slot) = self.entries.get(key) {
            if slot.cached_at.elapsed() >= self.ttl {
                drop(slot); // release the shard lock before removing
                self.entries.remove(key);
                self.stats.expirations.fetch_add(1, Ordering::Relaxed);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            slot.last_access.store(self.tick(), Ordering::Relaxed);
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Some(slot.value.clone());
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Inserts a value, evicting least recently used entries when at
    /// capacity. Racing writers for the same key are safe: the last one
    /// wins.
    pub fn insert(&self, key: CacheKey, value: V) {
        if self.capacity == 0 {
            return;
        }

        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.evict_lru();
        }

        // Amortized stale sweep, so expired entries that are never read
        // again do not pin memory until eviction.
        if fastrand::u32(0..CLEANUP_PROBABILITY) == 0 {
            self.cleanup_stale();
        }

        self.entries.insert(
            key,
            CacheSlot {
                value,
                cached_at: Instant::now(),
                last_access: AtomicU64::new(self.tick()),
            },
        );
        self.stats.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// Removes entries older than the TTL.
    pub fn cleanup_stale(&self) {
        let stale: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|slot| slot.cached_at.elapsed() >= self.ttl)
            .map(|slot| slot.key().clone())
            .collect();

        for key in stale {
            if self.entries.remove(&key).is_some() {
                self.stats.expirations.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn evict_lru(&self) {
        while self.entries.len() >= self.capacity {
            let victim = self
                .entries
                .iter()
                .min_by_key(|slot| slot.last_access.load(Ordering::Relaxed))
                .map(|slot| slot.key().clone());
            let Some(key) = victim else { break };
            self.entries.remove(&key);
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Default)]
struct CacheStatistics {
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl CacheStatistics {
    fn snapshot(&self) -> CacheStatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStatsSnapshot {
            hits,
            misses,
            insertions: self.insertions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            hit_ratio: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}

/// A point-in-time snapshot of cache statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub hit_ratio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize, ttl: Duration) -> ResultCache<String> {
        ResultCache::new(&CacheConfig { capacity, ttl })
    }

    #[test]
    fn insert_then_hit() {
        let cache = cache(10, Duration::from_secs(600));
        let key = CacheKey::for_search("amox", None);

        cache.insert(key.clone(), "results".to_string());
        assert_eq!(cache.get(&key).as_deref(), Some("results"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.insertions, 1);
    }

    #[test]
    fn miss_on_unknown_key() {
        let cache = cache(10, Duration::from_secs(600));
        assert!(cache.get(&CacheKey::for_search("amox", None)).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn positionless_queries_share_a_line_and_positions_do_not() {
        let near = GeoPoint::new(48.85661, 2.35220);
        let same_cell = GeoPoint::new(48.85662, 2.35221);
        let elsewhere = GeoPoint::new(48.9, 2.4);

        assert_eq!(
            CacheKey::for_search("amox", None),
            CacheKey::for_search("amox", None)
        );
        assert_eq!(
            CacheKey::for_search("amox", Some(near)),
            CacheKey::for_search("amox", Some(same_cell))
        );
        assert_ne!(
            CacheKey::for_search("amox", Some(near)),
            CacheKey::for_search("amox", Some(elsewhere))
        );
        assert_ne!(
            CacheKey::for_search("amox", Some(near)),
            CacheKey::for_search("amox", None)
        );
        // Medication keys never collide with query text.
        assert_ne!(
            CacheKey::for_medication(7, None),
            CacheKey::for_search("7", None)
        );
    }

    #[test]
    fn expired_entry_is_a_miss_and_gets_removed() {
        let cache = cache(10, Duration::from_millis(30));
        let key = CacheKey::for_search("amox", None);
        cache.insert(key.clone(), "v".to_string());

        std::thread::sleep(Duration::from_millis(50));
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());

        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn evicts_least_recently_used_at_capacity() {
        let cache = cache(2, Duration::from_secs(600));
        let a = CacheKey::for_search("a", None);
        let b = CacheKey::for_search("b", None);
        let c = CacheKey::for_search("c", None);

        cache.insert(a.clone(), "a".to_string());
        cache.insert(b.clone(), "b".to_string());
        // Touch `a` so `b` becomes the LRU victim.
        cache.get(&a);
        cache.insert(c.clone(), "c".to_string());

        assert!(cache.get(&a).is_some());
        assert!(cache.get(&b).is_none());
        assert!(cache.get(&c).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn overwriting_a_key_keeps_last_value() {
        let cache = cache(2, Duration::from_secs(600));
        let key = CacheKey::for_search("amox", None);
        cache.insert(key.clone(), "old".to_string());
        cache.insert(key.clone(), "new".to_string());
        assert_eq!(cache.get(&key).as_deref(), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let cache = cache(0, Duration::from_secs(600));
        let key = CacheKey::for_search("amox", None);
        cache.insert(key.clone(), "v".to_string());
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn cleanup_stale_sweeps_expired_entries() {
        let cache = cache(10, Duration::from_millis(10));
        for i in 0..3 {
            cache.insert(CacheKey::for_search(&format!("q{i}"), None), String::new());
        }
        std::thread::sleep(Duration::from_millis(30));
        cache.cleanup_stale();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().expirations, 3);
    }
}
