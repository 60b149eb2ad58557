//! Engine configuration.
//!
//! Every tunable has a production default; embedding applications
//! deserialize overrides from their own configuration source.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use medipharm_resilience::GuardConfig;

/// Text matching tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Cap on medications returned per query.
    pub max_results: usize,
    /// Trigram similarity score above which a candidate matches without
    /// a substring hit.
    pub similarity_threshold: f64,
    /// Queries longer than this are rejected before the pipeline runs.
    pub max_query_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 50,
            similarity_threshold: 0.3,
            max_query_len: 200,
        }
    }
}

/// Result cache tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Bounded entry count; least recently used entries are evicted
    /// beyond it. Zero disables the cache.
    pub capacity: usize,
    /// Fixed time-to-live checked at read time, independent of LRU.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            ttl: Duration::from_secs(600),
        }
    }
}

/// Side-effect queue tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Bounded queue depth; effects beyond it are dropped, never
    /// backpressured onto the request path.
    pub queue_capacity: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub search: SearchConfig,
    pub search_cache: CacheConfig,
    pub availability_cache: CacheConfig,
    pub search_guard: GuardConfig,
    pub availability_guard: GuardConfig,
    pub notifier: NotifierConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            search_cache: CacheConfig::default(),
            availability_cache: CacheConfig::default(),
            search_guard: GuardConfig::default(),
            // Single-medication lookups fan out less, so they get a
            // tighter deadline.
            availability_guard: GuardConfig {
                timeout: Duration::from_secs(3),
                ..GuardConfig::default()
            },
            notifier: NotifierConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let config = EngineConfig::default();
        assert_eq!(config.search.max_results, 50);
        assert_eq!(config.search.similarity_threshold, 0.3);
        assert_eq!(config.search_cache.capacity, 10_000);
        assert_eq!(config.search_cache.ttl, Duration::from_secs(600));
        assert!(config.availability_guard.timeout < config.search_guard.timeout);
    }

    #[test]
    fn round_trips_through_serde() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.search.max_results, config.search.max_results);
        assert_eq!(back.search_cache.ttl, config.search_cache.ttl);
    }
}
