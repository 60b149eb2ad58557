//! # medipharm-search
//!
//! Medication search and availability resolution engine.
//!
//! Given a free-text query and an optional caller position, the engine
//! finds matching medications, aggregates which pharmacies currently
//! stock them, geo-ranks the availability lists, and memoizes resolved
//! results — all under per-operation rate limiting, bulkheading, a
//! timeout and a circuit breaker so search degrades to an empty result
//! instead of failing when downstream stores misbehave.
//!
//! ## Pipeline
//!
//! ```text
//! query -> matcher -> candidates -> (per medication, concurrent)
//!   availability aggregation -> geo ranking -> assembled results
//!   -> cache write-through, guarded end to end by the resilience shell;
//!   search-count increments and history records fire asynchronously
//!   after the response is composed.
//! ```

pub mod availability;
pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod matcher;
pub mod notifier;
pub mod result_cache;

pub use availability::AvailabilityAggregator;
pub use config::{CacheConfig, EngineConfig, NotifierConfig, SearchConfig};
pub use engine::{AVAILABILITY_OPERATION, SEARCH_OPERATION, SearchEngine};
pub use error::{RejectReason, SearchError};
pub use geo::rank_by_distance;
pub use matcher::TextMatcher;
pub use notifier::{NotifierStats, SideEffectNotifier};
pub use result_cache::{CacheKey, CacheStatsSnapshot, ResultCache};
