//! End-to-end search pipeline.
//!
//! `SearchEngine` wires the matcher, aggregator, geo ranker, caches and
//! notifier together and runs every request under its operation's guard.
//! Overload rejections surface as errors; every degraded outcome (open
//! circuit, timeout, downstream fault) returns the empty fallback, which
//! is never cached.

use std::sync::Arc;

use futures_util::future::try_join_all;
use tracing::{debug, warn};

use medipharm_core::{CallerId, GeoPoint, MedicationId, MedicationSummary, SearchResult};
use medipharm_resilience::{GuardError, GuardRegistry, OperationGuard};
use medipharm_storage::{
    DynHistoryStore, DynInventoryStore, DynMedicationStore, DynPharmacyStore, StorageError,
};

use crate::availability::AvailabilityAggregator;
use crate::config::{EngineConfig, SearchConfig};
use crate::error::{RejectReason, SearchError};
use crate::geo::rank_by_distance;
use crate::matcher::TextMatcher;
use crate::notifier::SideEffectNotifier;
use crate::result_cache::{CacheKey, CacheStatsSnapshot, ResultCache};

/// Guard name for the free-text search pipeline.
pub const SEARCH_OPERATION: &str = "search";
/// Guard name for single-medication availability lookups.
pub const AVAILABILITY_OPERATION: &str = "availability-lookup";

/// The medication search and availability resolution engine.
///
/// One instance per process: the caches, guard state and notifier queue
/// are shared by every concurrent caller and are never implicitly reset.
pub struct SearchEngine {
    matcher: TextMatcher,
    aggregator: AvailabilityAggregator,
    medications: DynMedicationStore,
    notifier: SideEffectNotifier,
    search_cache: ResultCache<Vec<SearchResult>>,
    availability_cache: ResultCache<SearchResult>,
    guards: Arc<GuardRegistry>,
    search_guard: Arc<OperationGuard>,
    availability_guard: Arc<OperationGuard>,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(
        medications: DynMedicationStore,
        inventories: DynInventoryStore,
        pharmacies: DynPharmacyStore,
        history: DynHistoryStore,
        config: EngineConfig,
    ) -> Self {
        let notifier =
            SideEffectNotifier::spawn(medications.clone(), history, &config.notifier);
        let guards = Arc::new(GuardRegistry::new());
        let search_guard = guards.register(SEARCH_OPERATION, &config.search_guard);
        let availability_guard =
            guards.register(AVAILABILITY_OPERATION, &config.availability_guard);

        Self {
            matcher: TextMatcher::new(
                medications.clone(),
                notifier.clone(),
                config.search.clone(),
            ),
            aggregator: AvailabilityAggregator::new(inventories, pharmacies),
            medications,
            notifier,
            search_cache: ResultCache::new(&config.search_cache),
            availability_cache: ResultCache::new(&config.availability_cache),
            guards,
            search_guard,
            availability_guard,
            config: config.search,
        }
    }

    /// Resolves a free-text query into ranked search results.
    ///
    /// Returns `Err` only for an invalid query or an overload rejection.
    /// Degraded outcomes return `Ok` with the empty fallback, which is
    /// indistinguishable from "no matches" by design. A history record
    /// is scheduled for every resolved query, zero matches included.
    pub async fn search_medications(
        &self,
        query: &str,
        position: Option<GeoPoint>,
        caller_id: Option<CallerId>,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let query_lower = TextMatcher::normalize_query(query, &self.config)?;

        let results = match self
            .search_guard
            .run(self.search_pipeline(&query_lower, position))
            .await
        {
            Ok(results) => results,
            Err(err) if err.is_overload() => return Err(overload_error(&err)),
            Err(err) => {
                warn!(query = %query_lower, error = %err, "search degraded to empty fallback");
                Vec::new()
            }
        };

        self.notifier
            .record_search(caller_id, &query_lower, results.len() as u32);
        Ok(results)
    }

    /// Availability for a single medication: the same aggregation and
    /// ranking as search, without the search-count side effect.
    ///
    /// An unknown or inactive medication id resolves to `Ok(None)`.
    pub async fn medication_availability(
        &self,
        medication_id: MedicationId,
        position: Option<GeoPoint>,
    ) -> Result<Option<SearchResult>, SearchError> {
        match self
            .availability_guard
            .run(self.availability_pipeline(medication_id, position))
            .await
        {
            Ok(result) => Ok(result),
            Err(err) if err.is_overload() => Err(overload_error(&err)),
            Err(err) => {
                warn!(
                    medication_id,
                    error = %err,
                    "availability lookup degraded to empty fallback"
                );
                Ok(None)
            }
        }
    }

    async fn search_pipeline(
        &self,
        query_lower: &str,
        position: Option<GeoPoint>,
    ) -> Result<Vec<SearchResult>, StorageError> {
        let key = CacheKey::for_search(query_lower, position);
        if let Some(cached) = self.search_cache.get(&key) {
            debug!(query = %query_lower, "search cache hit");
            return Ok(cached);
        }

        let medications = self.matcher.matches(query_lower).await?;
        let availability = try_join_all(
            medications
                .iter()
                .map(|m| self.aggregator.availability(m.id)),
        )
        .await?;

        let results: Vec<SearchResult> = medications
            .iter()
            .zip(availability)
            .map(|(medication, mut entries)| {
                rank_by_distance(&mut entries, position);
                SearchResult {
                    medication: MedicationSummary::from(medication),
                    available_at: entries,
                }
            })
            .collect();

        self.search_cache.insert(key, results.clone());
        Ok(results)
    }

    async fn availability_pipeline(
        &self,
        medication_id: MedicationId,
        position: Option<GeoPoint>,
    ) -> Result<Option<SearchResult>, StorageError> {
        let key = CacheKey::for_medication(medication_id, position);
        if let Some(cached) = self.availability_cache.get(&key) {
            debug!(medication_id, "availability cache hit");
            return Ok(Some(cached));
        }

        let Some(medication) = self.medications.find_by_id(medication_id).await? else {
            return Ok(None);
        };
        if !medication.is_active {
            return Ok(None);
        }

        let mut entries = self.aggregator.availability(medication_id).await?;
        rank_by_distance(&mut entries, position);
        let result = SearchResult {
            medication: MedicationSummary::from(&medication),
            available_at: entries,
        };

        self.availability_cache.insert(key, result.clone());
        Ok(Some(result))
    }

    /// Guard registry, for operational tooling and tests.
    pub fn guards(&self) -> &GuardRegistry {
        &self.guards
    }

    pub fn notifier(&self) -> &SideEffectNotifier {
        &self.notifier
    }

    pub fn search_cache_stats(&self) -> CacheStatsSnapshot {
        self.search_cache.stats()
    }

    pub fn availability_cache_stats(&self) -> CacheStatsSnapshot {
        self.availability_cache.stats()
    }
}

fn overload_error<E>(err: &GuardError<E>) -> SearchError {
    match err {
        GuardError::RateLimited => SearchError::Overloaded(RejectReason::RateLimited),
        _ => SearchError::Overloaded(RejectReason::ConcurrencyLimit),
    }
}
