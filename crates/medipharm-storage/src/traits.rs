//! Store traits consumed by the search engine.
//!
//! Implementations must be thread-safe (`Send + Sync`). Missing rows are
//! valid empty results, never errors; errors are reserved for
//! infrastructure faults.

use async_trait::async_trait;

use medipharm_core::{
    InventoryEntry, Medication, MedicationId, Pharmacy, PharmacyId, SearchHistoryRecord,
};

use crate::error::StorageError;

/// Read access to the medication catalog plus the search-count counter.
#[async_trait]
pub trait MedicationStore: Send + Sync {
    /// Returns active medications matching a free-text query.
    ///
    /// `pattern` is a SQL-LIKE wildcard pattern (`%query%`) for substring
    /// matching against the stored lowercase name and generic-name code;
    /// `query_lower` is the bare normalized query used for trigram
    /// similarity scoring. A candidate matches when either field contains
    /// the pattern or scores above the backend's similarity threshold.
    ///
    /// Ordering is not part of the contract; callers rank the returned
    /// candidates themselves.
    async fn find_active_by_text_similarity(
        &self,
        pattern: &str,
        query_lower: &str,
    ) -> Result<Vec<Medication>, StorageError>;

    /// Reads a medication by id. Returns `None` when absent.
    async fn find_by_id(&self, id: MedicationId) -> Result<Option<Medication>, StorageError>;

    /// Increments the medication's search-count counter.
    ///
    /// The counter is monotonic non-decreasing; a lost increment is
    /// acceptable, a decrement is not. Incrementing an unknown id is a
    /// no-op.
    async fn increment_search_count(&self, id: MedicationId) -> Result<(), StorageError>;
}

/// Read access to pharmacy stock.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Returns stock entries for a medication that are flagged available
    /// and hold positive quantity, capped at 100 rows. Absence of any
    /// entry is a valid empty result.
    async fn find_available_by_medication(
        &self,
        medication_id: MedicationId,
    ) -> Result<Vec<InventoryEntry>, StorageError>;
}

/// Read access to pharmacies.
#[async_trait]
pub trait PharmacyStore: Send + Sync {
    /// Reads a pharmacy by id. Returns `None` when absent. Filtering to
    /// active pharmacies is the caller's responsibility.
    async fn find_by_id(&self, id: PharmacyId) -> Result<Option<Pharmacy>, StorageError>;
}

/// Append-only search history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Appends a search history record. Records are write-once; there is
    /// no update or delete surface.
    async fn append(&self, record: SearchHistoryRecord) -> Result<(), StorageError>;
}
