//! # medipharm-core
//!
//! Core domain types and utilities for the MediPharm search engine:
//! catalog entities, display projections, derived search results, the
//! error taxonomy, great-circle distance math, and trigram text
//! similarity.

pub mod error;
pub mod geo;
pub mod text;
pub mod time;
pub mod types;

pub use error::{CoreError, ErrorCategory, Result};
pub use geo::{GeoPoint, haversine_km};
pub use text::{normalize_text, trigram_similarity};
pub use types::{
    AvailabilityEntry, CallerId, DosageForm, InventoryEntry, InventoryId, Medication,
    MedicationId, MedicationSummary, Pharmacy, PharmacyId, PharmacySummary, SearchHistoryRecord,
    SearchResult,
};
