//! # medipharm-storage
//!
//! Storage abstraction layer for the MediPharm search engine.
//!
//! This crate defines the traits the engine consumes. It does not contain
//! any implementations - those are provided by separate crates (the
//! default in-memory backend lives in `medipharm-db-memory`).
//!
//! ## Overview
//!
//! Four narrow store contracts back the search pipeline:
//! - [`MedicationStore`] - candidate retrieval and search-count increments
//! - [`InventoryStore`] - in-stock rows for one medication
//! - [`PharmacyStore`] - pharmacy lookup by id
//! - [`HistoryStore`] - append-only search history
//!
//! ## Example
//!
//! ```ignore
//! use medipharm_storage::{DynPharmacyStore, StorageError};
//!
//! async fn pharmacy_name(
//!     pharmacies: &DynPharmacyStore,
//!     id: i64,
//! ) -> Result<Option<String>, StorageError> {
//!     Ok(pharmacies.find_by_id(id).await?.map(|p| p.name))
//! }
//! ```

mod error;
mod traits;

pub use error::{ErrorCategory, StorageError};
pub use traits::{HistoryStore, InventoryStore, MedicationStore, PharmacyStore};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed trait-object aliases used by the engine.
pub type DynMedicationStore = std::sync::Arc<dyn MedicationStore>;
pub type DynInventoryStore = std::sync::Arc<dyn InventoryStore>;
pub type DynPharmacyStore = std::sync::Arc<dyn PharmacyStore>;
pub type DynHistoryStore = std::sync::Arc<dyn HistoryStore>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        DynHistoryStore, DynInventoryStore, DynMedicationStore, DynPharmacyStore, HistoryStore,
        InventoryStore, MedicationStore, PharmacyStore, StorageError, StorageResult,
    };
}
