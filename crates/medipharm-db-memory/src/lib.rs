//! # medipharm-db-memory
//!
//! In-memory storage backend for the MediPharm search engine.
//!
//! Provides lock-free concurrent implementations of the four store
//! contracts over `dashmap`, used as the default backend and as the
//! substrate for every test suite in the workspace.

mod history;
mod inventory;
mod medication;
mod pharmacy;

pub use history::InMemoryHistoryStore;
pub use inventory::InMemoryInventoryStore;
pub use medication::InMemoryMedicationStore;
pub use pharmacy::InMemoryPharmacyStore;

use std::sync::Arc;

use medipharm_storage::{
    DynHistoryStore, DynInventoryStore, DynMedicationStore, DynPharmacyStore,
};

/// The full set of in-memory stores backing one engine instance.
///
/// The concrete stores stay reachable for seeding and assertions while
/// the `Dyn*` accessors hand trait objects to the engine.
#[derive(Debug, Default)]
pub struct MemoryStores {
    pub medications: Arc<InMemoryMedicationStore>,
    pub inventories: Arc<InMemoryInventoryStore>,
    pub pharmacies: Arc<InMemoryPharmacyStore>,
    pub history: Arc<InMemoryHistoryStore>,
}

impl MemoryStores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn medication_store(&self) -> DynMedicationStore {
        self.medications.clone()
    }

    pub fn inventory_store(&self) -> DynInventoryStore {
        self.inventories.clone()
    }

    pub fn pharmacy_store(&self) -> DynPharmacyStore {
        self.pharmacies.clone()
    }

    pub fn history_store(&self) -> DynHistoryStore {
        self.history.clone()
    }
}
