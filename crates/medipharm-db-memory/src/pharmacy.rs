//! In-memory pharmacy directory.

use async_trait::async_trait;
use dashmap::DashMap;

use medipharm_core::{Pharmacy, PharmacyId};
use medipharm_storage::{PharmacyStore, StorageError};

/// In-memory pharmacy store over a lock-free concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryPharmacyStore {
    data: DashMap<PharmacyId, Pharmacy>,
}

impl InMemoryPharmacyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a pharmacy.
    pub fn insert(&self, pharmacy: Pharmacy) {
        self.data.insert(pharmacy.id, pharmacy);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl PharmacyStore for InMemoryPharmacyStore {
    async fn find_by_id(&self, id: PharmacyId) -> Result<Option<Pharmacy>, StorageError> {
        Ok(self.data.get(&id).map(|p| p.clone()))
    }
}
