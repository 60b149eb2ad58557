//! In-memory pharmacy inventory.

use async_trait::async_trait;
use dashmap::DashMap;

use medipharm_core::{InventoryEntry, InventoryId, MedicationId};
use medipharm_storage::{InventoryStore, StorageError};

/// Upper bound on rows returned per medication, matching the backing
/// query contract.
const MAX_ROWS_PER_MEDICATION: usize = 100;

/// In-memory inventory store over a lock-free concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    data: DashMap<InventoryId, InventoryEntry>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an inventory row.
    pub fn insert(&self, entry: InventoryEntry) {
        self.data.insert(entry.id, entry);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn find_available_by_medication(
        &self,
        medication_id: MedicationId,
    ) -> Result<Vec<InventoryEntry>, StorageError> {
        let mut rows: Vec<InventoryEntry> = self
            .data
            .iter()
            .filter(|entry| {
                let e = entry.value();
                e.medication_id == medication_id && e.is_in_stock()
            })
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|e| e.id);
        rows.truncate(MAX_ROWS_PER_MEDICATION);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn filters_to_in_stock_rows() {
        let store = InMemoryInventoryStore::new();
        store.insert(InventoryEntry::new(1, 10, 100).with_stock(5, Some(9.9)));
        store.insert(InventoryEntry::new(2, 11, 100).with_stock(0, Some(9.9)));
        store.insert(InventoryEntry::new(3, 12, 100).with_stock(2, None).unavailable());
        store.insert(InventoryEntry::new(4, 13, 100)); // no quantity at all
        store.insert(InventoryEntry::new(5, 10, 200).with_stock(7, None));

        let rows = store.find_available_by_medication(100).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);

        let other = store.find_available_by_medication(200).await.unwrap();
        assert_eq!(other.len(), 1);
        assert_eq!(other[0].pharmacy_id, 10);
    }

    #[tokio::test]
    async fn empty_result_for_unknown_medication() {
        let store = InMemoryInventoryStore::new();
        let rows = store.find_available_by_medication(42).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn caps_rows_per_medication() {
        let store = InMemoryInventoryStore::new();
        for i in 0..150 {
            store.insert(InventoryEntry::new(i, i, 7).with_stock(1, None));
        }
        let rows = store.find_available_by_medication(7).await.unwrap();
        assert_eq!(rows.len(), 100);
        // Lowest ids win under the deterministic ordering.
        assert_eq!(rows[0].id, 0);
        assert_eq!(rows[99].id, 99);
    }
}
