//! Per-medication availability aggregation.

use futures_util::future::join_all;
use tracing::debug;

use medipharm_core::{AvailabilityEntry, InventoryEntry, MedicationId, PharmacySummary};
use medipharm_storage::{DynInventoryStore, DynPharmacyStore, StorageError};

/// Loads the in-stock inventory for one medication and resolves each
/// entry to its owning pharmacy.
///
/// A failed, missing or inactive pharmacy lookup drops that entry only;
/// it is stale data, not a fault, and never fails the query. Inventory
/// store faults do propagate.
pub struct AvailabilityAggregator {
    inventories: DynInventoryStore,
    pharmacies: DynPharmacyStore,
}

impl AvailabilityAggregator {
    pub fn new(inventories: DynInventoryStore, pharmacies: DynPharmacyStore) -> Self {
        Self {
            inventories,
            pharmacies,
        }
    }

    /// Availability entries for one medication, in inventory order,
    /// without distances. Absence of stock is a valid empty result.
    pub async fn availability(
        &self,
        medication_id: MedicationId,
    ) -> Result<Vec<AvailabilityEntry>, StorageError> {
        let rows = self
            .inventories
            .find_available_by_medication(medication_id)
            .await?;

        let resolved = join_all(rows.iter().map(|row| self.resolve(row))).await;
        Ok(resolved.into_iter().flatten().collect())
    }

    async fn resolve(&self, row: &InventoryEntry) -> Option<AvailabilityEntry> {
        // The store contract already filters, but stale rows must never
        // surface zero-quantity stock.
        if !row.is_in_stock() {
            return None;
        }

        match self.pharmacies.find_by_id(row.pharmacy_id).await {
            Ok(Some(pharmacy)) if pharmacy.is_active => Some(AvailabilityEntry {
                pharmacy: PharmacySummary::from(&pharmacy),
                price: row.price,
                quantity: row.stocked_quantity(),
                distance_km: None,
            }),
            Ok(_) => {
                debug!(
                    pharmacy_id = row.pharmacy_id,
                    "dropping stock entry for missing or inactive pharmacy"
                );
                None
            }
            Err(err) => {
                debug!(
                    pharmacy_id = row.pharmacy_id,
                    error = %err,
                    "dropping stock entry after failed pharmacy lookup"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medipharm_core::Pharmacy;
    use medipharm_db_memory::MemoryStores;

    fn aggregator_over(stores: &MemoryStores) -> AvailabilityAggregator {
        AvailabilityAggregator::new(stores.inventory_store(), stores.pharmacy_store())
    }

    #[tokio::test]
    async fn resolves_in_stock_entries_to_active_pharmacies() {
        let stores = MemoryStores::new();
        stores.pharmacies.insert(Pharmacy::new(1, "Pharmacie A", 48.85, 2.35));
        stores.pharmacies.insert(Pharmacy::new(2, "Pharmacie B", 48.86, 2.36));
        stores.inventories.insert(InventoryEntry::new(1, 1, 7).with_stock(4, Some(3.2)));
        stores.inventories.insert(InventoryEntry::new(2, 2, 7).with_stock(9, None));

        let entries = aggregator_over(&stores).availability(7).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].pharmacy.id, 1);
        assert_eq!(entries[0].price, Some(3.2));
        assert_eq!(entries[0].quantity, 4);
        // Undefined price stays undefined, never zero-defaulted.
        assert_eq!(entries[1].price, None);
        // Distances are the geo ranker's job.
        assert!(entries.iter().all(|e| e.distance_km.is_none()));
    }

    #[tokio::test]
    async fn drops_entries_for_missing_or_inactive_pharmacies() {
        let stores = MemoryStores::new();
        stores.pharmacies.insert(Pharmacy::new(1, "Open", 48.85, 2.35));
        stores.pharmacies.insert(Pharmacy::new(2, "Closed", 48.86, 2.36).inactive());
        stores.inventories.insert(InventoryEntry::new(1, 1, 7).with_stock(1, None));
        stores.inventories.insert(InventoryEntry::new(2, 2, 7).with_stock(1, None));
        // Pharmacy 3 does not exist at all.
        stores.inventories.insert(InventoryEntry::new(3, 3, 7).with_stock(1, None));

        let entries = aggregator_over(&stores).availability(7).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].pharmacy.name, "Open");
    }

    #[tokio::test]
    async fn no_stock_is_a_valid_empty_result() {
        let stores = MemoryStores::new();
        let entries = aggregator_over(&stores).availability(99).await.unwrap();
        assert!(entries.is_empty());
    }
}
