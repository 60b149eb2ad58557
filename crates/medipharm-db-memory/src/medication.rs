//! In-memory medication catalog.

use async_trait::async_trait;
use dashmap::DashMap;

use medipharm_core::text::trigram_similarity;
use medipharm_core::{Medication, MedicationId};
use medipharm_storage::{MedicationStore, StorageError};

/// Similarity score above which a candidate matches even without a
/// substring hit. Mirrors the threshold the SQL backend applies.
const SIMILARITY_THRESHOLD: f64 = 0.3;

/// In-memory medication store over a lock-free concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryMedicationStore {
    data: DashMap<MedicationId, Medication>,
}

impl InMemoryMedicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a catalog entry.
    pub fn insert(&self, medication: Medication) {
        self.data.insert(medication.id, medication);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current search-count of a medication, for assertions in tests and
    /// admin tooling.
    pub fn search_count(&self, id: MedicationId) -> Option<u64> {
        self.data.get(&id).map(|m| m.search_count)
    }
}

/// Strips the SQL-LIKE `%` wildcards off a substring pattern.
fn pattern_needle(pattern: &str) -> &str {
    pattern.trim_matches('%')
}

#[async_trait]
impl MedicationStore for InMemoryMedicationStore {
    async fn find_active_by_text_similarity(
        &self,
        pattern: &str,
        query_lower: &str,
    ) -> Result<Vec<Medication>, StorageError> {
        let needle = pattern_needle(pattern);
        let mut matches: Vec<Medication> = self
            .data
            .iter()
            .filter(|entry| {
                let m = entry.value();
                m.is_active
                    && (m.name_lowercase.contains(needle)
                        || m.dci_lowercase.contains(needle)
                        || trigram_similarity(&m.name_lowercase, query_lower)
                            > SIMILARITY_THRESHOLD
                        || trigram_similarity(&m.dci_lowercase, query_lower)
                            > SIMILARITY_THRESHOLD)
            })
            .map(|entry| entry.value().clone())
            .collect();
        // Deterministic backend order; callers apply their own ranking.
        matches.sort_by_key(|m| m.id);
        Ok(matches)
    }

    async fn find_by_id(&self, id: MedicationId) -> Result<Option<Medication>, StorageError> {
        Ok(self.data.get(&id).map(|m| m.clone()))
    }

    async fn increment_search_count(&self, id: MedicationId) -> Result<(), StorageError> {
        if let Some(mut m) = self.data.get_mut(&id) {
            m.search_count += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medipharm_core::DosageForm;

    fn store_with(meds: Vec<Medication>) -> InMemoryMedicationStore {
        let store = InMemoryMedicationStore::new();
        for m in meds {
            store.insert(m);
        }
        store
    }

    #[tokio::test]
    async fn substring_match_on_name_and_dci() {
        let store = store_with(vec![
            Medication::new(1, "Amoxicilline", "amoxicillin", DosageForm::Capsule),
            Medication::new(2, "Doliprane", "paracetamol", DosageForm::Tablet),
        ]);

        let by_name = store
            .find_active_by_text_similarity("%amox%", "amox")
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, 1);

        let by_dci = store
            .find_active_by_text_similarity("%paraceta%", "paraceta")
            .await
            .unwrap();
        assert_eq!(by_dci.len(), 1);
        assert_eq!(by_dci[0].id, 2);
    }

    #[tokio::test]
    async fn similarity_match_catches_typos() {
        let store = store_with(vec![Medication::new(
            1,
            "Amoxicilline",
            "amoxicillin",
            DosageForm::Capsule,
        )]);

        // No substring hit, but one edit away from the stored name.
        let found = store
            .find_active_by_text_similarity("%amoxicillina%", "amoxicillina")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn inactive_medications_are_excluded() {
        let store = store_with(vec![
            Medication::new(1, "Amoxicilline", "amoxicillin", DosageForm::Capsule).inactive(),
        ]);
        let found = store
            .find_active_by_text_similarity("%amox%", "amox")
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn increment_is_monotonic_and_tolerates_unknown_ids() {
        let store = store_with(vec![Medication::new(
            1,
            "Aspirine",
            "acetylsalicylic acid",
            DosageForm::Tablet,
        )]);

        store.increment_search_count(1).await.unwrap();
        store.increment_search_count(1).await.unwrap();
        assert_eq!(store.search_count(1), Some(2));

        // Unknown id is a no-op, not an error.
        store.increment_search_count(999).await.unwrap();
        assert_eq!(store.search_count(999), None);
    }

    #[tokio::test]
    async fn find_by_id_returns_none_when_absent() {
        let store = InMemoryMedicationStore::new();
        assert!(store.find_by_id(5).await.unwrap().is_none());
    }
}
