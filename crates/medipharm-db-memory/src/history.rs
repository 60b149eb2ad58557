//! In-memory append-only search history.

use async_trait::async_trait;
use tokio::sync::RwLock;

use medipharm_core::SearchHistoryRecord;
use medipharm_storage::{HistoryStore, StorageError};

/// In-memory history store. Records are only ever appended; reads exist
/// for assertions and admin tooling.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    records: RwLock<Vec<SearchHistoryRecord>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records, oldest first.
    pub async fn records(&self) -> Vec<SearchHistoryRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, record: SearchHistoryRecord) -> Result<(), StorageError> {
        self.records.write().await.push(record);
        Ok(())
    }
}
