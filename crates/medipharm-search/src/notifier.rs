//! Fire-and-forget side effects.
//!
//! Search-count increments and history records are enqueued on a
//! bounded channel drained by a detached worker task. Enqueueing never
//! blocks and never fails the caller: a full queue drops the effect
//! (counted and logged), and a store failure inside the worker is
//! swallowed the same way.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use medipharm_core::{CallerId, MedicationId, SearchHistoryRecord};
use medipharm_storage::{DynHistoryStore, DynMedicationStore};

use crate::config::NotifierConfig;

#[derive(Debug)]
enum SideEffect {
    CountIncrement { medication_id: MedicationId },
    RecordSearch { record: SearchHistoryRecord },
    Flush(oneshot::Sender<()>),
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
}

/// Handle for scheduling side effects decoupled from the request path.
///
/// Cheap to clone; all clones feed the same worker. The worker stops
/// once every handle is dropped and the queue drains.
#[derive(Debug, Clone)]
pub struct SideEffectNotifier {
    tx: mpsc::Sender<SideEffect>,
    counters: Arc<Counters>,
}

impl SideEffectNotifier {
    /// Spawns the worker task and returns the scheduling handle.
    pub fn spawn(
        medications: DynMedicationStore,
        history: DynHistoryStore,
        config: &NotifierConfig,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<SideEffect>(config.queue_capacity.max(1));
        let counters = Arc::new(Counters::default());
        let worker_counters = counters.clone();

        tokio::spawn(async move {
            while let Some(effect) = rx.recv().await {
                match effect {
                    SideEffect::CountIncrement { medication_id } => {
                        if let Err(err) = medications.increment_search_count(medication_id).await {
                            worker_counters.failed.fetch_add(1, Ordering::Relaxed);
                            warn!(medication_id, error = %err, "search-count increment lost");
                        }
                    }
                    SideEffect::RecordSearch { record } => {
                        if let Err(err) = history.append(record).await {
                            worker_counters.failed.fetch_add(1, Ordering::Relaxed);
                            warn!(error = %err, "search history record lost");
                        }
                    }
                    SideEffect::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
            debug!("side-effect worker stopped");
        });

        Self { tx, counters }
    }

    /// Schedules a search-count increment. Never awaited by callers.
    pub fn increment_search_count(&self, medication_id: MedicationId) {
        self.enqueue(SideEffect::CountIncrement { medication_id });
    }

    /// Schedules a history record for a resolved query.
    pub fn record_search(&self, caller_id: Option<CallerId>, query: &str, result_count: u32) {
        self.enqueue(SideEffect::RecordSearch {
            record: SearchHistoryRecord::new(caller_id, query, result_count),
        });
    }

    fn enqueue(&self, effect: SideEffect) {
        match self.tx.try_send(effect) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("side-effect queue full, dropping effect");
            }
        }
    }

    /// Waits until every effect enqueued before this call has been
    /// applied. Used by tests and graceful shutdown, never by the
    /// request path.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(SideEffect::Flush(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
    }

    pub fn stats(&self) -> NotifierStats {
        NotifierStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of notifier counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifierStats {
    pub enqueued: u64,
    pub dropped: u64,
    pub failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use medipharm_core::{DosageForm, Medication};
    use medipharm_db_memory::MemoryStores;
    use medipharm_storage::{HistoryStore, StorageError};

    #[tokio::test]
    async fn applies_effects_after_flush() {
        let stores = MemoryStores::new();
        stores
            .medications
            .insert(Medication::new(1, "Amoxicilline", "amoxicillin", DosageForm::Capsule));

        let notifier = SideEffectNotifier::spawn(
            stores.medication_store(),
            stores.history_store(),
            &NotifierConfig::default(),
        );

        notifier.increment_search_count(1);
        notifier.record_search(Some(42), "amox", 1);
        notifier.record_search(None, "nothing", 0);
        notifier.flush().await;

        assert_eq!(stores.medications.search_count(1), Some(1));
        let records = stores.history.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].caller_id, Some(42));
        assert_eq!(records[1].result_count, 0);
        assert_eq!(notifier.stats().enqueued, 3);
    }

    struct FailingHistoryStore;

    #[async_trait]
    impl HistoryStore for FailingHistoryStore {
        async fn append(&self, _record: SearchHistoryRecord) -> Result<(), StorageError> {
            Err(StorageError::unavailable("history table gone"))
        }
    }

    #[tokio::test]
    async fn store_failures_are_swallowed() {
        let stores = MemoryStores::new();
        let notifier = SideEffectNotifier::spawn(
            stores.medication_store(),
            Arc::new(FailingHistoryStore),
            &NotifierConfig::default(),
        );

        notifier.record_search(None, "amox", 3);
        notifier.flush().await;

        assert_eq!(notifier.stats().failed, 1);
        assert_eq!(notifier.stats().dropped, 0);
    }

    /// History store that parks on a gate so the worker can be held
    /// mid-effect.
    struct GatedHistoryStore {
        gate: Arc<tokio::sync::Semaphore>,
        inner: DynHistoryStore,
    }

    #[async_trait]
    impl HistoryStore for GatedHistoryStore {
        async fn append(&self, record: SearchHistoryRecord) -> Result<(), StorageError> {
            let _permit = self.gate.acquire().await.map_err(|_| {
                StorageError::unavailable("gate closed")
            })?;
            self.inner.append(record).await
        }
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let stores = MemoryStores::new();
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let gated = Arc::new(GatedHistoryStore {
            gate: gate.clone(),
            inner: stores.history_store(),
        });

        let notifier = SideEffectNotifier::spawn(
            stores.medication_store(),
            gated,
            &NotifierConfig { queue_capacity: 1 },
        );

        // First effect is picked up by the worker and parks on the gate.
        notifier.record_search(None, "first", 0);
        tokio::task::yield_now().await;

        // Fill the single queue slot, then overflow it.
        notifier.record_search(None, "second", 0);
        notifier.record_search(None, "third", 0);

        assert!(notifier.stats().dropped >= 1);

        gate.add_permits(10);
        notifier.flush().await;
        let recorded = stores.history.records().await.len();
        assert!(recorded < 3, "dropped effects must not be applied");
    }
}
