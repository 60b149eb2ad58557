//! Concurrency bulkhead with a bounded wait queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bulkhead tuning for one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkheadConfig {
    /// Maximum concurrent in-flight executions.
    pub max_concurrent: usize,
    /// Maximum callers allowed to wait for a slot before rejection.
    pub max_queued: usize,
}

impl Default for BulkheadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 25,
            max_queued: 25,
        }
    }
}

/// Rejection signal when both the in-flight slots and the wait queue are
/// exhausted.
#[derive(Debug, Error)]
#[error("bulkhead queue full")]
pub struct BulkheadFull;

/// Caps concurrent executions of one operation so a slow downstream
/// cannot absorb every runtime worker. Excess callers queue up to
/// `max_queued`, beyond which they are rejected immediately.
#[derive(Debug)]
pub struct Bulkhead {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    max_queued: usize,
    queued: AtomicUsize,
    rejected: AtomicU64,
}

impl Bulkhead {
    pub fn new(config: &BulkheadConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            max_concurrent: config.max_concurrent,
            max_queued: config.max_queued,
            queued: AtomicUsize::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Acquires an execution slot, waiting in the bounded queue when all
    /// slots are taken. The slot is released when the returned permit
    /// drops.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, BulkheadFull> {
        if let Ok(permit) = self.semaphore.clone().try_acquire_owned() {
            return Ok(permit);
        }

        if self.queued.load(Ordering::Acquire) >= self.max_queued {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(BulkheadFull);
        }

        self.queued.fetch_add(1, Ordering::AcqRel);
        let _queue_slot = QueueSlot(&self.queued);
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| BulkheadFull)
    }

    /// Executions currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.max_concurrent - self.semaphore.available_permits()
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

/// Decrements the queue counter when a waiter leaves the queue, whether
/// it got a permit or was cancelled.
struct QueueSlot<'a>(&'a AtomicUsize);

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
