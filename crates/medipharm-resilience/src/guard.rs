//! Per-operation composition of the resilience primitives.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::bulkhead::{Bulkhead, BulkheadConfig};
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::rate_limiter::{RateLimiterConfig, TokenBucket};

/// Full guard tuning for one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    pub rate_limiter: RateLimiterConfig,
    pub bulkhead: BulkheadConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    /// Wall-clock bound on one guarded execution.
    pub timeout: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            rate_limiter: RateLimiterConfig::default(),
            bulkhead: BulkheadConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Why a guarded execution did not produce a value.
///
/// `RateLimited` and `QueueFull` are overload rejections raised before
/// any work starts. `CircuitOpen`, `Timeout` and `Failed` are degraded
/// outcomes; callers usually map them to a safe fallback.
#[derive(Debug, Error)]
pub enum GuardError<E> {
    #[error("rate limit exceeded")]
    RateLimited,

    #[error("concurrency limit exceeded")]
    QueueFull,

    #[error("circuit breaker is open")]
    CircuitOpen,

    #[error("operation timed out")]
    Timeout,

    #[error("operation failed: {0}")]
    Failed(E),
}

impl<E> GuardError<E> {
    /// Overload rejections are surfaced to the caller as-is rather than
    /// degraded to the fallback.
    pub fn is_overload(&self) -> bool {
        matches!(self, Self::RateLimited | Self::QueueFull)
    }
}

/// Rate limiter, bulkhead, circuit breaker and timeout wrapped around
/// one named operation.
#[derive(Debug)]
pub struct OperationGuard {
    name: String,
    limiter: TokenBucket,
    bulkhead: Bulkhead,
    breaker: CircuitBreaker,
    timeout: Duration,
}

impl OperationGuard {
    pub fn new(name: impl Into<String>, config: &GuardConfig) -> Self {
        Self {
            name: name.into(),
            limiter: TokenBucket::new(&config.rate_limiter),
            bulkhead: Bulkhead::new(&config.bulkhead),
            breaker: CircuitBreaker::new(&config.circuit_breaker),
            timeout: config.timeout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn limiter(&self) -> &TokenBucket {
        &self.limiter
    }

    pub fn bulkhead(&self) -> &Bulkhead {
        &self.bulkhead
    }

    /// Runs one execution under the full guard stack.
    ///
    /// Admission order: rate limiter, then bulkhead, then breaker. A
    /// rejected call does no work and records no breaker outcome. A
    /// timeout drops the future, abandoning its in-flight awaits, and
    /// counts as a breaker failure.
    pub async fn run<T, E, F>(&self, fut: F) -> Result<T, GuardError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        if !self.limiter.try_acquire() {
            warn!(operation = %self.name, "rate limit exceeded");
            return Err(GuardError::RateLimited);
        }

        let _slot = self.bulkhead.acquire().await.map_err(|_| {
            warn!(operation = %self.name, "bulkhead queue full");
            GuardError::QueueFull
        })?;

        self.breaker.try_acquire().map_err(|_| GuardError::CircuitOpen)?;

        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => {
                self.breaker.record_success();
                Ok(value)
            }
            Ok(Err(err)) => {
                self.breaker.record_failure();
                Err(GuardError::Failed(err))
            }
            Err(_) => {
                self.breaker.record_failure();
                warn!(
                    operation = %self.name,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "guarded operation timed out"
                );
                Err(GuardError::Timeout)
            }
        }
    }
}
