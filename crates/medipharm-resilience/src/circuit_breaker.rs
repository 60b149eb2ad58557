//! Circuit breaker state machine.
//!
//! CLOSED tallies outcomes in a rolling window and trips to OPEN when the
//! failure rate over a minimum call count crosses the threshold. OPEN
//! short-circuits every call until the cooldown elapses, then HALF_OPEN
//! admits a bounded number of trial calls: all succeeding closes the
//! circuit, any failing reopens it.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Breaker tuning for one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Failure rate in `[0.0, 1.0]` at which the circuit trips.
    pub failure_rate_threshold: f64,
    /// Minimum calls in the window before the rate is evaluated.
    pub min_calls: u32,
    /// Length of the rolling tally window.
    pub window: Duration,
    /// Time the circuit stays open before admitting trial calls.
    pub cooldown: Duration,
    /// Trial calls admitted while half-open.
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 0.5,
            min_calls: 10,
            window: Duration::from_secs(60),
            cooldown: Duration::from_secs(30),
            half_open_max_calls: 3,
        }
    }
}

/// The three breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Rejection signal while the circuit is open.
#[derive(Debug, Error)]
#[error("circuit breaker is open")]
pub struct CircuitOpen;

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    window_start: Instant,
    successes: u32,
    failures: u32,
    opened_at: Instant,
    half_open_in_flight: u32,
    half_open_successes: u32,
}

/// Per-operation circuit breaker. Call [`try_acquire`](Self::try_acquire)
/// before executing and record the outcome afterwards; a short-circuited
/// call must not record anything.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
    total_successes: AtomicU64,
    total_failures: AtomicU64,
    short_circuited: AtomicU64,
}

impl CircuitBreaker {
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        let now = Instant::now();
        Self {
            config: config.clone(),
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                window_start: now,
                successes: 0,
                failures: 0,
                opened_at: now,
                half_open_in_flight: 0,
                half_open_successes: 0,
            }),
            total_successes: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            short_circuited: AtomicU64::new(0),
        }
    }

    /// Asks for permission to execute one call.
    pub fn try_acquire(&self) -> Result<(), CircuitOpen> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                Self::roll_window(&mut inner, self.config.window);
                Ok(())
            }
            CircuitState::Open => {
                if inner.opened_at.elapsed() >= self.config.cooldown {
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_in_flight = 1;
                    inner.half_open_successes = 0;
                    Ok(())
                } else {
                    self.short_circuited.fetch_add(1, Ordering::Relaxed);
                    Err(CircuitOpen)
                }
            }
            CircuitState::HalfOpen => {
                if inner.half_open_in_flight < self.config.half_open_max_calls {
                    inner.half_open_in_flight += 1;
                    Ok(())
                } else {
                    self.short_circuited.fetch_add(1, Ordering::Relaxed);
                    Err(CircuitOpen)
                }
            }
        }
    }

    /// Records a successful call.
    pub fn record_success(&self) {
        self.total_successes.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                Self::roll_window(&mut inner, self.config.window);
                inner.successes += 1;
            }
            CircuitState::HalfOpen => {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.config.half_open_max_calls {
                    inner.state = CircuitState::Closed;
                    inner.window_start = Instant::now();
                    inner.successes = 0;
                    inner.failures = 0;
                }
            }
            // Late completion from before a forced transition.
            CircuitState::Open => {}
        }
    }

    /// Records a failed call (downstream fault or timeout).
    pub fn record_failure(&self) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                Self::roll_window(&mut inner, self.config.window);
                inner.failures += 1;
                let total = inner.successes + inner.failures;
                if total >= self.config.min_calls {
                    let rate = f64::from(inner.failures) / f64::from(total);
                    if rate >= self.config.failure_rate_threshold {
                        Self::trip(&mut inner);
                    }
                }
            }
            CircuitState::HalfOpen => {
                Self::trip(&mut inner);
            }
            CircuitState::Open => {}
        }
    }

    /// Forces the circuit open. Admits nothing until the cooldown
    /// elapses; used by operational tooling.
    pub fn force_open(&self) {
        let mut inner = self.lock();
        Self::trip(&mut inner);
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let inner = self.lock();
        CircuitBreakerSnapshot {
            state: inner.state,
            window_successes: inner.successes,
            window_failures: inner.failures,
            total_successes: self.total_successes.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
            short_circuited: self.short_circuited.load(Ordering::Relaxed),
        }
    }

    fn trip(inner: &mut Inner) {
        if inner.state != CircuitState::Open {
            warn!(state = ?inner.state, "circuit breaker tripped open");
        }
        inner.state = CircuitState::Open;
        inner.opened_at = Instant::now();
    }

    /// Resets the tally when the window has elapsed.
    fn roll_window(inner: &mut Inner, window: Duration) {
        if inner.window_start.elapsed() >= window {
            inner.window_start = Instant::now();
            inner.successes = 0;
            inner.failures = 0;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A point-in-time snapshot of breaker state and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerSnapshot {
    pub state: CircuitState,
    pub window_successes: u32,
    pub window_failures: u32,
    pub total_successes: u64,
    pub total_failures: u64,
    pub short_circuited: u64,
}
