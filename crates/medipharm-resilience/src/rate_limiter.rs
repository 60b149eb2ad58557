//! Token bucket rate limiter.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Rate limiter tuning for one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Maximum burst size in tokens.
    pub capacity: u32,
    /// Steady-state refill rate, tokens per second.
    pub refill_per_sec: f64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            capacity: 50,
            refill_per_sec: 50.0,
        }
    }
}

/// A token bucket. Each admitted call consumes one token; tokens refill
/// continuously up to the configured capacity. An empty bucket rejects
/// immediately, before any work starts.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
    admitted: AtomicU64,
    rejected: AtomicU64,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self {
            capacity: f64::from(config.capacity),
            refill_per_sec: config.refill_per_sec,
            state: Mutex::new(BucketState {
                tokens: f64::from(config.capacity),
                last_refill: Instant::now(),
            }),
            admitted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Tries to take one token. Never blocks.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            self.admitted.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of limiter counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterStats {
    pub admitted: u64,
    pub rejected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn rejects_when_bucket_empty() {
        let bucket = TokenBucket::new(&RateLimiterConfig {
            capacity: 2,
            refill_per_sec: 0.0,
        });

        assert!(bucket.try_acquire());
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());

        let stats = bucket.stats();
        assert_eq!(stats.admitted, 2);
        assert_eq!(stats.rejected, 1);
    }

    #[test]
    fn refills_over_time() {
        let bucket = TokenBucket::new(&RateLimiterConfig {
            capacity: 1,
            refill_per_sec: 100.0,
        });

        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());

        std::thread::sleep(Duration::from_millis(50));
        assert!(bucket.try_acquire());
    }

    #[test]
    fn refill_never_exceeds_capacity() {
        let bucket = TokenBucket::new(&RateLimiterConfig {
            capacity: 2,
            refill_per_sec: 1000.0,
        });

        std::thread::sleep(Duration::from_millis(20));
        assert!(bucket.try_acquire());
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());
    }
}
