//! Engine-level errors.
//!
//! Only two outcomes are surfaced as errors: an invalid query (rejected
//! before the pipeline runs) and an overload rejection. Degraded
//! outcomes — open circuit, timeout, downstream fault — return the
//! empty fallback instead and are intentionally indistinguishable from
//! "no matches".

use thiserror::Error;

use medipharm_core::CoreError;

/// Caller-visible search failures.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] CoreError),

    #[error("too many requests: {0}")]
    Overloaded(RejectReason),
}

/// Which admission control rejected the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    RateLimited,
    ConcurrencyLimit,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate limit exceeded"),
            Self::ConcurrencyLimit => write!(f, "concurrency limit exceeded"),
        }
    }
}
