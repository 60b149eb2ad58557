//! Storage error types.

use thiserror::Error;

/// Errors surfaced by storage backends.
///
/// Missing rows are not errors: read operations return `Ok(None)` or an
/// empty list instead. `NotFound` exists for backends that need to signal
/// a broken internal reference.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage operation timed out: {0}")]
    Timeout(String),

    #[error("corrupted record for {entity} {id}: {message}")]
    Corrupted {
        entity: &'static str,
        id: String,
        message: String,
    },
}

impl StorageError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Whether retrying later could succeed. Transient faults feed the
    /// circuit breaker's failure accounting.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }

    /// Error category for logging/monitoring.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Unavailable(_) | Self::Timeout(_) => ErrorCategory::Transient,
            Self::Corrupted { .. } => ErrorCategory::Corrupted,
        }
    }
}

/// Error categories for monitoring and breaker classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Transient,
    Corrupted,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Transient => write!(f, "transient"),
            Self::Corrupted => write!(f, "corrupted"),
        }
    }
}
