//! Registry of per-operation guards.
//!
//! Guard state (breaker tallies, limiter buckets) must be shared by every
//! caller of the same logical operation, so guards are created once,
//! registered by name, and handed out as `Arc`s. Lock-free lookups via
//! DashMap; registration is explicit and there is no implicit reset.

use std::sync::Arc;

use dashmap::DashMap;

use crate::guard::{GuardConfig, OperationGuard};

/// Process-wide registry of named [`OperationGuard`]s.
#[derive(Debug, Default)]
pub struct GuardRegistry {
    guards: DashMap<String, Arc<OperationGuard>>,
}

impl GuardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the guard registered under `name`, creating it with
    /// `config` on first use. The config of an already-registered guard
    /// is left untouched.
    pub fn register(&self, name: &str, config: &GuardConfig) -> Arc<OperationGuard> {
        self.guards
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(OperationGuard::new(name, config)))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<OperationGuard>> {
        self.guards.get(name).map(|g| g.clone())
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent() {
        let registry = GuardRegistry::new();
        let a = registry.register("search", &GuardConfig::default());
        let b = registry.register("search", &GuardConfig::default());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn independent_state_per_operation() {
        let registry = GuardRegistry::new();
        let search = registry.register("search", &GuardConfig::default());
        let availability = registry.register("availability-lookup", &GuardConfig::default());

        search.breaker().force_open();
        assert!(search.breaker().try_acquire().is_err());
        assert!(availability.breaker().try_acquire().is_ok());
    }

    #[test]
    fn get_unknown_returns_none() {
        let registry = GuardRegistry::new();
        assert!(registry.get("nope").is_none());
    }
}
