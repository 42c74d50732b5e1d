//! Run-scoped claim registries
//!
//! Both registries are append-only sets guarded by a single mutex. A claim is a
//! check-and-insert performed inside one critical section, so concurrent
//! callers racing on the same key see exactly one success.

use parking_lot::Mutex;
use std::collections::HashSet;

/// Append-only string set with an atomic claim operation
#[derive(Debug, Default)]
struct ClaimSet {
    keys: Mutex<HashSet<String>>,
}

impl ClaimSet {
    fn try_claim(&self, key: &str) -> bool {
        let mut keys = self.keys.lock();
        if keys.contains(key) {
            return false;
        }
        keys.insert(key.to_string())
    }

    fn contains(&self, key: &str) -> bool {
        self.keys.lock().contains(key)
    }

    fn len(&self) -> usize {
        self.keys.lock().len()
    }
}

/// Set of claim keys already dispatched during one crawl run
///
/// The registry is created per run and handed to every component that needs
/// it, so two runs in the same process never share state. Entries are never
/// removed.
#[derive(Debug, Default)]
pub struct VisitedRegistry {
    inner: ClaimSet,
}

impl VisitedRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the key and returns true the first time it is seen in this run
    ///
    /// Every later call for the same key returns false.
    pub fn try_claim(&self, key: &str) -> bool {
        self.inner.try_claim(key)
    }

    /// Returns true if the key was already claimed
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }

    /// Number of claimed keys
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if nothing was claimed yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Set of parent identifiers that have already been finalized
///
/// This is a backstop against double emission. The aggregator inserts into it
/// while holding its own arena lock, which makes the insert part of the same
/// step as finalization.
#[derive(Debug, Default)]
pub struct CompletionRegistry {
    inner: ClaimSet,
}

impl CompletionRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the identifier as finalized; false if it already was
    pub fn mark_finalized(&self, identifier: &str) -> bool {
        self.inner.try_claim(identifier)
    }

    /// Returns true if the identifier was finalized
    pub fn is_finalized(&self, identifier: &str) -> bool {
        self.inner.contains(identifier)
    }

    /// Number of finalized identifiers
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if no parent was finalized yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_claim_wins() {
        let registry = VisitedRegistry::new();
        assert!(registry.try_claim("https://example.com/"));
        assert!(!registry.try_claim("https://example.com/"));
        assert!(!registry.try_claim("https://example.com/"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_contains_does_not_claim() {
        let registry = VisitedRegistry::new();
        assert!(!registry.contains("https://example.com/a"));
        assert!(registry.is_empty());
        assert!(registry.try_claim("https://example.com/a"));
        assert!(registry.contains("https://example.com/a"));
    }

    #[test]
    fn test_distinct_keys() {
        let registry = VisitedRegistry::new();
        assert!(registry.try_claim("https://example.com/participant/?id=123"));
        assert!(registry.try_claim("https://example.com/participant/?id=456"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_registries_are_independent() {
        let run_a = VisitedRegistry::new();
        let run_b = VisitedRegistry::new();
        assert!(run_a.try_claim("https://example.com/"));
        assert!(run_b.try_claim("https://example.com/"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_claims_single_winner() {
        let registry = Arc::new(VisitedRegistry::new());
        let mut handles = Vec::new();

        for _ in 0..64 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                (0..50)
                    .filter(|i| registry.try_claim(&format!("https://example.com/{}", i)))
                    .count()
            }));
        }

        let mut wins = 0;
        for handle in handles {
            wins += handle.await.unwrap();
        }

        // Each of the 50 URLs was claimed by exactly one caller
        assert_eq!(wins, 50);
        assert_eq!(registry.len(), 50);
    }

    #[test]
    fn test_completion_registry() {
        let completed = CompletionRegistry::new();
        assert!(completed.is_empty());
        assert!(completed.mark_finalized("Expo_https://example.com/e/1"));
        assert!(!completed.mark_finalized("Expo_https://example.com/e/1"));
        assert!(completed.is_finalized("Expo_https://example.com/e/1"));
        assert_eq!(completed.len(), 1);
    }
}
