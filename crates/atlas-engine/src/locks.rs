//! # Per-Key Lock Registry
//!
//! Serializes read-modify-write sequences on shared records.
//!
//! ## Why Per-Key?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    The Lost-Update Race                                 │
//! │                                                                         │
//! │  Without serialization, two concurrent sales of the same product:      │
//! │                                                                         │
//! │  Request A: read stock=10 ──► write stock=7  (sold 3)                   │
//! │  Request B:    read stock=10 ──► write stock=8  (sold 2)  ❌            │
//! │                                                                         │
//! │  Final stock: 8. Five units left the shelf, two left the books.         │
//! │                                                                         │
//! │  With per-key locks:                                                    │
//! │  Request A: lock(product:p1) read 10 ──► write 7 ──► unlock             │
//! │  Request B:            lock(product:p1) read 7 ──► write 5 ──► unlock   │
//! │                                                                         │
//! │  Concurrent operations on DIFFERENT keys proceed fully in parallel;     │
//! │  a global lock would serialize unrelated sales.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Multi-Key Ordering
//! Operations touching several keys (multi-line sale, order shipment)
//! acquire their locks in sorted key order. Two such operations always
//! contend in the same sequence, so they cannot deadlock.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-key async mutexes.
///
/// Lock handles are created lazily on first use and kept for the process
/// lifetime; the set of keys is bounded by the catalog/order population.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        KeyLocks::default()
    }

    /// Returns the shared mutex for `key`, creating it if needed.
    fn handle(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquires the lock for a single key.
    ///
    /// The guard is owned so it can be held across `.await` points for the
    /// duration of the read-modify-write.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        self.handle(key).lock_owned().await
    }

    /// Acquires locks for several keys, deduplicated and in sorted order.
    ///
    /// Sorted acquisition is the deadlock-avoidance discipline: every
    /// multi-key caller contends in the same global order.
    pub async fn lock_many<I, S>(&self, keys: I) -> Vec<OwnedMutexGuard<()>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sorted: Vec<String> = keys.into_iter().map(Into::into).collect();
        sorted.sort();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for key in &sorted {
            guards.push(self.handle(key).lock_owned().await);
        }
        guards
    }

    /// Number of registered keys (for diagnostics).
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// True when no keys are registered.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[tokio::test]
    async fn test_same_key_serializes() {
        let locks = Arc::new(KeyLocks::new());
        let counter = Arc::new(AtomicI64::new(0));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let locks = locks.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock("product:p1").await;
                // Read-modify-write with an await in the middle; without the
                // lock this loses updates
                let read = counter.load(Ordering::SeqCst);
                tokio::task::yield_now().await;
                counter.store(read + 1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 32);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyLocks::new();

        let _a = locks.lock("product:a").await;
        // Would deadlock here if keys shared a lock
        let _b = locks.lock("product:b").await;
    }

    #[tokio::test]
    async fn test_lock_many_dedupes() {
        let locks = KeyLocks::new();

        let guards = locks
            .lock_many(["product:b", "product:a", "product:b"])
            .await;
        assert_eq!(guards.len(), 2);
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_lock_many_opposite_orders_no_deadlock() {
        let locks = Arc::new(KeyLocks::new());

        let l1 = locks.clone();
        let first = tokio::spawn(async move {
            for _ in 0..50 {
                let _g = l1.lock_many(["product:a", "product:b"]).await;
            }
        });

        let l2 = locks.clone();
        let second = tokio::spawn(async move {
            for _ in 0..50 {
                // Reversed input order; sorted acquisition makes it safe
                let _g = l2.lock_many(["product:b", "product:a"]).await;
            }
        });

        first.await.unwrap();
        second.await.unwrap();
    }
}
