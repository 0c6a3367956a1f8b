//! # Stock Locks
//!
//! In-process mutual exclusion per product.
//!
//! ```text
//! Sale A: [laptop, mouse]      Sale B: [mouse, cable]      Sale C: [desk]
//!        │                            │                          │
//!        ▼                            ▼                          ▼
//!   lock laptop                  lock cable                 lock desk
//!   lock mouse ◄──── waits ──── lock mouse                 (runs in parallel)
//! ```
//!
//! Locks are always taken in sorted product-id order, so two sales sharing
//! several products can never wait on each other in a cycle. The database
//! transaction and the conditional stock update remain the authority; these
//! locks only stop same-process writers from racing into SQLite's busy
//! handler.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Entries beyond this count trigger a sweep of unused locks.
const PRUNE_THRESHOLD: usize = 1024;

/// Map of product id to its mutex, shared by every ledger of one database.
#[derive(Debug, Clone, Default)]
pub struct StockLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

/// Guards held for the duration of one ledger operation. Dropping releases
/// every product lock.
#[derive(Debug)]
pub struct StockGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
    product_ids: Vec<String>,
}

impl StockGuard {
    /// Product ids covered, sorted and unique.
    pub fn product_ids(&self) -> &[String] {
        &self.product_ids
    }
}

impl StockLocks {
    pub fn new() -> Self {
        StockLocks::default()
    }

    /// Acquires the lock of every distinct product id, in sorted order.
    pub async fn acquire<I, S>(&self, product_ids: I) -> StockGuard
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ordered: BTreeSet<String> = product_ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .collect();

        let handles: Vec<Arc<Mutex<()>>> = {
            let mut map = self.inner.lock().await;
            if map.len() > PRUNE_THRESHOLD {
                // Only the map itself holds an unused lock.
                map.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            ordered
                .iter()
                .map(|id| {
                    Arc::clone(
                        map.entry(id.clone())
                            .or_insert_with(|| Arc::new(Mutex::new(()))),
                    )
                })
                .collect()
        };

        let mut guards = Vec::with_capacity(handles.len());
        for handle in handles {
            guards.push(handle.lock_owned().await);
        }

        StockGuard {
            _guards: guards,
            product_ids: ordered.into_iter().collect(),
        }
    }

    /// Number of tracked product locks.
    pub async fn tracked(&self) -> usize {
        self.inner.lock().await.len()
    }
}
