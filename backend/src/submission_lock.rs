//! Serializes submissions that target the same published template and dependency.
//!
//! Two uploads for the same `(published template, dependency)` pair would
//! otherwise both validate against the same revision and race on the write;
//! the store would refuse the loser with a revision mismatch. Holding the
//! pair's lock across validate-and-persist makes that the exception (another
//! dependency writing to the same template) rather than the rule.
//!
//! `SubmissionLocks` is injected into the Actix application state in `main.rs`.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

type Key = (String, String);

#[derive(Clone, Default)]
pub struct SubmissionLocks {
    locks: Arc<RwLock<HashMap<Key, Arc<Mutex<()>>>>>,
}

impl SubmissionLocks {
    /// Waits for the pair's lock. It is released when the guard is dropped.
    pub async fn acquire(&self, published_id: &str, dependency: &str) -> OwnedMutexGuard<()> {
        let key = (published_id.to_string(), dependency.to_string());
        let existing = self.locks.read().await.get(&key).cloned();
        let lock = match existing {
            Some(lock) => lock,
            None => {
                let mut locks = self.locks.write().await;
                // Drop entries nobody holds or waits on.
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
                locks.entry(key).or_default().clone()
            }
        };
        lock.lock_owned().await
    }

    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }
}
