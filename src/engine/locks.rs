use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Exclusive per-row locks. Holding the guard for an id serializes every
/// check-then-act sequence on that row.
#[derive(Default)]
pub struct LockTable {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl LockTable {
    pub async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        lock.lock_owned().await
    }

    /// Forget the lock of a deleted row. Callers must hold its guard.
    pub fn forget(&self, id: &Uuid) {
        self.locks.remove(id);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
