use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per key, created on first use.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Released when the guard drops.
    pub async fn acquire(&self, key: Uuid) -> OwnedMutexGuard<()> {
        // The map shard guard must be gone before awaiting
        let lock = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop entries nobody holds or waits on. Returns how many were dropped.
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.locks.len())
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Lock maps shared by every service that touches seats or balances.
/// Always lock the train before the user.
#[derive(Debug, Default)]
pub struct BookingLocks {
    pub trains: KeyedLocks,
    pub users: KeyedLocks,
}

impl BookingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries are created for every train and user touched, so long-running
    /// processes call this periodically.
    pub fn prune(&self) -> usize {
        self.trains.prune() + self.users.prune()
    }

    pub fn len(&self) -> usize {
        self.trains.len() + self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trains.is_empty() && self.users.is_empty()
    }
}
