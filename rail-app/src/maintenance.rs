use std::sync::Arc;
use std::time::Duration;

use rail_booking::BookingLocks;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Periodically drop lock entries for trains and users nobody is working on.
pub fn spawn_lock_pruner(locks: Arc<BookingLocks>, period: Duration) -> JoinHandle<()> {
    // A zero period would make `interval` panic
    let period = period.max(Duration::from_millis(1));
    info!(?period, "Lock pruner started");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let pruned = locks.prune();
            debug!(pruned, remaining = locks.len(), "Idle locks pruned");
        }
    })
}
