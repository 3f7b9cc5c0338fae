use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};

use crate::pending::PendingTable;

/// Background loop failing confirmed sends older than `ttl`, checked every `every`.
///
/// Independent of the connection: a reconnect does not reset anyone's clock.
pub fn spawn_sweeper(
    table: Arc<PendingTable>,
    ttl: Duration,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if *shutdown.borrow_and_update() {
            return;
        }
        let mut tick = tokio::time::interval(every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let expired = table.sweep_expired(Instant::now(), ttl);
                    if expired > 0 {
                        tracing::info!(expired, remaining = table.len(), "confirmed sends timed out");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        tracing::debug!("sweeper stopped");
    })
}
