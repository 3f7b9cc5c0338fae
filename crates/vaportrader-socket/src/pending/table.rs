use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant};

use vaportrader_core::error::{Result, VaporError};
use vaportrader_core::protocol::Acknowledgment;

/// One in-flight confirmed send.
struct PendingSend {
    created_at: Instant,
    tx: oneshot::Sender<Acknowledgment>,
}

/// Pending sends keyed by temp id.
///
/// Invariant: at most one live entry per temp id; an entry leaves the table
/// exactly once (resolved, expired, or cancelled).
#[derive(Default)]
pub struct PendingTable {
    entries: DashMap<String, PendingSend>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Track a new send. Fails if `temp_id` is already live.
    pub fn register(&self, temp_id: &str) -> Result<oneshot::Receiver<Acknowledgment>> {
        match self.entries.entry(temp_id.to_string()) {
            Entry::Occupied(_) => Err(VaporError::BadRequest(format!(
                "temp_id already pending: {temp_id}"
            ))),
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                slot.insert(PendingSend {
                    created_at: Instant::now(),
                    tx,
                });
                tracing::trace!(temp_id, "registered pending send");
                Ok(rx)
            }
        }
    }

    /// Deliver `ack` to its waiter. Returns false when the temp id is unknown
    /// or already resolved (late acknowledgment after a sweep).
    pub fn resolve(&self, ack: Acknowledgment) -> bool {
        let Some((_, pending)) = self.entries.remove(&ack.temp_id) else {
            return false;
        };
        tracing::debug!(
            temp_id = %ack.temp_id,
            success = ack.success,
            waited_ms = pending.created_at.elapsed().as_millis() as u64,
            "pending send resolved"
        );
        // The caller may have been dropped; the entry is gone either way.
        let _ = pending.tx.send(ack);
        true
    }

    /// Drop an entry without resolving it (the frame never made it into the queue).
    pub fn cancel(&self, temp_id: &str) -> bool {
        self.entries.remove(temp_id).is_some()
    }

    /// Resolve every entry older than `ttl` with a negative acknowledgment.
    /// Returns how many were expired by this call.
    pub fn sweep_expired(&self, now: Instant, ttl: Duration) -> usize {
        // Collect first: removing while iterating would deadlock on the shard lock.
        let stale: Vec<String> = self
            .entries
            .iter()
            .filter(|e| now.saturating_duration_since(e.value().created_at) >= ttl)
            .map(|e| e.key().clone())
            .collect();

        let mut expired = 0;
        for temp_id in stale {
            // Re-check under the removal lock; the dispatcher may have won meanwhile.
            let removed = self.entries.remove_if(&temp_id, |_, p| {
                now.saturating_duration_since(p.created_at) >= ttl
            });
            if let Some((temp_id, pending)) = removed {
                tracing::debug!(%temp_id, "pending send timed out");
                let _ = pending.tx.send(Acknowledgment::failed(temp_id));
                expired += 1;
            }
        }
        expired
    }

    /// Fail every live entry. Used on shutdown, when the sweeper is gone.
    pub fn fail_all(&self) -> usize {
        let live: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        live.into_iter()
            .filter_map(|temp_id| self.entries.remove(&temp_id))
            .map(|(temp_id, pending)| {
                let _ = pending.tx.send(Acknowledgment::failed(temp_id));
            })
            .count()
    }

    pub fn is_pending(&self, temp_id: &str) -> bool {
        self.entries.contains_key(temp_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ack(temp_id: &str) -> Acknowledgment {
        Acknowledgment {
            temp_id: temp_id.into(),
            success: true,
            message: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_temp_id_is_rejected_while_live() {
        let table = PendingTable::new();
        let _rx = table.register("abc123").unwrap();
        let err = table.register("abc123").unwrap_err();
        assert_eq!(err.code().as_str(), "BAD_REQUEST");

        assert!(table.resolve(ack("abc123")));
        // Free again once resolved.
        let _rx = table.register("abc123").unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn resolve_wins_then_sweep_is_noop() {
        let table = PendingTable::new();
        let rx = table.register("abc123").unwrap();

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(table.resolve(ack("abc123")));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(table.sweep_expired(Instant::now(), Duration::from_secs(5)), 0);

        let got = rx.await.unwrap();
        assert!(got.success);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_wins_then_late_ack_is_dropped() {
        let table = PendingTable::new();
        let rx = table.register("abc123").unwrap();

        tokio::time::advance(Duration::from_millis(4999)).await;
        assert_eq!(table.sweep_expired(Instant::now(), Duration::from_secs(5)), 0);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(table.sweep_expired(Instant::now(), Duration::from_secs(5)), 1);
        assert!(!table.resolve(ack("abc123")));
        assert_eq!(table.sweep_expired(Instant::now(), Duration::from_secs(5)), 0);

        let got = rx.await.unwrap();
        assert_eq!(got, Acknowledgment::failed("abc123"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_the_waiter() {
        let table = PendingTable::new();
        let rx = table.register("gone").unwrap();
        assert!(table.cancel("gone"));
        assert!(!table.cancel("gone"));
        assert!(rx.await.is_err());
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn fail_all_resolves_everyone_negatively() {
        let table = PendingTable::new();
        let a = table.register("a").unwrap();
        let b = table.register("b").unwrap();

        assert_eq!(table.fail_all(), 2);
        assert_eq!(table.fail_all(), 0);
        assert!(!a.await.unwrap().success);
        assert_eq!(b.await.unwrap(), Acknowledgment::failed("b"));
    }
}
