use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::registry::HoldRegistry;

/// Periodic expiry of stale holds: an explicit repeating task, cancellable
/// at shutdown.
pub struct HoldSweeper {
    registry: Arc<HoldRegistry>,
    period: Duration,
}

impl HoldSweeper {
    pub fn new(registry: Arc<HoldRegistry>, period: Duration) -> Self {
        Self { registry, period }
    }

    pub fn spawn(self) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tracing::trace!("running seat lock cleanup");
                        match self.registry.expire_locks().await {
                            Ok(0) => {}
                            Ok(count) => tracing::debug!(count, "swept expired seat locks"),
                            Err(err) => tracing::error!(%err, "seat lock sweep failed"),
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        });
        SweeperHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stops the loop and waits for the task to wind down.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::{SeatMapPublisher, SeatMapUpdate};
    use chrono::{Duration as ChronoDuration, Utc};
    use marquee_catalog::seed::demo_catalog;
    use marquee_core::repository::HoldStore;
    use marquee_core::Requester;
    use marquee_store::{InMemoryBookingStore, InMemoryHoldStore};

    struct NullPublisher;

    impl SeatMapPublisher for NullPublisher {
        fn publish(&self, _update: SeatMapUpdate) {}
    }

    #[tokio::test]
    async fn sweeper_expires_holds_and_shuts_down() {
        let demo = demo_catalog();
        let holds = Arc::new(InMemoryHoldStore::new());
        let bookings = Arc::new(InMemoryBookingStore::new());
        let registry = Arc::new(HoldRegistry::new(
            demo.catalog.clone(),
            holds.clone(),
            bookings,
            Arc::new(NullPublisher),
            10,
        ));

        let now = Utc::now();
        holds
            .acquire(
                demo.screening_id,
                demo.seat_ids[0],
                &Requester::anonymous("s1"),
                now - ChronoDuration::seconds(1),
                now - ChronoDuration::minutes(10),
            )
            .await
            .unwrap();

        let handle = HoldSweeper::new(registry, Duration::from_millis(10)).spawn();
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.shutdown().await;

        assert!(holds
            .find_active(demo.screening_id, demo.seat_ids[0], now)
            .await
            .unwrap()
            .is_none());
    }
}
