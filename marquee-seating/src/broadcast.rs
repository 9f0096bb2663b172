use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::seatmap::SeatStatusView;

/// Full-snapshot seat-map push. Consumers re-render the latest snapshot
/// they receive, so at-least-once delivery is enough and no acknowledgement
/// flows back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatMapUpdate {
    pub screening_id: Uuid,
    pub seats: Vec<SeatStatusView>,
}

pub trait SeatMapPublisher: Send + Sync {
    fn publish(&self, update: SeatMapUpdate);
}

/// Fans snapshots out over a tokio broadcast channel; the API layer bridges
/// subscribers onto SSE.
pub struct ChannelPublisher {
    tx: broadcast::Sender<SeatMapUpdate>,
}

impl ChannelPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SeatMapUpdate> {
        self.tx.subscribe()
    }

    pub fn sender(&self) -> broadcast::Sender<SeatMapUpdate> {
        self.tx.clone()
    }
}

impl SeatMapPublisher for ChannelPublisher {
    fn publish(&self, update: SeatMapUpdate) {
        // A snapshot nobody is watching can be dropped.
        let _ = self.tx.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_published_snapshots() {
        let publisher = ChannelPublisher::new(8);
        let mut rx = publisher.subscribe();
        let screening_id = Uuid::new_v4();

        publisher.publish(SeatMapUpdate {
            screening_id,
            seats: Vec::new(),
        });

        let update = rx.recv().await.unwrap();
        assert_eq!(update.screening_id, screening_id);
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let publisher = ChannelPublisher::new(8);
        publisher.publish(SeatMapUpdate {
            screening_id: Uuid::new_v4(),
            seats: Vec::new(),
        });
    }
}
