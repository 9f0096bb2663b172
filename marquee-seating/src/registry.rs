use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use marquee_catalog::{CatalogDirectory, Screening, Seat};
use marquee_core::booking::SeatStatus;
use marquee_core::hold::SeatHold;
use marquee_core::repository::{BookingRepository, HoldAcquire, HoldRelease, HoldStore};
use marquee_core::{CoreError, CoreResult, Requester};

use crate::broadcast::{SeatMapPublisher, SeatMapUpdate};
use crate::seatmap::{seat_status_view, SeatMapView, SeatStatusView};

/// Owns the lifecycle of seat holds per screening and computes the
/// aggregate seat-map view. Exclusivity rests on the hold store's atomic
/// acquire; this service adds the policy around it.
pub struct HoldRegistry {
    catalog: Arc<dyn CatalogDirectory>,
    holds: Arc<dyn HoldStore>,
    bookings: Arc<dyn BookingRepository>,
    publisher: Arc<dyn SeatMapPublisher>,
    hold_ttl: Duration,
}

impl HoldRegistry {
    pub fn new(
        catalog: Arc<dyn CatalogDirectory>,
        holds: Arc<dyn HoldStore>,
        bookings: Arc<dyn BookingRepository>,
        publisher: Arc<dyn SeatMapPublisher>,
        hold_minutes: i64,
    ) -> Self {
        Self {
            catalog,
            holds,
            bookings,
            publisher,
            hold_ttl: Duration::minutes(hold_minutes),
        }
    }

    pub async fn seat_map(
        &self,
        screening_id: Uuid,
        requester: &Requester,
    ) -> CoreResult<SeatMapView> {
        let screening = self.screening(screening_id).await?;
        let hall = self
            .catalog
            .hall(screening.hall_id)
            .await?
            .ok_or_else(|| CoreError::not_found("hall", screening.hall_id))?;
        let seats = self.seat_statuses(&screening, Some(requester)).await?;
        Ok(SeatMapView {
            screening_id,
            rows: hall.rows,
            cols: hall.seats_per_row,
            hold_minutes: self.hold_ttl.num_minutes(),
            seats,
        })
    }

    pub async fn lock_seat(
        &self,
        screening_id: Uuid,
        seat_id: Uuid,
        requester: &Requester,
    ) -> CoreResult<SeatStatusView> {
        let screening = self.screening(screening_id).await?;
        let seat = self.seat_in_hall(seat_id, &screening).await?;

        self.assert_seat_unsold(screening_id, seat_id).await?;

        let now = Utc::now();
        let outcome = self
            .holds
            .acquire(screening_id, seat_id, requester, now + self.hold_ttl, now)
            .await?;
        let hold = match outcome {
            HoldAcquire::Created(hold) => {
                tracing::info!(%seat_id, %screening_id, session = %requester.session_id, "seat locked");
                hold
            }
            HoldAcquire::Extended(hold) => {
                tracing::debug!(hold_id = %hold.id, %seat_id, "extending lock");
                hold
            }
            HoldAcquire::HeldByOther => {
                return Err(CoreError::Conflict(
                    "seat already locked by another user".to_string(),
                ))
            }
        };

        self.broadcast(screening_id).await;
        Ok(seat_status_view(&seat, None, Some(&hold), Some(requester)))
    }

    /// Releasing an unheld seat is a no-op; releasing someone else's hold is
    /// a conflict.
    pub async fn release_seat(
        &self,
        screening_id: Uuid,
        seat_id: Uuid,
        requester: &Requester,
    ) -> CoreResult<()> {
        let outcome = self
            .holds
            .release_owned(screening_id, seat_id, requester, Utc::now())
            .await?;
        match outcome {
            HoldRelease::Released(_) => {
                tracing::info!(%seat_id, %screening_id, session = %requester.session_id, "seat released");
                self.broadcast(screening_id).await;
                Ok(())
            }
            HoldRelease::NotHeld => {
                tracing::debug!(%seat_id, "no active lock to release");
                Ok(())
            }
            HoldRelease::HeldByOther => Err(CoreError::Conflict(
                "cannot release another user's seat lock".to_string(),
            )),
        }
    }

    pub async fn release_all(&self, screening_id: Uuid, session_id: &str) -> CoreResult<()> {
        let released = self
            .holds
            .release_session(screening_id, session_id, Utc::now())
            .await?;
        if released.is_empty() {
            return Ok(());
        }
        tracing::info!(count = released.len(), session = session_id, "released session locks");
        self.broadcast(screening_id).await;
        Ok(())
    }

    /// Sweep every screening's overdue holds. Each affected screening gets
    /// one broadcast; a failure while recomputing one screening's map is
    /// logged and must not stall the rest.
    pub async fn expire_locks(&self) -> CoreResult<usize> {
        let expired = self.holds.expire_due(Utc::now()).await?;
        if expired.is_empty() {
            return Ok(0);
        }

        let mut by_screening: HashMap<Uuid, usize> = HashMap::new();
        for hold in &expired {
            *by_screening.entry(hold.screening_id).or_default() += 1;
        }
        for (screening_id, count) in by_screening {
            tracing::info!(%screening_id, count, "expired seat locks");
            if let Err(err) = self.try_broadcast(screening_id).await {
                tracing::error!(%screening_id, %err, "seat map broadcast failed after expiry");
            }
        }
        Ok(expired.len())
    }

    pub async fn broadcast_seat_map(&self, screening_id: Uuid) -> CoreResult<()> {
        self.try_broadcast(screening_id).await
    }

    async fn broadcast(&self, screening_id: Uuid) {
        if let Err(err) = self.try_broadcast(screening_id).await {
            tracing::error!(%screening_id, %err, "seat map broadcast failed");
        }
    }

    async fn try_broadcast(&self, screening_id: Uuid) -> CoreResult<()> {
        let screening = self.screening(screening_id).await?;
        let seats = self.seat_statuses(&screening, None).await?;
        self.publisher.publish(SeatMapUpdate {
            screening_id,
            seats,
        });
        Ok(())
    }

    async fn seat_statuses(
        &self,
        screening: &Screening,
        requester: Option<&Requester>,
    ) -> CoreResult<Vec<SeatStatusView>> {
        let now = Utc::now();

        let mut booked: HashMap<Uuid, SeatStatus> = HashMap::new();
        for row in self.bookings.active_seats(screening.id).await? {
            booked
                .entry(row.seat_id)
                .and_modify(|status| {
                    if sale_rank(row.seat_status) > sale_rank(*status) {
                        *status = row.seat_status;
                    }
                })
                .or_insert(row.seat_status);
        }

        let mut holds: HashMap<Uuid, SeatHold> = HashMap::new();
        for hold in self.holds.active_for_screening(screening.id, now).await? {
            match holds.entry(hold.seat_id) {
                std::collections::hash_map::Entry::Occupied(mut slot) => {
                    if hold.expires_at > slot.get().expires_at {
                        slot.insert(hold);
                    }
                }
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert(hold);
                }
            }
        }

        let seats = self.catalog.active_seats_in_hall(screening.hall_id).await?;
        Ok(seats
            .iter()
            .map(|seat| {
                seat_status_view(
                    seat,
                    booked.get(&seat.id).copied(),
                    holds.get(&seat.id),
                    requester,
                )
            })
            .collect())
    }

    async fn assert_seat_unsold(&self, screening_id: Uuid, seat_id: Uuid) -> CoreResult<()> {
        let rows = self.bookings.seats_for_seat(screening_id, seat_id).await?;
        if rows
            .iter()
            .any(|row| row.seat_status != SeatStatus::Available)
        {
            return Err(CoreError::Conflict("seat is already reserved".to_string()));
        }
        Ok(())
    }

    async fn screening(&self, screening_id: Uuid) -> CoreResult<Screening> {
        self.catalog
            .screening(screening_id)
            .await?
            .ok_or_else(|| CoreError::not_found("screening", screening_id))
    }

    async fn seat_in_hall(&self, seat_id: Uuid, screening: &Screening) -> CoreResult<Seat> {
        let seat = self
            .catalog
            .seat(seat_id)
            .await?
            .ok_or_else(|| CoreError::not_found("seat", seat_id))?;
        if seat.hall_id != screening.hall_id {
            return Err(CoreError::FailedPrecondition(
                "seat does not belong to the screening hall".to_string(),
            ));
        }
        Ok(seat)
    }
}

fn sale_rank(status: SeatStatus) -> u8 {
    match status {
        SeatStatus::Occupied => 2,
        SeatStatus::Reserved => 1,
        SeatStatus::Available => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seatmap::SeatState;
    use chrono::Duration;
    use marquee_catalog::seed::{demo_catalog, DemoCatalog};
    use marquee_core::booking::{Booking, BookingSeat, BookingStatus};
    use marquee_core::hold::HoldStatus;
    use marquee_store::{InMemoryBookingStore, InMemoryHoldStore};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        updates: Mutex<Vec<SeatMapUpdate>>,
    }

    impl RecordingPublisher {
        fn count_for(&self, screening_id: Uuid) -> usize {
            self.updates
                .lock()
                .unwrap()
                .iter()
                .filter(|u| u.screening_id == screening_id)
                .count()
        }
    }

    impl SeatMapPublisher for RecordingPublisher {
        fn publish(&self, update: SeatMapUpdate) {
            self.updates.lock().unwrap().push(update);
        }
    }

    struct Fixture {
        demo: DemoCatalog,
        holds: Arc<InMemoryHoldStore>,
        bookings: Arc<InMemoryBookingStore>,
        publisher: Arc<RecordingPublisher>,
        registry: HoldRegistry,
    }

    fn fixture() -> Fixture {
        let demo = demo_catalog();
        let holds = Arc::new(InMemoryHoldStore::new());
        let bookings = Arc::new(InMemoryBookingStore::new());
        let publisher = Arc::new(RecordingPublisher::default());
        let registry = HoldRegistry::new(
            demo.catalog.clone(),
            holds.clone(),
            bookings.clone(),
            publisher.clone(),
            10,
        );
        Fixture {
            demo,
            holds,
            bookings,
            publisher,
            registry,
        }
    }

    fn seat_view<'a>(map: &'a SeatMapView, seat_id: Uuid) -> &'a SeatStatusView {
        map.seats.iter().find(|s| s.seat_id == seat_id).unwrap()
    }

    #[tokio::test]
    async fn repeat_lock_extends_without_a_second_row() {
        let f = fixture();
        let seat = f.demo.seat_ids[0];
        let alice = Requester::anonymous("s1");

        let first = f
            .registry
            .lock_seat(f.demo.screening_id, seat, &alice)
            .await
            .unwrap();
        let second = f
            .registry
            .lock_seat(f.demo.screening_id, seat, &alice)
            .await
            .unwrap();

        assert!(second.selected_by_you);
        assert!(second.hold_expires_at.unwrap() >= first.hold_expires_at.unwrap());
        assert_eq!(f.holds.rows_for(f.demo.screening_id, seat).await.len(), 1);
    }

    #[tokio::test]
    async fn lock_by_another_session_conflicts() {
        let f = fixture();
        let seat = f.demo.seat_ids[0];

        f.registry
            .lock_seat(f.demo.screening_id, seat, &Requester::anonymous("s1"))
            .await
            .unwrap();
        let err = f
            .registry
            .lock_seat(f.demo.screening_id, seat, &Requester::anonymous("s2"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn occupied_seats_cannot_be_locked() {
        let f = fixture();
        let seat = f.demo.seat_ids[0];

        let mut booking = Booking::new(Uuid::new_v4(), f.demo.screening_id);
        booking.status = BookingStatus::Confirmed;
        booking.add_seat(BookingSeat::occupied(seat, f.demo.standard_ticket_id, 1500));
        f.bookings.save(booking).await.unwrap();

        let err = f
            .registry
            .lock_seat(f.demo.screening_id, seat, &Requester::anonymous("s1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        let map = f
            .registry
            .seat_map(f.demo.screening_id, &Requester::anonymous("s1"))
            .await
            .unwrap();
        assert_eq!(seat_view(&map, seat).state, SeatState::Sold);
    }

    #[tokio::test]
    async fn seat_outside_the_hall_is_rejected() {
        let f = fixture();
        let foreign_seat = Uuid::new_v4();
        let err = f
            .registry
            .lock_seat(f.demo.screening_id, foreign_seat, &Requester::anonymous("s1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn release_is_idempotent_but_guards_ownership() {
        let f = fixture();
        let seat = f.demo.seat_ids[0];
        let alice = Requester::anonymous("s1");

        // Nothing held yet: a no-op, not an error.
        f.registry
            .release_seat(f.demo.screening_id, seat, &alice)
            .await
            .unwrap();

        f.registry
            .lock_seat(f.demo.screening_id, seat, &alice)
            .await
            .unwrap();

        let err = f
            .registry
            .release_seat(f.demo.screening_id, seat, &Requester::anonymous("s2"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        f.registry
            .release_seat(f.demo.screening_id, seat, &alice)
            .await
            .unwrap();
        // Released is terminal; a second release is again a no-op.
        f.registry
            .release_seat(f.demo.screening_id, seat, &alice)
            .await
            .unwrap();

        let map = f
            .registry
            .seat_map(f.demo.screening_id, &alice)
            .await
            .unwrap();
        assert_eq!(seat_view(&map, seat).state, SeatState::Free);
    }

    #[tokio::test]
    async fn release_all_only_touches_the_session() {
        let f = fixture();
        let alice = Requester::anonymous("s1");
        let bob = Requester::anonymous("s2");
        let screening = f.demo.screening_id;

        for seat in &f.demo.seat_ids[0..2] {
            f.registry.lock_seat(screening, *seat, &alice).await.unwrap();
        }
        f.registry
            .lock_seat(screening, f.demo.seat_ids[2], &bob)
            .await
            .unwrap();

        f.registry.release_all(screening, "s1").await.unwrap();

        let map = f.registry.seat_map(screening, &bob).await.unwrap();
        assert_eq!(seat_view(&map, f.demo.seat_ids[0]).state, SeatState::Free);
        assert_eq!(seat_view(&map, f.demo.seat_ids[1]).state, SeatState::Free);
        assert_eq!(seat_view(&map, f.demo.seat_ids[2]).state, SeatState::Booked);
    }

    #[tokio::test]
    async fn sweep_expires_overdue_holds_and_rebroadcasts() {
        let f = fixture();
        let seat = f.demo.seat_ids[0];
        let alice = Requester::anonymous("s1");
        let now = Utc::now();

        // Backdate a hold straight through the store.
        f.holds
            .acquire(
                f.demo.screening_id,
                seat,
                &alice,
                now - Duration::seconds(1),
                now - Duration::minutes(10),
            )
            .await
            .unwrap();

        let before = f.publisher.count_for(f.demo.screening_id);
        let swept = f.registry.expire_locks().await.unwrap();
        assert_eq!(swept, 1);
        assert_eq!(f.publisher.count_for(f.demo.screening_id), before + 1);

        let rows = f.holds.rows_for(f.demo.screening_id, seat).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, HoldStatus::Expired);

        let map = f.registry.seat_map(f.demo.screening_id, &alice).await.unwrap();
        assert_eq!(seat_view(&map, seat).state, SeatState::Free);

        // Re-running the sweep finds nothing.
        assert_eq!(f.registry.expire_locks().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn seat_map_marks_own_holds() {
        let f = fixture();
        let alice = Requester::anonymous("s1");
        let bob = Requester::anonymous("s2");
        let screening = f.demo.screening_id;

        f.registry
            .lock_seat(screening, f.demo.seat_ids[0], &alice)
            .await
            .unwrap();
        f.registry
            .lock_seat(screening, f.demo.seat_ids[1], &bob)
            .await
            .unwrap();

        let map = f.registry.seat_map(screening, &alice).await.unwrap();
        assert_eq!(map.rows, 8);
        assert_eq!(map.cols, 10);
        assert_eq!(map.hold_minutes, 10);

        let own = seat_view(&map, f.demo.seat_ids[0]);
        assert_eq!(own.state, SeatState::Booked);
        assert!(own.selected_by_you);
        assert!(own.hold_expires_at.is_some());

        let theirs = seat_view(&map, f.demo.seat_ids[1]);
        assert_eq!(theirs.state, SeatState::Booked);
        assert!(!theirs.selected_by_you);
    }

    #[tokio::test]
    async fn lock_and_release_broadcast_snapshots() {
        let f = fixture();
        let seat = f.demo.seat_ids[0];
        let alice = Requester::anonymous("s1");
        let screening = f.demo.screening_id;

        f.registry.lock_seat(screening, seat, &alice).await.unwrap();
        assert_eq!(f.publisher.count_for(screening), 1);

        f.registry.release_seat(screening, seat, &alice).await.unwrap();
        assert_eq!(f.publisher.count_for(screening), 2);

        // A no-op release pushes nothing.
        f.registry.release_seat(screening, seat, &alice).await.unwrap();
        assert_eq!(f.publisher.count_for(screening), 2);
    }
}
