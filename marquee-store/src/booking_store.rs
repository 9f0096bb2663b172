use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use marquee_core::booking::{Booking, BookingStatus};
use marquee_core::repository::{BookedSeat, BookingRepository};
use marquee_core::CoreResult;

/// In-memory booking persistence. `save` pushes the whole aggregate under
/// one lock, so a booking is either fully visible or absent; there is no
/// state in which only some of its seats exist.
#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: Mutex<Vec<Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<Booking> {
        self.bookings.lock().await.clone()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingStore {
    async fn save(&self, booking: Booking) -> CoreResult<Booking> {
        let mut bookings = self.bookings.lock().await;
        bookings.push(booking.clone());
        tracing::debug!(booking = %booking.booking_number, seats = booking.seats.len(), "booking saved");
        Ok(booking)
    }

    async fn active_seats(&self, screening_id: Uuid) -> CoreResult<Vec<BookedSeat>> {
        let bookings = self.bookings.lock().await;
        Ok(bookings
            .iter()
            .filter(|b| b.screening_id == screening_id && b.status != BookingStatus::Cancelled)
            .flat_map(|b| b.seats.iter())
            .map(|s| BookedSeat {
                seat_id: s.seat_id,
                seat_status: s.seat_status,
            })
            .collect())
    }

    async fn seats_for_seat(
        &self,
        screening_id: Uuid,
        seat_id: Uuid,
    ) -> CoreResult<Vec<BookedSeat>> {
        let bookings = self.bookings.lock().await;
        Ok(bookings
            .iter()
            .filter(|b| b.screening_id == screening_id)
            .flat_map(|b| b.seats.iter())
            .filter(|s| s.seat_id == seat_id)
            .map(|s| BookedSeat {
                seat_id: s.seat_id,
                seat_status: s.seat_status,
            })
            .collect())
    }
}
