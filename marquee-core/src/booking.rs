use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Expired,
}

/// Per-seat state inside a committed booking. The checkout path writes
/// OCCUPIED directly; RESERVED only appears on the direct back-office path,
/// and AVAILABLE marks a seat given back by a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Reserved,
    Occupied,
    Available,
}

/// One sold seat within a booking, with the price frozen at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSeat {
    pub id: Uuid,
    pub seat_id: Uuid,
    pub ticket_type_id: Uuid,
    pub price_cents: i32,
    pub seat_status: SeatStatus,
}

impl BookingSeat {
    pub fn occupied(seat_id: Uuid, ticket_type_id: Uuid, price_cents: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            seat_id,
            ticket_type_id,
            price_cents,
            seat_status: SeatStatus::Occupied,
        }
    }
}

/// The committed purchase aggregate: persisted in one atomic write, all
/// seats or none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub booking_number: String,
    pub user_id: Uuid,
    pub screening_id: Uuid,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub payment_method: String,
    pub payment_reference: String,
    pub total_cents: i32,
    pub status: BookingStatus,
    pub seats: Vec<BookingSeat>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(user_id: Uuid, screening_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_number: Uuid::new_v4().to_string(),
            user_id,
            screening_id,
            customer_email: String::new(),
            customer_phone: None,
            payment_method: String::new(),
            payment_reference: String::new(),
            total_cents: 0,
            status: BookingStatus::Pending,
            seats: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Add a seat to the aggregate, keeping the total in step.
    pub fn add_seat(&mut self, seat: BookingSeat) {
        self.total_cents += seat.price_cents;
        self.seats.push(seat);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_tracks_added_seats() {
        let mut booking = Booking::new(Uuid::new_v4(), Uuid::new_v4());
        booking.add_seat(BookingSeat::occupied(Uuid::new_v4(), Uuid::new_v4(), 1500));
        booking.add_seat(BookingSeat::occupied(Uuid::new_v4(), Uuid::new_v4(), 1100));
        assert_eq!(booking.total_cents, 2600);
        assert_eq!(booking.seats.len(), 2);
        assert!(booking
            .seats
            .iter()
            .all(|s| s.seat_status == SeatStatus::Occupied));
    }
}
