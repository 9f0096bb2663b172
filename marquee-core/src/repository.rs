use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::{Booking, SeatStatus};
use crate::error::CoreResult;
use crate::hold::SeatHold;
use crate::identity::{Requester, User};

/// Outcome of an atomic hold acquisition.
#[derive(Debug, Clone)]
pub enum HoldAcquire {
    Created(SeatHold),
    Extended(SeatHold),
    HeldByOther,
}

/// Outcome of releasing a single hold.
#[derive(Debug, Clone)]
pub enum HoldRelease {
    Released(SeatHold),
    NotHeld,
    HeldByOther,
}

/// Durable store for seat holds. At most one ACTIVE hold may exist per
/// (screening, seat); implementations must make `acquire` a real
/// check-and-insert rather than a read followed by a write. Active-hold
/// reads are time-filtered: a hold past its expiry is invisible even before
/// the sweep has stamped it EXPIRED.
#[async_trait]
pub trait HoldStore: Send + Sync {
    /// Insert-if-absent on (screening, seat): extends the requester's own
    /// ACTIVE hold in place, creates a fresh hold when the slot is free.
    async fn acquire(
        &self,
        screening_id: Uuid,
        seat_id: Uuid,
        requester: &Requester,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CoreResult<HoldAcquire>;

    async fn find_active(
        &self,
        screening_id: Uuid,
        seat_id: Uuid,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<SeatHold>>;

    async fn active_for_screening(
        &self,
        screening_id: Uuid,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<SeatHold>>;

    /// Every ACTIVE hold owned by the requester for the screening.
    async fn active_owned_by(
        &self,
        screening_id: Uuid,
        requester: &Requester,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<SeatHold>>;

    async fn release_owned(
        &self,
        screening_id: Uuid,
        seat_id: Uuid,
        requester: &Requester,
        now: DateTime<Utc>,
    ) -> CoreResult<HoldRelease>;

    /// Releases every ACTIVE hold of the session for the screening and
    /// returns the released holds. Username-held locks from other sessions
    /// are left alone.
    async fn release_session(
        &self,
        screening_id: Uuid,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<SeatHold>>;

    /// Stamps every ACTIVE hold past its expiry EXPIRED and returns them.
    /// Safe to call repeatedly and concurrently; overlapping sweeps claim
    /// disjoint sets.
    async fn expire_due(&self, now: DateTime<Utc>) -> CoreResult<Vec<SeatHold>>;
}

/// A seat already written by some committed booking, as the seat map and the
/// lock path see it.
#[derive(Debug, Clone, Copy)]
pub struct BookedSeat {
    pub seat_id: Uuid,
    pub seat_status: SeatStatus,
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Persists the whole aggregate in one atomic write.
    async fn save(&self, booking: Booking) -> CoreResult<Booking>;

    /// Seats of non-cancelled bookings for the screening.
    async fn active_seats(&self, screening_id: Uuid) -> CoreResult<Vec<BookedSeat>>;

    /// Every booking-seat row ever written for this (screening, seat),
    /// regardless of booking status.
    async fn seats_for_seat(
        &self,
        screening_id: Uuid,
        seat_id: Uuid,
    ) -> CoreResult<Vec<BookedSeat>>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> CoreResult<Option<User>>;
}

/// Produces the scannable payload handed back with a finished checkout.
/// Failures map to `CoreError::Internal`.
pub trait TicketCodeGenerator: Send + Sync {
    fn generate(&self, booking_number: &str) -> CoreResult<String>;
}
