use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marquee_catalog::Seat;
use marquee_core::booking::SeatStatus;
use marquee_core::hold::SeatHold;
use marquee_core::Requester;

/// External seat state, a total order: SOLD > BOOKED > FREE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatState {
    Free,
    Booked,
    Sold,
}

/// One seat as a viewer of the screening sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatStatusView {
    pub seat_id: Uuid,
    pub row: u32,
    pub number: u32,
    pub state: SeatState,
    pub selected_by_you: bool,
    pub hold_expires_at: Option<DateTime<Utc>>,
}

/// Full snapshot for a screening: grid dims, hold countdown, one entry per
/// active hall seat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatMapView {
    pub screening_id: Uuid,
    pub rows: u32,
    pub cols: u32,
    pub hold_minutes: i64,
    pub seats: Vec<SeatStatusView>,
}

/// A committed booking seat outranks any hold; a hold outranks an empty
/// slot. AVAILABLE booking rows are seats handed back by a cancellation and
/// do not count as sold.
pub fn resolve_seat_state(booked: Option<SeatStatus>, held: bool) -> SeatState {
    match booked {
        Some(SeatStatus::Occupied) | Some(SeatStatus::Reserved) => SeatState::Sold,
        _ if held => SeatState::Booked,
        _ => SeatState::Free,
    }
}

pub(crate) fn seat_status_view(
    seat: &Seat,
    booked: Option<SeatStatus>,
    hold: Option<&SeatHold>,
    requester: Option<&Requester>,
) -> SeatStatusView {
    let state = resolve_seat_state(booked, hold.is_some());
    let (selected_by_you, hold_expires_at) = match (state, hold) {
        (SeatState::Booked, Some(h)) => (
            requester.is_some_and(|r| h.owned_by(r)),
            Some(h.expires_at),
        ),
        _ => (false, None),
    };
    SeatStatusView {
        seat_id: seat.id,
        row: seat.row,
        number: seat.number,
        state,
        selected_by_you,
        hold_expires_at,
    }
}
