use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use marquee_core::CoreResult;

use crate::models::{Hall, Screening, Seat, TicketType};

/// Read-only lookup into halls, seats, screenings and ticket types. The
/// booking core never writes through this seam; catalog CRUD lives in a
/// different part of the application.
#[async_trait]
pub trait CatalogDirectory: Send + Sync {
    async fn screening(&self, id: Uuid) -> CoreResult<Option<Screening>>;
    async fn hall(&self, id: Uuid) -> CoreResult<Option<Hall>>;
    async fn seat(&self, id: Uuid) -> CoreResult<Option<Seat>>;
    /// Active seats of a hall, row-major order.
    async fn active_seats_in_hall(&self, hall_id: Uuid) -> CoreResult<Vec<Seat>>;
    async fn ticket_type(&self, id: Uuid) -> CoreResult<Option<TicketType>>;
    /// Active ticket types, cheapest first.
    async fn active_ticket_types(&self) -> CoreResult<Vec<TicketType>>;
}

#[derive(Default)]
pub struct InMemoryCatalog {
    halls: RwLock<HashMap<Uuid, Hall>>,
    seats: RwLock<HashMap<Uuid, Seat>>,
    screenings: RwLock<HashMap<Uuid, Screening>>,
    ticket_types: RwLock<HashMap<Uuid, TicketType>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_hall(&self, hall: Hall) {
        self.halls
            .write()
            .expect("catalog lock poisoned")
            .insert(hall.id, hall);
    }

    pub fn insert_seat(&self, seat: Seat) {
        self.seats
            .write()
            .expect("catalog lock poisoned")
            .insert(seat.id, seat);
    }

    pub fn insert_screening(&self, screening: Screening) {
        self.screenings
            .write()
            .expect("catalog lock poisoned")
            .insert(screening.id, screening);
    }

    pub fn insert_ticket_type(&self, ticket_type: TicketType) {
        self.ticket_types
            .write()
            .expect("catalog lock poisoned")
            .insert(ticket_type.id, ticket_type);
    }
}

#[async_trait]
impl CatalogDirectory for InMemoryCatalog {
    async fn screening(&self, id: Uuid) -> CoreResult<Option<Screening>> {
        Ok(self
            .screenings
            .read()
            .expect("catalog lock poisoned")
            .get(&id)
            .cloned())
    }

    async fn hall(&self, id: Uuid) -> CoreResult<Option<Hall>> {
        Ok(self
            .halls
            .read()
            .expect("catalog lock poisoned")
            .get(&id)
            .cloned())
    }

    async fn seat(&self, id: Uuid) -> CoreResult<Option<Seat>> {
        Ok(self
            .seats
            .read()
            .expect("catalog lock poisoned")
            .get(&id)
            .cloned())
    }

    async fn active_seats_in_hall(&self, hall_id: Uuid) -> CoreResult<Vec<Seat>> {
        let mut seats: Vec<Seat> = self
            .seats
            .read()
            .expect("catalog lock poisoned")
            .values()
            .filter(|seat| seat.hall_id == hall_id && seat.active)
            .cloned()
            .collect();
        seats.sort_by_key(|seat| (seat.row, seat.number));
        Ok(seats)
    }

    async fn ticket_type(&self, id: Uuid) -> CoreResult<Option<TicketType>> {
        Ok(self
            .ticket_types
            .read()
            .expect("catalog lock poisoned")
            .get(&id)
            .cloned())
    }

    async fn active_ticket_types(&self) -> CoreResult<Vec<TicketType>> {
        let mut types: Vec<TicketType> = self
            .ticket_types
            .read()
            .expect("catalog lock poisoned")
            .values()
            .filter(|t| t.active)
            .cloned()
            .collect();
        types.sort_by_key(|t| t.price_cents);
        Ok(types)
    }
}
