use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::directory::InMemoryCatalog;
use crate::models::{Hall, Screening, Seat, SeatType, TicketType};

/// Handles into a freshly seeded catalog, so callers can refer to concrete
/// rows without re-querying.
pub struct DemoCatalog {
    pub catalog: Arc<InMemoryCatalog>,
    pub hall_id: Uuid,
    pub screening_id: Uuid,
    pub other_screening_id: Uuid,
    pub seat_ids: Vec<Uuid>,
    pub standard_ticket_id: Uuid,
    pub student_ticket_id: Uuid,
}

/// One 8x10 hall, two upcoming screenings in it, and the usual ticket
/// types. Enough catalog for the demo binary and the test suites.
pub fn demo_catalog() -> DemoCatalog {
    let catalog = Arc::new(InMemoryCatalog::new());

    let hall_id = Uuid::new_v4();
    catalog.insert_hall(Hall {
        id: hall_id,
        name: "Hall 1".to_string(),
        rows: 8,
        seats_per_row: 10,
    });

    let mut seat_ids = Vec::new();
    for row in 1..=8u32 {
        for number in 1..=10u32 {
            let seat = Seat {
                id: Uuid::new_v4(),
                hall_id,
                row,
                number,
                seat_type: if row == 8 {
                    SeatType::Comfort
                } else {
                    SeatType::Standard
                },
                active: true,
            };
            seat_ids.push(seat.id);
            catalog.insert_seat(seat);
        }
    }

    let screening_id = Uuid::new_v4();
    catalog.insert_screening(Screening {
        id: screening_id,
        hall_id,
        starts_at: Utc::now() + Duration::hours(2),
        active: true,
    });

    let other_screening_id = Uuid::new_v4();
    catalog.insert_screening(Screening {
        id: other_screening_id,
        hall_id,
        starts_at: Utc::now() + Duration::hours(5),
        active: true,
    });

    let standard_ticket_id = Uuid::new_v4();
    catalog.insert_ticket_type(TicketType {
        id: standard_ticket_id,
        name: "STANDARD".to_string(),
        description: None,
        price_cents: 1500,
        active: true,
    });

    let student_ticket_id = Uuid::new_v4();
    catalog.insert_ticket_type(TicketType {
        id: student_ticket_id,
        name: "STUDENT".to_string(),
        description: Some("Valid student card required".to_string()),
        price_cents: 1100,
        active: true,
    });

    catalog.insert_ticket_type(TicketType {
        id: Uuid::new_v4(),
        name: "SENIOR".to_string(),
        description: None,
        price_cents: 1200,
        active: true,
    });

    DemoCatalog {
        catalog,
        hall_id,
        screening_id,
        other_screening_id,
        seat_ids,
        standard_ticket_id,
        student_ticket_id,
    }
}
