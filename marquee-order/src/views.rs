use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::CartItem;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemView {
    pub seat_id: Uuid,
    pub row: u32,
    pub number: u32,
    pub ticket_type_id: Uuid,
    pub ticket_type_name: String,
    pub price_cents: i32,
    pub hold_expires_at: DateTime<Utc>,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            seat_id: item.seat_id,
            row: item.row,
            number: item.number,
            ticket_type_id: item.ticket_type_id,
            ticket_type_name: item.ticket_type_name.clone(),
            price_cents: item.price_cents,
            hold_expires_at: item.hold_expires_at,
        }
    }
}

/// The cart as returned to the caller: always echoes the screening that was
/// asked about, even when the session's cart is bound elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub screening_id: Uuid,
    pub items: Vec<CartItemView>,
    pub subtotal_cents: i32,
}

impl CartView {
    pub fn empty(screening_id: Uuid) -> Self {
        Self {
            screening_id,
            items: Vec::new(),
            subtotal_cents: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketOptionView {
    pub ticket_type_id: Uuid,
    pub name: String,
    pub price_cents: i32,
}
