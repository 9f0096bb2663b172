use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marquee_core::hold::SeatHold;

/// One selected seat inside a session cart, mirroring a live hold. Price
/// and expiry are snapshots taken when the item was added or refreshed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub seat_id: Uuid,
    pub row: u32,
    pub number: u32,
    pub ticket_type_id: Uuid,
    pub ticket_type_name: String,
    pub price_cents: i32,
    pub hold_expires_at: DateTime<Utc>,
}

/// Per-session staging area. Binds at most one screening; items keep their
/// insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionCart {
    pub screening_id: Option<Uuid>,
    items: Vec<CartItem>,
}

impl SessionCart {
    pub fn is_bound_to(&self, screening_id: Uuid) -> bool {
        self.screening_id == Some(screening_id)
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_seat(&self, seat_id: Uuid) -> bool {
        self.items.iter().any(|item| item.seat_id == seat_id)
    }

    pub fn item_mut(&mut self, seat_id: Uuid) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.seat_id == seat_id)
    }

    pub fn insert(&mut self, item: CartItem) {
        self.items.push(item);
    }

    pub fn remove_seat(&mut self, seat_id: Uuid) -> Option<CartItem> {
        let idx = self.items.iter().position(|item| item.seat_id == seat_id)?;
        Some(self.items.remove(idx))
    }

    pub fn seat_ids(&self) -> Vec<Uuid> {
        self.items.iter().map(|item| item.seat_id).collect()
    }

    pub fn subtotal_cents(&self) -> i32 {
        self.items.iter().map(|item| item.price_cents).sum()
    }

    pub fn clear(&mut self) {
        self.screening_id = None;
        self.items.clear();
    }

    /// Reconcile against the requester's live holds: items whose hold is
    /// gone are dropped, survivors get a fresh expiry snapshot, and an
    /// emptied cart unbinds. Returns how many items were dropped.
    pub fn drop_stale(&mut self, holds: &HashMap<Uuid, SeatHold>) -> usize {
        let before = self.items.len();
        self.items.retain_mut(|item| match holds.get(&item.seat_id) {
            Some(hold) => {
                item.hold_expires_at = hold.expires_at;
                true
            }
            None => false,
        });
        if self.items.is_empty() {
            self.clear();
        }
        before - self.items.len()
    }
}

/// Session-keyed cart store. Every active session gets its own cart; there
/// is deliberately no process-wide cart instance.
#[derive(Default)]
pub struct CartSessionStore {
    carts: Mutex<HashMap<String, SessionCart>>,
}

impl CartSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the session's cart, creating an empty one on first
    /// use.
    pub fn with_cart<R>(&self, session_id: &str, f: impl FnOnce(&mut SessionCart) -> R) -> R {
        let mut carts = self.carts.lock().expect("cart store poisoned");
        f(carts.entry(session_id.to_string()).or_default())
    }

    pub fn snapshot(&self, session_id: &str) -> SessionCart {
        self.carts
            .lock()
            .expect("cart store poisoned")
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Drops the session's cart entirely (checkout done, session over).
    pub fn clear(&self, session_id: &str) {
        self.carts
            .lock()
            .expect("cart store poisoned")
            .remove(session_id);
    }
}
