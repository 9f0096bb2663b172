use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use marquee_core::hold::{HoldStatus, SeatHold};
use marquee_core::repository::{HoldAcquire, HoldRelease, HoldStore};
use marquee_core::{CoreResult, Requester};

#[derive(Default)]
struct HoldRows {
    /// The (screening, seat) key admits one row, which is what keeps two
    /// ACTIVE holds for the same seat structurally impossible.
    active: HashMap<(Uuid, Uuid), SeatHold>,
    /// RELEASED / EXPIRED rows, retained for audit.
    terminal: Vec<SeatHold>,
}

impl HoldRows {
    fn retire(&mut self, mut hold: SeatHold, status: HoldStatus) -> SeatHold {
        hold.status = status;
        self.terminal.push(hold.clone());
        hold
    }
}

/// In-memory hold store. A single mutex spans the check and the insert, so
/// `acquire` is a true compare-and-swap rather than a read-then-write.
#[derive(Default)]
pub struct InMemoryHoldStore {
    rows: Mutex<HoldRows>,
}

impl InMemoryHoldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row ever written for this (screening, seat), any status.
    pub async fn rows_for(&self, screening_id: Uuid, seat_id: Uuid) -> Vec<SeatHold> {
        let rows = self.rows.lock().await;
        let mut out: Vec<SeatHold> = rows
            .terminal
            .iter()
            .filter(|h| h.screening_id == screening_id && h.seat_id == seat_id)
            .cloned()
            .collect();
        if let Some(active) = rows.active.get(&(screening_id, seat_id)) {
            out.push(active.clone());
        }
        out
    }
}

#[async_trait]
impl HoldStore for InMemoryHoldStore {
    async fn acquire(
        &self,
        screening_id: Uuid,
        seat_id: Uuid,
        requester: &Requester,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CoreResult<HoldAcquire> {
        let mut rows = self.rows.lock().await;
        let key = (screening_id, seat_id);

        let stale_slot = match rows.active.get_mut(&key) {
            Some(existing) if !existing.is_expired(now) => {
                if existing.owned_by(requester) {
                    existing.expires_at = expires_at;
                    return Ok(HoldAcquire::Extended(existing.clone()));
                }
                return Ok(HoldAcquire::HeldByOther);
            }
            Some(_) => true,
            None => false,
        };
        if stale_slot {
            // Stale row the sweep has not reached yet; it vacates the slot
            // the moment anyone re-claims the seat.
            let stale = rows.active.remove(&key).unwrap();
            rows.retire(stale, HoldStatus::Expired);
        }

        let hold = SeatHold::new(screening_id, seat_id, requester, expires_at);
        rows.active.insert(key, hold.clone());
        Ok(HoldAcquire::Created(hold))
    }

    async fn find_active(
        &self,
        screening_id: Uuid,
        seat_id: Uuid,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<SeatHold>> {
        let rows = self.rows.lock().await;
        Ok(rows
            .active
            .get(&(screening_id, seat_id))
            .filter(|h| !h.is_expired(now))
            .cloned())
    }

    async fn active_for_screening(
        &self,
        screening_id: Uuid,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<SeatHold>> {
        let rows = self.rows.lock().await;
        Ok(rows
            .active
            .values()
            .filter(|h| h.screening_id == screening_id && !h.is_expired(now))
            .cloned()
            .collect())
    }

    async fn active_owned_by(
        &self,
        screening_id: Uuid,
        requester: &Requester,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<SeatHold>> {
        let rows = self.rows.lock().await;
        Ok(rows
            .active
            .values()
            .filter(|h| {
                h.screening_id == screening_id && !h.is_expired(now) && h.owned_by(requester)
            })
            .cloned()
            .collect())
    }

    async fn release_owned(
        &self,
        screening_id: Uuid,
        seat_id: Uuid,
        requester: &Requester,
        now: DateTime<Utc>,
    ) -> CoreResult<HoldRelease> {
        let mut rows = self.rows.lock().await;
        let key = (screening_id, seat_id);

        let Some(existing) = rows.active.get(&key).filter(|h| !h.is_expired(now)) else {
            return Ok(HoldRelease::NotHeld);
        };
        if !existing.owned_by(requester) {
            return Ok(HoldRelease::HeldByOther);
        }
        let hold = rows.active.remove(&key).unwrap();
        let hold = rows.retire(hold, HoldStatus::Released);
        Ok(HoldRelease::Released(hold))
    }

    async fn release_session(
        &self,
        screening_id: Uuid,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<SeatHold>> {
        let mut rows = self.rows.lock().await;
        let keys: Vec<(Uuid, Uuid)> = rows
            .active
            .iter()
            .filter(|(_, h)| {
                h.screening_id == screening_id
                    && h.session_id == session_id
                    && !h.is_expired(now)
            })
            .map(|(key, _)| *key)
            .collect();

        let mut released = Vec::with_capacity(keys.len());
        for key in keys {
            let hold = rows.active.remove(&key).unwrap();
            released.push(rows.retire(hold, HoldStatus::Released));
        }
        Ok(released)
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> CoreResult<Vec<SeatHold>> {
        let mut rows = self.rows.lock().await;
        let keys: Vec<(Uuid, Uuid)> = rows
            .active
            .iter()
            .filter(|(_, h)| h.is_expired(now))
            .map(|(key, _)| *key)
            .collect();

        let mut expired = Vec::with_capacity(keys.len());
        for key in keys {
            let hold = rows.active.remove(&key).unwrap();
            expired.push(rows.retire(hold, HoldStatus::Expired));
        }
        Ok(expired)
    }
}
