use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::Requester;

/// Hold lifecycle. RELEASED and EXPIRED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldStatus {
    Active,
    Released,
    Expired,
}

/// A time-bounded exclusive claim on one seat of one screening. Repeat
/// requests from the owner extend `expires_at` in place; a second record is
/// never created for the same claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatHold {
    pub id: Uuid,
    pub screening_id: Uuid,
    pub seat_id: Uuid,
    pub session_id: String,
    pub username: Option<String>,
    pub status: HoldStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SeatHold {
    pub fn new(
        screening_id: Uuid,
        seat_id: Uuid,
        requester: &Requester,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            screening_id,
            seat_id,
            session_id: requester.session_id.clone(),
            username: requester.username().map(str::to_string),
            status: HoldStatus::Active,
            expires_at,
            created_at: Utc::now(),
        }
    }

    /// Session-id match wins outright; a username match only counts when the
    /// requester supplies one.
    pub fn owned_by(&self, requester: &Requester) -> bool {
        if self.session_id == requester.session_id {
            return true;
        }
        match requester.username() {
            Some(name) => self.username.as_deref() == Some(name),
            None => false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
