use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use marquee_core::Requester;

use crate::error::AppError;

/// Caller identity for every seating/cart/checkout route. Authentication
/// itself happens upstream; by the time a request lands here the gateway
/// has resolved the session cookie into these two headers.
pub struct RequesterContext(pub Requester);

impl<S> FromRequestParts<S> for RequesterContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session_id = parts
            .headers
            .get("x-session-id")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::BadRequest("missing x-session-id header".to_string()))?
            .to_string();

        let username = parts
            .headers
            .get("x-username")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Ok(Self(Requester {
            session_id,
            username,
        }))
    }
}
