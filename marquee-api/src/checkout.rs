use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use uuid::Uuid;

use marquee_order::{CheckoutConfirmation, CheckoutRequest};

use crate::context::RequesterContext;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/v1/screenings/{screening_id}/checkout",
        post(finalize_checkout),
    )
}

async fn finalize_checkout(
    State(state): State<AppState>,
    Path(screening_id): Path<Uuid>,
    RequesterContext(requester): RequesterContext,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutConfirmation>, AppError> {
    validate(&req)?;
    Ok(Json(
        state
            .checkout
            .finalize_checkout(screening_id, req, &requester)
            .await?,
    ))
}

fn validate(req: &CheckoutRequest) -> Result<(), AppError> {
    if req.payment_method.trim().is_empty() {
        return Err(AppError::BadRequest(
            "payment method is required".to_string(),
        ));
    }
    if let Some(email) = req.customer_email.as_deref() {
        if !email.trim().is_empty() && !email.contains('@') {
            return Err(AppError::BadRequest(
                "customer email must be valid".to_string(),
            ));
        }
    }
    Ok(())
}
