use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use marquee_order::{CartView, TicketOptionView};

use crate::context::RequesterContext;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct AddSeatRequest {
    seat_id: Uuid,
    ticket_type_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct UpdateTicketTypeRequest {
    ticket_type_id: Uuid,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/screenings/{screening_id}/cart",
            get(get_cart).post(add_seat),
        )
        .route(
            "/v1/screenings/{screening_id}/cart/seats/{seat_id}",
            axum::routing::patch(update_ticket_type).delete(remove_seat),
        )
        .route("/v1/ticket-options", get(ticket_options))
}

async fn get_cart(
    State(state): State<AppState>,
    Path(screening_id): Path<Uuid>,
    RequesterContext(requester): RequesterContext,
) -> Result<Json<CartView>, AppError> {
    Ok(Json(
        state.cart_manager.get_cart(screening_id, &requester).await?,
    ))
}

async fn add_seat(
    State(state): State<AppState>,
    Path(screening_id): Path<Uuid>,
    RequesterContext(requester): RequesterContext,
    Json(req): Json<AddSeatRequest>,
) -> Result<Json<CartView>, AppError> {
    Ok(Json(
        state
            .cart_manager
            .add_seat(screening_id, req.seat_id, req.ticket_type_id, &requester)
            .await?,
    ))
}

async fn update_ticket_type(
    State(state): State<AppState>,
    Path((screening_id, seat_id)): Path<(Uuid, Uuid)>,
    RequesterContext(requester): RequesterContext,
    Json(req): Json<UpdateTicketTypeRequest>,
) -> Result<Json<CartView>, AppError> {
    Ok(Json(
        state
            .cart_manager
            .update_ticket_type(screening_id, seat_id, req.ticket_type_id, &requester)
            .await?,
    ))
}

async fn remove_seat(
    State(state): State<AppState>,
    Path((screening_id, seat_id)): Path<(Uuid, Uuid)>,
    RequesterContext(requester): RequesterContext,
) -> Result<Json<CartView>, AppError> {
    Ok(Json(
        state
            .cart_manager
            .remove_seat(screening_id, seat_id, &requester)
            .await?,
    ))
}

async fn ticket_options(
    State(state): State<AppState>,
) -> Result<Json<Vec<TicketOptionView>>, AppError> {
    Ok(Json(state.cart_manager.ticket_options().await?))
}
