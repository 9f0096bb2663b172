use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get, post},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use marquee_seating::{SeatMapView, SeatStatusView};

use crate::context::RequesterContext;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/screenings/{screening_id}/seat-map", get(seat_map))
        .route(
            "/v1/screenings/{screening_id}/seats/{seat_id}/lock",
            post(lock_seat).delete(release_seat),
        )
        .route("/v1/screenings/{screening_id}/locks", delete(release_all))
        .route("/v1/screenings/{screening_id}/stream", get(stream_seat_map))
}

async fn seat_map(
    State(state): State<AppState>,
    Path(screening_id): Path<Uuid>,
    RequesterContext(requester): RequesterContext,
) -> Result<Json<SeatMapView>, AppError> {
    Ok(Json(state.registry.seat_map(screening_id, &requester).await?))
}

async fn lock_seat(
    State(state): State<AppState>,
    Path((screening_id, seat_id)): Path<(Uuid, Uuid)>,
    RequesterContext(requester): RequesterContext,
) -> Result<Json<SeatStatusView>, AppError> {
    Ok(Json(
        state
            .registry
            .lock_seat(screening_id, seat_id, &requester)
            .await?,
    ))
}

async fn release_seat(
    State(state): State<AppState>,
    Path((screening_id, seat_id)): Path<(Uuid, Uuid)>,
    RequesterContext(requester): RequesterContext,
) -> Result<StatusCode, AppError> {
    state
        .registry
        .release_seat(screening_id, seat_id, &requester)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn release_all(
    State(state): State<AppState>,
    Path(screening_id): Path<Uuid>,
    RequesterContext(requester): RequesterContext,
) -> Result<StatusCode, AppError> {
    state
        .registry
        .release_all(screening_id, &requester.session_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Live seat-map snapshots for one screening. Every event is a full
/// snapshot, so a client that reconnects just re-renders the next one.
async fn stream_seat_map(
    State(state): State<AppState>,
    Path(screening_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.updates_tx.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(update) if update.screening_id == screening_id => {
                let payload = serde_json::to_string(&update).ok()?;
                Some(Ok(Event::default().event("seat_map").data(payload)))
            }
            _ => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
