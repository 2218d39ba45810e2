use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::controllers::seats::SeatResponse;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::seat::SeatId;
use crate::models::BookingRequest;
use crate::services::ledger;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(get_user_bookings).post(create_booking))
        .route("/bookings/cancel", patch(cancel_booking))
}

#[derive(Debug, Serialize)]
struct BookingsResponse {
    seats: Vec<SeatResponse>,
}

/* ---------- BOOKINGS ---------- */

// GET /api/bookings
async fn get_user_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<BookingsResponse>, ApiError> {
    let seats = state.session.load_state().await?;
    let mine = ledger::list_bookings_for(&seats, &user.user_id);

    Ok(Json(BookingsResponse {
        seats: mine
            .iter()
            .map(|s| SeatResponse::from_seat(s, &user.user_id))
            .collect(),
    }))
}

// POST /api/bookings
// Пустой seat_ids - автоматический подбор count мест подряд.
#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    count: u32,
    #[serde(default)]
    seat_ids: BTreeSet<SeatId>,
}

#[derive(Debug, Serialize)]
struct CreateBookingResponse {
    booked: Vec<SeatId>,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let policy = state.config.booking.short_selection_policy;
    let request = BookingRequest::manual(user.user_id.clone(), req.count, req.seat_ids);
    let mode = if request.is_manual() { "manual" } else { "auto" };

    let booked = state
        .session
        .commit(Some(&user.user_id), |seats, _| {
            ledger::submit_booking_with(seats, &request, policy)
        })
        .await
        .inspect_err(|e| tracing::info!("booking for {} rejected: {}", user.email, e))?;

    tracing::info!("Booked seats {:?} for {} ({})", booked, user.email, mode);

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            booked: booked.into_iter().collect(),
        }),
    ))
}

// PATCH /api/bookings/cancel
#[derive(Debug, Deserialize)]
struct CancelBookingRequest {
    seat_id: SeatId,
}

async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<CancelBookingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    state
        .session
        .commit(Some(&user.user_id), |seats, user_id| {
            ledger::submit_cancellation(seats, req.seat_id, user_id).map(|next| (next, ()))
        })
        .await?;

    tracing::info!("Cancelled seat {} for {}", req.seat_id, user.email);

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Бронь успешно отменена", "seat_id": req.seat_id })),
    ))
}
