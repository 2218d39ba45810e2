use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::seat::{Seat, SeatId, SeatState};
use crate::models::UserId;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/seats", get(get_seats))
}

#[derive(Debug, Serialize)]
pub struct SeatResponse {
    pub id: SeatId,
    pub row: u32,
    pub number: u32,
    pub status: &'static str, // FREE, BOOKED
    pub mine: bool,
}

impl SeatResponse {
    pub fn from_seat(seat: &Seat, viewer: &UserId) -> Self {
        SeatResponse {
            id: seat.id,
            row: seat.row,
            number: seat.position_in_row,
            status: if seat.is_booked { "BOOKED" } else { "FREE" },
            mine: seat.is_owned_by(viewer),
        }
    }
}

#[derive(Debug, Serialize)]
struct RowResponse {
    row: u32,
    seats: Vec<SeatResponse>,
}

#[derive(Debug, Serialize)]
struct SeatMapResponse {
    free: usize,
    booked: usize,
    rows: Vec<RowResponse>,
}

fn seat_map(state: &SeatState, viewer: &UserId) -> SeatMapResponse {
    let mut rows: BTreeMap<u32, Vec<SeatResponse>> = BTreeMap::new();
    for seat in state.seats() {
        rows.entry(seat.row)
            .or_default()
            .push(SeatResponse::from_seat(seat, viewer));
    }

    SeatMapResponse {
        free: state.free_count(),
        booked: state.booked_count(),
        rows: rows
            .into_iter()
            .map(|(row, seats)| RowResponse { row, seats })
            .collect(),
    }
}

// GET /api/seats
async fn get_seats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<SeatMapResponse>, ApiError> {
    let seats = state.session.load_state().await?;
    Ok(Json(seat_map(&seats, &user.user_id)))
}
