pub mod auth;
pub mod seats;
pub mod bookings;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(auth::routes())
        .merge(seats::routes())
        .merge(bookings::routes())
}
