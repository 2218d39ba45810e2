pub mod user;
pub mod seat;
pub mod booking;

pub use user::{User, UserId};
pub use seat::{initial_state, Seat, SeatId, SeatState};
pub use booking::{BookingRequest, ShortSelectionPolicy};
