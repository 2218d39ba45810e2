pub mod allocation;
pub mod ledger;

pub use allocation::{find_contiguous_block, validate_manual_selection};
pub use ledger::{
    book, cancel, list_bookings_for, resolve_booking, submit_booking, submit_booking_with,
    submit_cancellation,
};
