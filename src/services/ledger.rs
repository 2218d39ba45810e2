//! ledger.rs
//!
//! Переходы состояния мест: бронирование, отмена и политика разбора запроса
//! на бронирование (ручной выбор или автоматический подбор).
//!
//! Каждая операция принимает состояние по ссылке и возвращает новое;
//! состояние вызывающей стороны не меняется.

use std::collections::BTreeSet;
use tracing::debug;

use crate::error::BookingError;
use crate::models::booking::{BookingRequest, ShortSelectionPolicy};
use crate::models::seat::{derive_layout, Seat, SeatId, SeatState, ROW_WIDTH};
use crate::models::user::UserId;
use crate::services::allocation::{find_contiguous_block, validate_manual_selection};

/// Бронирует `ids` за пользователем `user`.
///
/// Все места должны быть свободны. Если какое-то уже занято (кто-то успел раньше),
/// возвращается `Conflict` - запрос можно повторить на свежем состоянии.
pub fn book(
    state: &SeatState,
    ids: &BTreeSet<SeatId>,
    user: &UserId,
) -> Result<SeatState, BookingError> {
    for &id in ids {
        derive_layout(id)?;
    }

    let mut next = state.clone();
    for &id in ids {
        let seat = next.get_mut(id).ok_or(BookingError::SeatNotFound(id))?;
        if seat.is_booked {
            return Err(BookingError::Conflict(id));
        }
        seat.assign(user);
    }
    Ok(next)
}

/// Снимает бронь с места; отменить можно только свою бронь.
pub fn cancel(state: &SeatState, id: SeatId, user: &UserId) -> Result<SeatState, BookingError> {
    let seat = state.get(id).ok_or(BookingError::SeatNotFound(id))?;
    if !seat.is_booked {
        return Err(BookingError::SeatNotBooked(id));
    }
    if !seat.is_owned_by(user) {
        return Err(BookingError::NotOwner(id));
    }

    let mut next = state.clone();
    if let Some(seat) = next.get_mut(id) {
        seat.release();
    }
    Ok(next)
}

/// Решает, какие места бронировать по запросу. Состояние не меняет.
///
/// 1. Ручной выбор ровно из `count` мест перепроверяется; если место успели занять,
///    возвращается `SelectionStale`.
/// 2. Без ручного выбора ищется блок подряд; если не найден - `NoBlockAvailable`.
/// 3. Неполный ручной выбор отклоняется (`IncompleteSelection`) либо, при политике
///    `Auto`, игнорируется в пользу автоматического подбора.
pub fn resolve_booking(
    state: &SeatState,
    request: &BookingRequest,
    policy: ShortSelectionPolicy,
) -> Result<BTreeSet<SeatId>, BookingError> {
    let count = request.count;
    if !(1..=ROW_WIDTH).contains(&count) {
        return Err(BookingError::InvalidCount(count));
    }

    let selected = request.selection.len();
    if selected == count as usize {
        return match validate_manual_selection(state, &request.selection) {
            Ok(()) => Ok(request.selection.clone()),
            Err(BookingError::SeatUnavailable(id)) => Err(BookingError::SelectionStale(id)),
            Err(e) => Err(e),
        };
    }
    if selected > count as usize {
        return Err(BookingError::SelectionExceedsCount {
            selected,
            requested: count,
        });
    }
    if selected > 0 && policy == ShortSelectionPolicy::Reject {
        return Err(BookingError::IncompleteSelection {
            selected,
            requested: count,
        });
    }
    if selected > 0 {
        debug!(
            "ignoring partial selection of {} of {} seats for {}",
            selected, count, request.user
        );
    }

    find_contiguous_block(state, count)?.ok_or(BookingError::NoBlockAvailable(count))
}

/// Разбор запроса по строгой политике и бронирование.
pub fn submit_booking(state: &SeatState, request: &BookingRequest) -> Result<SeatState, BookingError> {
    submit_booking_with(state, request, ShortSelectionPolicy::Reject).map(|(next, _)| next)
}

/// Разбор запроса по заданной политике и бронирование; вместе с новым
/// состоянием возвращает забронированные номера.
pub fn submit_booking_with(
    state: &SeatState,
    request: &BookingRequest,
    policy: ShortSelectionPolicy,
) -> Result<(SeatState, BTreeSet<SeatId>), BookingError> {
    let ids = resolve_booking(state, request, policy)?;
    let next = book(state, &ids, &request.user)?;
    Ok((next, ids))
}

pub fn submit_cancellation(
    state: &SeatState,
    id: SeatId,
    user: &UserId,
) -> Result<SeatState, BookingError> {
    cancel(state, id, user)
}

/// Места пользователя по возрастанию номера.
pub fn list_bookings_for(state: &SeatState, user: &UserId) -> Vec<Seat> {
    state
        .seats()
        .iter()
        .filter(|s| s.is_owned_by(user))
        .cloned()
        .collect()
}
