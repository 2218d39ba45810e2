//! allocation.rs
//!
//! Поиск мест для бронирования:
//! - `find_contiguous_block` - первый блок из N свободных мест подряд в одном ряду;
//! - `validate_manual_selection` - проверка набора мест, выбранного вручную.
//!
//! Обе функции только читают состояние.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::BookingError;
use crate::models::seat::{derive_layout, Seat, SeatId, SeatState, ROW_WIDTH};

/// Ищет `count` свободных мест подряд в одном ряду.
///
/// Ряды просматриваются по возрастанию номера, внутри ряда окно сдвигается
/// от меньшей позиции к большей; возвращается первое полностью свободное окно.
/// `Ok(None)` - ни в одном ряду нет такого блока (в том числе когда `count`
/// больше длины ряда, как у короткого последнего ряда).
pub fn find_contiguous_block(
    state: &SeatState,
    count: u32,
) -> Result<Option<BTreeSet<SeatId>>, BookingError> {
    if !(1..=ROW_WIDTH).contains(&count) {
        return Err(BookingError::InvalidCount(count));
    }
    let width = count as usize;

    let mut rows: BTreeMap<u32, Vec<&Seat>> = BTreeMap::new();
    for seat in state.seats() {
        rows.entry(seat.row).or_default().push(seat);
    }

    for (_, mut seats) in rows {
        seats.sort_by_key(|s| s.position_in_row);
        if let Some(block) = seats
            .windows(width)
            .find(|window| window.iter().all(|s| s.is_free()))
        {
            return Ok(Some(block.iter().map(|s| s.id).collect()));
        }
    }

    Ok(None)
}

/// Проверяет ручной выбор прямо перед фиксацией.
///
/// Сначала все номера проверяются на существование, затем на занятость;
/// ошибка указывает на наименьший проблемный номер.
pub fn validate_manual_selection(
    state: &SeatState,
    ids: &BTreeSet<SeatId>,
) -> Result<(), BookingError> {
    for &id in ids {
        derive_layout(id)?;
    }
    for &id in ids {
        match state.get(id) {
            Some(seat) if seat.is_free() => {}
            Some(_) => return Err(BookingError::SeatUnavailable(id)),
            None => return Err(BookingError::SeatNotFound(id)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::seat::{initial_state, CAPACITY};
    use crate::models::UserId;
    use proptest::prelude::*;

    fn with_booked(ids: impl IntoIterator<Item = SeatId>) -> SeatState {
        let mut state = initial_state();
        let owner = UserId::from("x@example.com");
        for id in ids {
            state.get_mut(id).unwrap().assign(&owner);
        }
        state
    }

    fn set(ids: &[SeatId]) -> BTreeSet<SeatId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn fresh_state_takes_front_of_first_row() {
        let block = find_contiguous_block(&initial_state(), 3).unwrap();
        assert_eq!(block, Some(set(&[1, 2, 3])));
    }

    #[test]
    fn full_first_row_moves_to_second() {
        let state = with_booked(1..=7);
        let block = find_contiguous_block(&state, 2).unwrap();
        assert_eq!(block, Some(set(&[8, 9])));
    }

    #[test]
    fn window_skips_over_booked_gap() {
        // Ряд 1: свободны 1, 2, затем 4..=7
        let state = with_booked([3]);
        assert_eq!(find_contiguous_block(&state, 2).unwrap(), Some(set(&[1, 2])));
        assert_eq!(find_contiguous_block(&state, 3).unwrap(), Some(set(&[4, 5, 6])));
        assert_eq!(find_contiguous_block(&state, 5).unwrap(), Some(set(&[8, 9, 10, 11, 12])));
    }

    #[test]
    fn short_last_row_never_fits_large_blocks() {
        // Заняты все полные ряды, свободен только короткий ряд 78..=80
        let state = with_booked(1..=77);
        assert_eq!(find_contiguous_block(&state, 5).unwrap(), None);
        assert_eq!(find_contiguous_block(&state, 4).unwrap(), None);
        assert_eq!(find_contiguous_block(&state, 3).unwrap(), Some(set(&[78, 79, 80])));
    }

    #[test]
    fn large_block_ignores_short_row_and_uses_other_rows() {
        let mut booked: Vec<SeatId> = (1..=77).collect();
        booked.retain(|id| !(50..=56).contains(id));
        let state = with_booked(booked);
        assert_eq!(
            find_contiguous_block(&state, 5).unwrap(),
            Some(set(&[50, 51, 52, 53, 54]))
        );
    }

    #[test]
    fn full_coach_has_no_block() {
        let state = with_booked(1..=CAPACITY);
        assert_eq!(find_contiguous_block(&state, 1).unwrap(), None);
    }

    #[test]
    fn count_outside_range_is_invalid() {
        let state = initial_state();
        assert_eq!(find_contiguous_block(&state, 0), Err(BookingError::InvalidCount(0)));
        assert_eq!(find_contiguous_block(&state, 8), Err(BookingError::InvalidCount(8)));
    }

    #[test]
    fn manual_selection_checks_range_then_availability() {
        let state = with_booked([5]);
        assert_eq!(validate_manual_selection(&state, &set(&[1, 2])), Ok(()));
        assert_eq!(
            validate_manual_selection(&state, &set(&[5, 6])),
            Err(BookingError::SeatUnavailable(5))
        );
        assert_eq!(
            validate_manual_selection(&state, &set(&[5, 81])),
            Err(BookingError::SeatNotFound(81))
        );
        assert_eq!(
            validate_manual_selection(&state, &set(&[0])),
            Err(BookingError::SeatNotFound(0))
        );
    }

    fn booked_mask() -> impl Strategy<Value = Vec<bool>> {
        prop::collection::vec(any::<bool>(), CAPACITY as usize)
    }

    fn state_from_mask(mask: &[bool]) -> SeatState {
        with_booked(
            mask.iter()
                .enumerate()
                .filter(|(_, booked)| **booked)
                .map(|(i, _)| i as SeatId + 1),
        )
    }

    // Перебор по возрастанию номера: первый подходящий старт даёт наименьший ряд,
    // а в нём наименьшую позицию
    fn first_block_by_scan(state: &SeatState, count: u32) -> Option<BTreeSet<SeatId>> {
        (1..=CAPACITY).find_map(|start| {
            let first = state.get(start)?;
            let block: Vec<&Seat> = (start..start + count).filter_map(|id| state.get(id)).collect();
            let fits = block.len() == count as usize
                && block.iter().all(|s| s.row == first.row && s.is_free());
            fits.then(|| block.iter().map(|s| s.id).collect())
        })
    }

    proptest! {
        #[test]
        fn block_matches_first_free_window(mask in booked_mask(), count in 1..=ROW_WIDTH) {
            let state = state_from_mask(&mask);
            let found = find_contiguous_block(&state, count).unwrap();
            prop_assert_eq!(&found, &first_block_by_scan(&state, count));

            if let Some(block) = found {
                let seats: Vec<&Seat> = block.iter().map(|id| state.get(*id).unwrap()).collect();
                prop_assert!(seats.iter().all(|s| s.is_free() && s.row == seats[0].row));
                for pair in seats.windows(2) {
                    prop_assert_eq!(pair[1].position_in_row, pair[0].position_in_row + 1);
                }
            }
        }
    }
}
