use serde::{Deserialize, Serialize};

use crate::error::{BookingError, SnapshotError};
use crate::models::user::UserId;

/// Номер места в вагоне, от 1 до `CAPACITY`.
pub type SeatId = u32;

/// Количество мест в вагоне.
pub const CAPACITY: u32 = 80;
/// Мест в полном ряду.
pub const ROW_WIDTH: u32 = 7;
/// Рядов в вагоне; последний ряд короткий (80 = 11 * 7 + 3).
pub const ROW_COUNT: u32 = CAPACITY.div_ceil(ROW_WIDTH);

/// Ряд и позиция в ряду (обе с единицы) для номера места.
pub fn derive_layout(id: SeatId) -> Result<(u32, u32), BookingError> {
    if !(1..=CAPACITY).contains(&id) {
        return Err(BookingError::SeatNotFound(id));
    }
    let index = id - 1;
    Ok((index / ROW_WIDTH + 1, index % ROW_WIDTH + 1))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: SeatId,
    pub row: u32,
    pub position_in_row: u32,
    pub is_booked: bool,
    pub owner: Option<UserId>,
}

impl Seat {
    /// Свободное место с раскладкой, вычисленной из номера.
    fn new(id: SeatId) -> Result<Self, BookingError> {
        let (row, position_in_row) = derive_layout(id)?;
        Ok(Seat {
            id,
            row,
            position_in_row,
            is_booked: false,
            owner: None,
        })
    }

    pub fn is_free(&self) -> bool {
        !self.is_booked
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner.as_ref() == Some(user)
    }

    pub(crate) fn assign(&mut self, user: &UserId) {
        self.is_booked = true;
        self.owner = Some(user.clone());
    }

    pub(crate) fn release(&mut self) {
        self.is_booked = false;
        self.owner = None;
    }
}

/// Состояние всех мест вагона, упорядоченное по номеру.
///
/// Собрать значение можно только через `initial_state()` или проверку снимка,
/// поэтому `seats()[i].id == i + 1` и `is_booked == owner.is_some()` выполняются всегда.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Seat>", into = "Vec<Seat>")]
pub struct SeatState {
    seats: Vec<Seat>,
}

/// Все 80 мест свободны.
pub fn initial_state() -> SeatState {
    // Номера 1..=CAPACITY всегда в раскладке
    let seats = (1..=CAPACITY).filter_map(|id| Seat::new(id).ok()).collect();
    SeatState { seats }
}

impl SeatState {
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn get(&self, id: SeatId) -> Option<&Seat> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        self.seats.get(index)
    }

    pub(crate) fn get_mut(&mut self, id: SeatId) -> Option<&mut Seat> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        self.seats.get_mut(index)
    }

    pub fn free_count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_free()).count()
    }

    pub fn booked_count(&self) -> usize {
        self.seats.len() - self.free_count()
    }

    /// Сериализованный снимок: JSON-массив из 80 мест.
    pub fn to_snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.seats)
    }

    /// Разбор снимка со структурной проверкой.
    pub fn from_snapshot(raw: &str) -> Result<Self, SnapshotError> {
        let seats: Vec<Seat> = serde_json::from_str(raw)?;
        SeatState::try_from(seats)
    }
}

impl TryFrom<Vec<Seat>> for SeatState {
    type Error = SnapshotError;

    fn try_from(seats: Vec<Seat>) -> Result<Self, Self::Error> {
        if seats.len() != CAPACITY as usize {
            return Err(SnapshotError::WrongLength(seats.len()));
        }
        for (index, seat) in seats.iter().enumerate() {
            if seat.id as usize != index + 1 {
                return Err(SnapshotError::OutOfOrder { index, id: seat.id });
            }
            let layout = derive_layout(seat.id).map_err(|_| SnapshotError::LayoutMismatch(seat.id))?;
            if layout != (seat.row, seat.position_in_row) {
                return Err(SnapshotError::LayoutMismatch(seat.id));
            }
            if seat.is_booked != seat.owner.is_some() {
                return Err(SnapshotError::OwnershipMismatch(seat.id));
            }
        }
        Ok(SeatState { seats })
    }
}

impl From<SeatState> for Vec<Seat> {
    fn from(state: SeatState) -> Self {
        state.seats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn row_len(row: u32) -> u32 {
        if row == 0 || row > ROW_COUNT {
            return 0;
        }
        (CAPACITY - (row - 1) * ROW_WIDTH).min(ROW_WIDTH)
    }

    #[test]
    fn layout_covers_every_seat_once() {
        let mut seen = HashSet::new();
        for id in 1..=CAPACITY {
            let (row, pos) = derive_layout(id).unwrap();
            assert!((1..=ROW_WIDTH).contains(&pos));
            assert!(pos <= row_len(row));
            assert!(seen.insert((row, pos)), "duplicate layout for seat {id}");
        }
        assert_eq!(seen.len(), CAPACITY as usize);
    }

    #[test]
    fn last_row_is_short() {
        assert_eq!(ROW_COUNT, 12);
        assert_eq!(row_len(11), 7);
        assert_eq!(row_len(12), 3);
        assert_eq!(row_len(13), 0);
        assert_eq!(derive_layout(78).unwrap(), (12, 1));
        assert_eq!(derive_layout(80).unwrap(), (12, 3));
        assert_eq!(derive_layout(8).unwrap(), (2, 1));
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        assert_eq!(derive_layout(0), Err(BookingError::SeatNotFound(0)));
        assert_eq!(derive_layout(81), Err(BookingError::SeatNotFound(81)));
        assert!(Seat::new(81).is_err());
    }

    #[test]
    fn initial_state_is_all_free() {
        let state = initial_state();
        assert_eq!(state.seats().len(), 80);
        assert!(state.seats().iter().all(|s| !s.is_booked && s.owner.is_none()));
        for (i, seat) in state.seats().iter().enumerate() {
            assert_eq!(seat.id as usize, i + 1);
            assert_eq!(*seat, Seat::new(seat.id).unwrap());
        }
        assert_eq!(state.free_count(), 80);
    }

    #[test]
    fn snapshot_roundtrip_keeps_owners() {
        let mut state = initial_state();
        state.get_mut(12).unwrap().assign(&UserId::from("x@example.com"));
        let raw = state.to_snapshot().unwrap();
        let restored = SeatState::from_snapshot(&raw).unwrap();
        assert_eq!(restored, state);
        assert_eq!(restored.booked_count(), 1);
    }

    #[test]
    fn malformed_snapshots_are_rejected() {
        assert!(matches!(
            SeatState::from_snapshot("not json"),
            Err(SnapshotError::Decode(_))
        ));

        let mut seats: Vec<Seat> = initial_state().into();
        seats.pop();
        assert!(matches!(
            SeatState::try_from(seats),
            Err(SnapshotError::WrongLength(79))
        ));

        let mut seats: Vec<Seat> = initial_state().into();
        seats[3].row = 5;
        assert!(matches!(
            SeatState::try_from(seats),
            Err(SnapshotError::LayoutMismatch(4))
        ));

        let mut seats: Vec<Seat> = initial_state().into();
        seats[0].is_booked = true;
        assert!(matches!(
            SeatState::try_from(seats),
            Err(SnapshotError::OwnershipMismatch(1))
        ));

        let mut seats: Vec<Seat> = initial_state().into();
        seats.swap(0, 1);
        assert!(matches!(
            SeatState::try_from(seats),
            Err(SnapshotError::OutOfOrder { index: 0, id: 2 })
        ));
    }

    proptest! {
        #[test]
        fn layout_is_deterministic_and_injective(a in 1..=CAPACITY, b in 1..=CAPACITY) {
            prop_assert_eq!(derive_layout(a), derive_layout(a));
            if a != b {
                prop_assert_ne!(derive_layout(a).unwrap(), derive_layout(b).unwrap());
            }
        }
    }
}
