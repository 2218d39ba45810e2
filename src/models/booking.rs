use std::collections::BTreeSet;
use std::str::FromStr;

use crate::models::seat::SeatId;
use crate::models::user::UserId;

/// Запрос на бронирование: сколько мест нужно и (необязательно) какие именно.
///
/// Пустой `selection` означает автоматический подбор `count` мест подряд в одном ряду.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub user: UserId,
    pub count: u32,
    pub selection: BTreeSet<SeatId>,
}

impl BookingRequest {
    pub fn auto(user: UserId, count: u32) -> Self {
        BookingRequest {
            user,
            count,
            selection: BTreeSet::new(),
        }
    }

    pub fn manual(user: UserId, count: u32, seats: impl IntoIterator<Item = SeatId>) -> Self {
        BookingRequest {
            user,
            count,
            selection: seats.into_iter().collect(),
        }
    }

    pub fn is_manual(&self) -> bool {
        !self.selection.is_empty()
    }
}

/// Что делать с ручным выбором, в котором меньше мест, чем запрошено.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShortSelectionPolicy {
    /// Отклонить с `IncompleteSelection`.
    #[default]
    Reject,
    /// Проигнорировать выбор и подобрать блок автоматически.
    Auto,
}

impl FromStr for ShortSelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(ShortSelectionPolicy::Reject),
            "auto" => Ok(ShortSelectionPolicy::Auto),
            other => Err(format!("unknown short selection policy '{}'", other)),
        }
    }
}
