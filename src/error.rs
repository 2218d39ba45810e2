//! error.rs
//!
//! Типы ошибок сервиса:
//! - `BookingError` - ожидаемые бизнес-исходы (место занято, блок не найден и т.д.),
//!   каждый со стабильным кодом причины;
//! - `SnapshotError` - структурно некорректный снимок состояния мест;
//! - `StoreError` - сбои хранилищ (Postgres, Redis, сериализация);
//! - `ApiError` - то, что уходит клиенту по HTTP.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::seat::{SeatId, CAPACITY, ROW_WIDTH};

/// Статус 419 используется для конфликтов бронирования (как и в остальных ручках).
pub fn status_419() -> StatusCode {
    StatusCode::from_u16(419).unwrap_or(StatusCode::CONFLICT)
}

/// Бизнес-ошибки движка бронирования. Все восстановимы и возвращаются как значения.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("requested seat count {0} is outside 1..={max}", max = ROW_WIDTH)]
    InvalidCount(u32),

    #[error("seat {0} does not exist (valid ids are 1..={max})", max = CAPACITY)]
    SeatNotFound(SeatId),

    #[error("seat {0} is already booked")]
    SeatUnavailable(SeatId),

    #[error("selected seat {0} was booked before the request was committed")]
    SelectionStale(SeatId),

    #[error("selected {selected} of {requested} requested seats")]
    IncompleteSelection { selected: usize, requested: u32 },

    #[error("selected {selected} seats but only {requested} were requested")]
    SelectionExceedsCount { selected: usize, requested: u32 },

    #[error("no row has {0} contiguous free seats")]
    NoBlockAvailable(u32),

    #[error("seat {0} is not booked")]
    SeatNotBooked(SeatId),

    #[error("seat {0} is booked by another user")]
    NotOwner(SeatId),

    #[error("seat {0} changed concurrently, retry the request")]
    Conflict(SeatId),
}

impl BookingError {
    /// Стабильный машиночитаемый код причины.
    pub fn reason_code(&self) -> &'static str {
        match self {
            BookingError::InvalidCount(_) => "INVALID_COUNT",
            BookingError::SeatNotFound(_) => "SEAT_NOT_FOUND",
            BookingError::SeatUnavailable(_) => "SEAT_UNAVAILABLE",
            BookingError::SelectionStale(_) => "SELECTION_STALE",
            BookingError::IncompleteSelection { .. } => "INCOMPLETE_SELECTION",
            BookingError::SelectionExceedsCount { .. } => "SELECTION_EXCEEDS_COUNT",
            BookingError::NoBlockAvailable(_) => "NO_BLOCK_AVAILABLE",
            BookingError::SeatNotBooked(_) => "SEAT_NOT_BOOKED",
            BookingError::NotOwner(_) => "NOT_OWNER",
            BookingError::Conflict(_) => "CONFLICT",
        }
    }

    /// Имеет ли смысл повторить тот же запрос без изменений.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::Conflict(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::InvalidCount(_)
            | BookingError::IncompleteSelection { .. }
            | BookingError::SelectionExceedsCount { .. } => StatusCode::BAD_REQUEST,
            BookingError::SeatNotFound(_) => StatusCode::NOT_FOUND,
            BookingError::NotOwner(_) => StatusCode::FORBIDDEN,
            BookingError::SeatUnavailable(_)
            | BookingError::SelectionStale(_)
            | BookingError::NoBlockAvailable(_)
            | BookingError::SeatNotBooked(_)
            | BookingError::Conflict(_) => status_419(),
        }
    }
}

/// Снимок состояния не прошёл структурную проверку.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("snapshot holds {0} seats, expected {expected}", expected = CAPACITY)]
    WrongLength(usize),

    #[error("seat at index {index} has id {id}")]
    OutOfOrder { index: usize, id: SeatId },

    #[error("seat {0} does not match the coach layout")]
    LayoutMismatch(SeatId),

    #[error("seat {0} booking flag disagrees with its owner")]
    OwnershipMismatch(SeatId),
}

/// Ошибки слоя хранения (граница сессии).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("user {0} already exists")]
    UserExists(String),
}

/// Ошибка HTTP-уровня.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Validation(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let retryable = matches!(&self, ApiError::Booking(e) if e.is_retryable());
        let (status, code, message) = match &self {
            ApiError::Booking(e) => (e.status_code(), e.reason_code(), e.to_string()),
            ApiError::Store(StoreError::UserExists(email)) => (
                StatusCode::CONFLICT,
                "USER_EXISTS",
                format!("Пользователь {} уже зарегистрирован", email),
            ),
            ApiError::Store(e) => {
                tracing::error!("store error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "Ошибка хранилища".to_string(),
                )
            }
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Требуется авторизация".to_string(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Внутренняя ошибка".to_string(),
                )
            }
        };

        (
            status,
            Json(json!({ "error": code, "message": message, "retryable": retryable })),
        )
            .into_response()
    }
}
