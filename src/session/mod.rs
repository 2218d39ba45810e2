//! Граница сессии: кто действует и где живёт снимок состояния мест.
//!
//! Движок бронирования не хранит состояние сам. Перед каждой операцией снимок
//! загружается из `SnapshotStore`, после успешной операции новый снимок сохраняется
//! обратно. Хранилища подключаются через `Arc<dyn ...>`, поэтому в тестах
//! используется `MemoryStore`, а в проде - Postgres с кешем в Redis.

pub mod memory;
pub mod postgres;

use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{ApiError, BookingError, StoreError};
use crate::models::{initial_state, SeatState, User, UserId};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Хранилище сериализованного снимка мест.
///
/// Методы возвращают `BoxFuture`, чтобы трейт оставался object-safe.
pub trait SnapshotStore: Send + Sync {
    fn load_snapshot(&self) -> BoxFuture<'_, Result<Option<String>, StoreError>>;

    fn save_snapshot(&self, encoded: String) -> BoxFuture<'_, Result<(), StoreError>>;
}

/// Хранилище зарегистрированных пользователей.
pub trait UserStore: Send + Sync {
    fn find_user<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<Option<User>, StoreError>>;

    /// `StoreError::UserExists`, если email уже занят.
    fn create_user(&self, user: User) -> BoxFuture<'_, Result<(), StoreError>>;
}

/// Загрузка, сохранение и сериализация фиксации изменений над одним снимком.
pub struct SessionBoundary {
    store: Arc<dyn SnapshotStore>,
    // load -> decide -> save выполняется под одной блокировкой
    commit_lock: Mutex<()>,
}

impl SessionBoundary {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            store,
            commit_lock: Mutex::new(()),
        }
    }

    /// Текущее состояние; отсутствующий или битый снимок заменяется начальным.
    pub async fn load_state(&self) -> Result<SeatState, StoreError> {
        let Some(raw) = self.store.load_snapshot().await? else {
            info!("No seat snapshot found, starting from an empty coach");
            return Ok(initial_state());
        };

        match SeatState::from_snapshot(&raw) {
            Ok(state) => Ok(state),
            Err(e) => {
                warn!("Discarding malformed seat snapshot: {}", e);
                Ok(initial_state())
            }
        }
    }

    pub async fn save_state(&self, state: &SeatState) -> Result<(), StoreError> {
        let encoded = state.to_snapshot()?;
        self.store.save_snapshot(encoded).await
    }

    /// Применяет операцию движка к свежему состоянию и сохраняет результат.
    ///
    /// Без пользователя операция не вызывается. При ошибке движка снимок не меняется.
    pub async fn commit<T, F>(&self, user: Option<&UserId>, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&SeatState, &UserId) -> Result<(SeatState, T), BookingError>,
    {
        let user = user.ok_or(ApiError::Unauthorized)?;

        let _guard = self.commit_lock.lock().await;
        let current = self.load_state().await?;
        let (next, outcome) = op(&current, user)?;
        self.save_state(&next).await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingRequest;
    use crate::services::ledger;

    fn boundary() -> (Arc<MemoryStore>, SessionBoundary) {
        let store = Arc::new(MemoryStore::new());
        let boundary = SessionBoundary::new(store.clone());
        (store, boundary)
    }

    #[tokio::test]
    async fn missing_snapshot_starts_empty() {
        let (_, boundary) = boundary();
        assert_eq!(boundary.load_state().await.unwrap(), initial_state());
    }

    #[tokio::test]
    async fn malformed_snapshot_falls_back_to_initial_state() {
        let (store, boundary) = boundary();
        store.save_snapshot("[{\"id\": 1}]".to_string()).await.unwrap();
        assert_eq!(boundary.load_state().await.unwrap(), initial_state());

        store.save_snapshot("{not json".to_string()).await.unwrap();
        assert_eq!(boundary.load_state().await.unwrap(), initial_state());
    }

    #[tokio::test]
    async fn commit_persists_successful_operations() {
        let (_, boundary) = boundary();
        let user = UserId::from("x@example.com");

        let booked = boundary
            .commit(Some(&user), |state, user| {
                let request = BookingRequest::auto(user.clone(), 2);
                let next = ledger::submit_booking(state, &request)?;
                let count = next.booked_count();
                Ok((next, count))
            })
            .await
            .unwrap();
        assert_eq!(booked, 2);

        let state = boundary.load_state().await.unwrap();
        assert_eq!(ledger::list_bookings_for(&state, &user).len(), 2);
    }

    #[tokio::test]
    async fn failed_operation_leaves_snapshot_untouched() {
        let (store, boundary) = boundary();
        let user = UserId::from("x@example.com");

        let err = boundary
            .commit(Some(&user), |state, user| {
                ledger::cancel(state, 5, user).map(|next| (next, ()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Booking(BookingError::SeatNotBooked(5))));
        assert!(store.load_snapshot().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn anonymous_commit_is_refused() {
        let (_, boundary) = boundary();
        let err = boundary
            .commit(None, |state, _| Ok((state.clone(), ())))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }
}
