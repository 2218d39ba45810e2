use futures::future::BoxFuture;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::User;
use crate::session::{SnapshotStore, UserStore};

/// Хранилище в памяти процесса: для тестов и локального запуска.
#[derive(Default)]
pub struct MemoryStore {
    snapshot: RwLock<Option<String>>,
    users: RwLock<HashMap<String, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn load_snapshot(&self) -> BoxFuture<'_, Result<Option<String>, StoreError>> {
        Box::pin(async move { Ok(self.snapshot.read().await.clone()) })
    }

    fn save_snapshot(&self, encoded: String) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            *self.snapshot.write().await = Some(encoded);
            Ok(())
        })
    }
}

impl UserStore for MemoryStore {
    fn find_user<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<Option<User>, StoreError>> {
        Box::pin(async move { Ok(self.users.read().await.get(email).cloned()) })
    }

    fn create_user(&self, user: User) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let mut users = self.users.write().await;
            if users.contains_key(&user.email) {
                return Err(StoreError::UserExists(user.email));
            }
            users.insert(user.email.clone(), user);
            Ok(())
        })
    }
}
