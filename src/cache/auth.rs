use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::cache::{CacheBackend, CachedStore};
use crate::error::StoreError;
use crate::models::User;
use crate::session::{SnapshotStore, UserStore};

const USER_TTL_SECONDS: u64 = 900;

fn user_key(email: &str) -> String {
    format!("auth:user:{}", email)
}

impl<S, C> CachedStore<S, C>
where
    S: SnapshotStore + UserStore + 'static,
    C: CacheBackend + 'static,
{
    /// Пользователь из кеша авторизации
    async fn get_cached_user(&self, email: &str) -> Option<User> {
        let data = match self.cache.fetch(&user_key(email)).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Redis read failed for user {}: {}", email, e);
                return None;
            }
        };
        data.and_then(|json| serde_json::from_str(&json).ok())
    }

    /// Сохранить пользователя в кеш авторизации
    async fn cache_user(&self, user: &User) {
        let Ok(data) = serde_json::to_string(user) else {
            return;
        };
        let key = user_key(&user.email);
        if let Err(e) = self.cache.store(&key, &data, USER_TTL_SECONDS).await {
            warn!("Failed to cache user {}: {}", user.email, e);
        }
    }
}

impl<S, C> UserStore for CachedStore<S, C>
where
    S: SnapshotStore + UserStore + 'static,
    C: CacheBackend + 'static,
{
    fn find_user<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<Option<User>, StoreError>> {
        Box::pin(async move {
            if let Some(user) = self.get_cached_user(email).await {
                debug!("auth cache hit for {}", email);
                return Ok(Some(user));
            }

            let user = self.inner.find_user(email).await?;
            if let Some(ref user) = user {
                self.cache_user(user).await;
            }
            Ok(user)
        })
    }

    fn create_user(&self, user: User) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.inner.create_user(user.clone()).await?;
            self.cache_user(&user).await;
            Ok(())
        })
    }
}
