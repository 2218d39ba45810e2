//! Кеш в Redis перед долговременным хранилищем.
//!
//! Чтение: сначала Redis, при промахе - хранилище, затем прогрев кеша.
//! Запись: сначала хранилище, затем обновление кеша. Ошибки Redis только логируются,
//! запрос из-за них не падает.
//!
//! Если после записи в хранилище кеш не удалось ни обновить, ни очистить, в Redis
//! может остаться устаревший снимок. Тогда кеш пропускается при чтении, пока
//! очередная запись в него не пройдёт успешно.

pub mod auth;

use futures::future::BoxFuture;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client, RedisResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::session::{SnapshotStore, UserStore};

pub(crate) const SNAPSHOT_KEY: &str = "seats:snapshot";

/// Минимальный набор команд кеша, которым пользуется `CachedStore`.
pub trait CacheBackend: Send + Sync {
    fn fetch<'a>(&'a self, key: &'a str) -> BoxFuture<'a, RedisResult<Option<String>>>;

    fn store<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        ttl_seconds: u64,
    ) -> BoxFuture<'a, RedisResult<()>>;

    fn evict<'a>(&'a self, key: &'a str) -> BoxFuture<'a, RedisResult<()>>;
}

impl CacheBackend for MultiplexedConnection {
    fn fetch<'a>(&'a self, key: &'a str) -> BoxFuture<'a, RedisResult<Option<String>>> {
        let mut conn = self.clone();
        Box::pin(async move { conn.get(key).await })
    }

    fn store<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        ttl_seconds: u64,
    ) -> BoxFuture<'a, RedisResult<()>> {
        let mut conn = self.clone();
        Box::pin(async move { conn.set_ex(key, value, ttl_seconds).await })
    }

    fn evict<'a>(&'a self, key: &'a str) -> BoxFuture<'a, RedisResult<()>> {
        let mut conn = self.clone();
        Box::pin(async move { conn.del(key).await })
    }
}

pub struct CachedStore<S, C = MultiplexedConnection> {
    cache: C,
    inner: Arc<S>,
    snapshot_ttl_seconds: u64,
    // Кеш мог остаться со старым снимком: читать только из хранилища
    bypass_snapshot: AtomicBool,
}

impl<S> CachedStore<S, MultiplexedConnection>
where
    S: SnapshotStore + UserStore + 'static,
{
    pub async fn connect(
        redis_url: &str,
        inner: Arc<S>,
        snapshot_ttl_seconds: u64,
    ) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)?;
        let conn = client.get_multiplexed_tokio_connection().await?;
        info!("Redis connected");
        Ok(Self::with_cache(conn, inner, snapshot_ttl_seconds))
    }
}

impl<S, C> CachedStore<S, C>
where
    S: SnapshotStore + UserStore + 'static,
    C: CacheBackend + 'static,
{
    pub fn with_cache(cache: C, inner: Arc<S>, snapshot_ttl_seconds: u64) -> Self {
        Self {
            cache,
            inner,
            snapshot_ttl_seconds,
            bypass_snapshot: AtomicBool::new(false),
        }
    }

    // Прогрев кеша при старте
    pub async fn warmup_cache(&self) {
        info!("Starting cache warmup...");
        match self.inner.load_snapshot().await {
            Ok(Some(snapshot)) => self.put_snapshot(&snapshot).await,
            Ok(None) => info!("No snapshot to warm up"),
            Err(e) => warn!("Cache warmup failed: {}", e),
        }
        info!("Cache warmup done");
    }

    async fn put_snapshot(&self, snapshot: &str) {
        match self
            .cache
            .store(SNAPSHOT_KEY, snapshot, self.snapshot_ttl_seconds)
            .await
        {
            Ok(()) => {
                if self.bypass_snapshot.swap(false, Ordering::SeqCst) {
                    info!("Seat snapshot cache is back in sync");
                }
            }
            Err(e) => {
                warn!("Failed to cache seat snapshot: {}", e);
                self.invalidate_snapshot().await;
            }
        }
    }

    // Инвалидировать кеш снимка
    pub async fn invalidate_snapshot(&self) {
        match self.cache.evict(SNAPSHOT_KEY).await {
            Ok(()) => info!("Invalidated seat snapshot cache"),
            Err(e) => {
                warn!(
                    "Failed to invalidate seat snapshot cache, reading from store until it recovers: {}",
                    e
                );
                self.bypass_snapshot.store(true, Ordering::SeqCst);
            }
        }
    }
}

impl<S, C> SnapshotStore for CachedStore<S, C>
where
    S: SnapshotStore + UserStore + 'static,
    C: CacheBackend + 'static,
{
    fn load_snapshot(&self) -> BoxFuture<'_, Result<Option<String>, StoreError>> {
        Box::pin(async move {
            if self.bypass_snapshot.load(Ordering::SeqCst) {
                debug!("Seat snapshot cache is bypassed");
            } else {
                match self.cache.fetch(SNAPSHOT_KEY).await {
                    Ok(Some(snapshot)) => return Ok(Some(snapshot)),
                    Ok(None) => {}
                    Err(e) => warn!("Redis read failed, falling back to store: {}", e),
                }
            }

            let snapshot = self.inner.load_snapshot().await?;
            if let Some(ref snapshot) = snapshot {
                self.put_snapshot(snapshot).await;
            }
            Ok(snapshot)
        })
    }

    fn save_snapshot(&self, encoded: String) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            if let Err(e) = self.inner.save_snapshot(encoded.clone()).await {
                // Кеш не должен пережить неудачную запись
                self.invalidate_snapshot().await;
                return Err(e);
            }
            self.put_snapshot(&encoded).await;
            Ok(())
        })
    }
}
