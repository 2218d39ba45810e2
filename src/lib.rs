pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod cache;
pub mod controllers;
pub mod middleware;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cache::CachedStore;
use crate::config::{Config, StorageBackend};
use crate::error::StoreError;
use crate::session::{MemoryStore, PostgresStore, SessionBoundary, SnapshotStore, UserStore};

// Shared state для всего приложения
pub struct AppState {
    pub config: Config,
    pub session: SessionBoundary,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    /// Хранилища по конфигурации: память, Postgres или Postgres + Redis.
    pub async fn new(config: Config) -> Result<Arc<Self>, StoreError> {
        let state = match (config.storage.backend, config.storage.database.clone()) {
            (StorageBackend::Postgres, Some(db)) => {
                let pg = Arc::new(PostgresStore::connect(&db).await?);
                match config.storage.redis.clone() {
                    Some(redis) => {
                        let cached =
                            Arc::new(CachedStore::connect(&redis.url, pg, redis.snapshot_ttl_seconds).await?);
                        cached.warmup_cache().await;
                        Self::with_stores(config, cached.clone(), cached)
                    }
                    None => Self::with_stores(config, pg.clone(), pg),
                }
            }
            _ => {
                info!("Using in-memory storage, bookings are lost on restart");
                Self::in_memory(config)
            }
        };
        Ok(state)
    }

    pub fn with_stores(
        config: Config,
        snapshots: Arc<dyn SnapshotStore>,
        users: Arc<dyn UserStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            session: SessionBoundary::new(snapshots),
            users,
        })
    }

    pub fn in_memory(config: Config) -> Arc<Self> {
        let store = Arc::new(MemoryStore::new());
        Self::with_stores(config, store.clone(), store)
    }
}

/// Роутер приложения.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Coach Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
