use futures::future::BoxFuture;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::models::User;
use crate::session::{SnapshotStore, UserStore};

/// Postgres: таблица `users` и однострочная `seat_snapshots`.
#[derive(Clone)]
pub struct PostgresStore {
    pub pool: PgPool,
}

impl PostgresStore {
    /// Подключение к базе и прогон миграций.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.url)
            .await?;
        info!("Database connected");

        info!("Running database migrations...");
        sqlx::migrate!("./src/migrations").run(&pool).await?;
        info!("Migrations completed");

        Ok(PostgresStore { pool })
    }
}

impl SnapshotStore for PostgresStore {
    fn load_snapshot(&self) -> BoxFuture<'_, Result<Option<String>, StoreError>> {
        Box::pin(async move {
            let snapshot = sqlx::query_scalar::<_, String>(
                "SELECT snapshot FROM seat_snapshots WHERE id = 1",
            )
            .fetch_optional(&self.pool)
            .await?;
            Ok(snapshot)
        })
    }

    fn save_snapshot(&self, encoded: String) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            // last write wins
            sqlx::query(
                r#"
                INSERT INTO seat_snapshots (id, snapshot, updated_at)
                VALUES (1, $1, NOW())
                ON CONFLICT (id) DO UPDATE
                SET snapshot = EXCLUDED.snapshot, updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(encoded)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
    }
}

impl UserStore for PostgresStore {
    fn find_user<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<Option<User>, StoreError>> {
        Box::pin(async move {
            let user = sqlx::query_as::<_, User>(
                "SELECT email, password_hash, registered_at FROM users WHERE email = $1",
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
            Ok(user)
        })
    }

    fn create_user(&self, user: User) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let inserted = sqlx::query(
                r#"
                INSERT INTO users (email, password_hash, registered_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (email) DO NOTHING
                "#,
            )
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.registered_at)
            .execute(&self.pool)
            .await?
            .rows_affected();

            if inserted == 0 {
                return Err(StoreError::UserExists(user.email));
            }
            Ok(())
        })
    }
}
