use std::env;
use std::str::FromStr;

use crate::models::ShortSelectionPolicy;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub booking: BookingConfig,
}

// Настройки приложения
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

// Где хранятся снимок мест и пользователи
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database: Option<DatabaseConfig>,
    pub redis: Option<RedisConfig>,
}

// Настройки базы данных
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Настройки Redis (кеш снимка мест)
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub snapshot_ttl_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
    pub min_password_length: usize,
}

#[derive(Debug, Clone)]
pub struct BookingConfig {
    pub short_selection_policy: ShortSelectionPolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("{0} must be set")]
    Missing(&'static str),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                environment: "development".to_string(),
                rust_log: "coach_booking=debug,tower_http=debug".to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                database: None,
                redis: None,
            },
            auth: AuthConfig {
                bcrypt_cost: bcrypt::DEFAULT_COST,
                min_password_length: 6,
            },
            booking: BookingConfig {
                short_selection_policy: ShortSelectionPolicy::Reject,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Сборка конфигурации из произвольного источника переменных.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let backend = match lookup("STORAGE_BACKEND") {
            None => defaults.storage.backend,
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "postgres" => StorageBackend::Postgres,
                _ => return Err(ConfigError::Invalid { key: "STORAGE_BACKEND", value: v }),
            },
        };

        let database = match lookup("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                pool_size: parse_or(&lookup, "DB_POOL_SIZE", 10)?,
            }),
            None if backend == StorageBackend::Postgres => {
                return Err(ConfigError::Missing("DATABASE_URL"))
            }
            None => None,
        };

        let redis = match lookup("REDIS_URL") {
            Some(url) => Some(RedisConfig {
                url,
                snapshot_ttl_seconds: parse_or(&lookup, "SNAPSHOT_CACHE_TTL_SECONDS", 86400)?,
            }),
            None => None,
        };

        Ok(Config {
            app: AppConfig {
                host: lookup("HOST").unwrap_or(defaults.app.host),
                port: parse_or(&lookup, "PORT", defaults.app.port)?,
                environment: lookup("ENVIRONMENT").unwrap_or(defaults.app.environment),
                rust_log: lookup("RUST_LOG").unwrap_or(defaults.app.rust_log),
            },
            storage: StorageConfig {
                backend,
                database,
                redis,
            },
            auth: AuthConfig {
                bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", defaults.auth.bcrypt_cost)?,
                min_password_length: parse_or(
                    &lookup,
                    "MIN_PASSWORD_LENGTH",
                    defaults.auth.min_password_length,
                )?,
            },
            booking: BookingConfig {
                short_selection_policy: parse_or(
                    &lookup,
                    "SHORT_SELECTION_POLICY",
                    defaults.booking.short_selection_policy,
                )?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_memory_backend() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.storage.database.is_none());
        assert_eq!(config.app.port, 8000);
        assert_eq!(config.booking.short_selection_policy, ShortSelectionPolicy::Reject);
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        let err = Config::from_lookup(lookup(&[("STORAGE_BACKEND", "postgres")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));

        let config = Config::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://localhost/coach"),
            ("REDIS_URL", "redis://localhost"),
            ("SHORT_SELECTION_POLICY", "auto"),
        ]))
        .unwrap();
        assert_eq!(config.storage.database.unwrap().pool_size, 10);
        assert_eq!(config.storage.redis.unwrap().snapshot_ttl_seconds, 86400);
        assert_eq!(config.booking.short_selection_policy, ShortSelectionPolicy::Auto);
    }

    #[test]
    fn bad_numbers_are_reported() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }
}
