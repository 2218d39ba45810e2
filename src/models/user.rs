use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Идентификатор пользователя - его email.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(email: impl Into<String>) -> Self {
        UserId(email.into())
    }
}

impl From<&str> for UserId {
    fn from(email: &str) -> Self {
        UserId(email.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub password_hash: String,
    pub registered_at: NaiveDateTime,
}

impl User {
    /// Новый пользователь с bcrypt-хешем пароля.
    pub fn register(email: &str, password: &str, cost: u32) -> Result<User, bcrypt::BcryptError> {
        let password_hash = bcrypt::hash(password, cost)?;
        Ok(User {
            email: email.to_string(),
            password_hash,
            registered_at: chrono::Utc::now().naive_utc(),
        })
    }

    pub fn id(&self) -> UserId {
        UserId::new(self.email.clone())
    }

    // Битый хеш считаем неверным паролем
    pub fn verify_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.password_hash).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_hashed_and_verified() {
        let user = User::register("a@example.com", "secret1", 4).unwrap();
        assert_ne!(user.password_hash, "secret1");
        assert!(user.verify_password("secret1"));
        assert!(!user.verify_password("secret2"));
        assert_eq!(user.id(), UserId::from("a@example.com"));
    }

    #[test]
    fn corrupt_hash_never_verifies() {
        let user = User {
            email: "a@example.com".to_string(),
            password_hash: "plain".to_string(),
            registered_at: chrono::Utc::now().naive_utc(),
        };
        assert!(!user.verify_password("plain"));
    }
}
