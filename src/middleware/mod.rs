use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;

use crate::models::UserId;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub email: String,
}

/// Разбор заголовка `Authorization: Basic base64(email:password)`.
pub fn parse_basic_credentials(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (email, password) = credentials.split_once(':')?;
    Some((email.to_string(), password.to_string()))
}

// Basic Auth extractor
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let (email, password) =
            parse_basic_credentials(auth_header).ok_or(StatusCode::UNAUTHORIZED)?;
        // При регистрации email приводится к нижнему регистру
        let email = email.trim().to_lowercase();

        let user = state
            .users
            .find_user(&email)
            .await
            .map_err(|e| {
                tracing::error!("user lookup failed: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        // bcrypt медленный - проверяем вне рантайма
        let verified = tokio::task::spawn_blocking(move || user.verify_password(&password))
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        if !verified {
            return Err(StatusCode::UNAUTHORIZED);
        }

        Ok(AuthUser {
            user_id: UserId::new(email.clone()),
            email,
        })
    }
}
