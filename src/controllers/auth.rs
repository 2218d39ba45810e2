use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::User;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
}

#[derive(Debug, Serialize)]
struct UserResponse {
    email: String,
}

// POST /api/auth/signup
#[derive(Debug, Deserialize, Validate)]
struct SignupRequest {
    #[validate(email(message = "Некорректный email"))]
    email: String,
    #[validate(length(max = 128, message = "Слишком длинный пароль"))]
    password: String,
}

async fn signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let min_len = state.config.auth.min_password_length;
    if req.password.chars().count() < min_len {
        return Err(ApiError::Validation(format!(
            "Пароль должен быть не короче {} символов",
            min_len
        )));
    }

    let email = req.email.trim().to_lowercase();
    let cost = state.config.auth.bcrypt_cost;
    let password = req.password;
    let hash_email = email.clone();
    let user = tokio::task::spawn_blocking(move || User::register(&hash_email, &password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing task failed: {}", e)))?
        .map_err(|e| ApiError::Store(e.into()))?;

    state.users.create_user(user).await?;
    tracing::info!("Registered user {}", email);

    Ok((StatusCode::CREATED, Json(UserResponse { email })))
}

// POST /api/auth/login
// Сессий нет: каждый запрос несёт Basic-авторизацию, здесь только проверка пары email/пароль.
async fn login(user: AuthUser) -> Json<UserResponse> {
    Json(UserResponse { email: user.email })
}
