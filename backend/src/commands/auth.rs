use crate::db::UserCredentials;
use crate::error::{SagipError, SagipResult};
use crate::middleware::auth::issue_token;
use crate::state::AppState;
use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LoginUser {
    pub id: i32,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

/// Unknown email and wrong password both surface as
/// [`SagipError::InvalidCredentials`].
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> SagipResult<Json<LoginResponse>> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(SagipError::InvalidCredentials);
    }

    let user = sqlx::query_as::<_, UserCredentials>(
        "SELECT id, email, password_hash FROM users WHERE email = $1",
    )
    .bind(payload.email.trim())
    .fetch_optional(&state.pool)
    .await?
    .ok_or(SagipError::InvalidCredentials)?;

    if !bcrypt::verify(&payload.password, &user.password_hash)? {
        tracing::info!("Failed login for {}", user.email);
        return Err(SagipError::InvalidCredentials);
    }

    let token = issue_token(&state.config.jwt_secret, user.id, &user.email)?;
    tracing::info!("User {} logged in", user.email);

    Ok(Json(LoginResponse {
        token,
        user: LoginUser {
            id: user.id,
            email: user.email,
        },
    }))
}
