use axum::{
    extract::{multipart::MultipartError, rejection::PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SagipError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

pub type SagipResult<T> = Result<T, SagipError>;

impl From<PathRejection> for SagipError {
    fn from(rejection: PathRejection) -> Self {
        SagipError::Validation(rejection.body_text())
    }
}

impl SagipError {
    pub fn status(&self) -> StatusCode {
        match self {
            SagipError::NotFound(_) => StatusCode::NOT_FOUND,
            SagipError::Validation(_)
            | SagipError::InvalidCredentials
            | SagipError::Multipart(_) => StatusCode::BAD_REQUEST,
            SagipError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SagipError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            SagipError::NotFound(msg) | SagipError::Validation(msg) => msg,
            SagipError::InvalidCredentials | SagipError::Unauthorized => self.to_string(),
            SagipError::Multipart(ref e) => {
                tracing::warn!("Rejected multipart body: {}", e);
                "Malformed multipart body".to_string()
            }
            SagipError::Database(ref e) => {
                tracing::error!("Database Error: {:?}", e);
                "Server error".to_string()
            }
            SagipError::Io(ref e) => {
                tracing::error!("IO Error: {:?}", e);
                "Server error".to_string()
            }
            _ => {
                tracing::error!("Unhandled Error: {:?}", self);
                "Server error".to_string()
            }
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status_codes() {
        assert_eq!(
            SagipError::NotFound("Pest not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SagipError::InvalidCredentials.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(SagipError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            SagipError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn credential_failures_do_not_say_which_field_was_wrong() {
        assert_eq!(
            SagipError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }
}
