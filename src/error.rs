use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Duplicate(String),
    #[error("Room not found")]
    RoomNotFound,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Incorrect PIN")]
    WrongPin,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("stored document is corrupt: {0}")]
    CorruptDocument(#[from] serde_json::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Duplicate(_) => StatusCode::BAD_REQUEST,
            AppError::RoomNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::WrongPin => StatusCode::FORBIDDEN,
            AppError::Database(_) | AppError::CorruptDocument(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Server faults keep their detail out of the client-facing
        // message and inside `details`.
        let body = if status.is_server_error() {
            error!("request failed: {self:#}");
            json!({ "error": "Backend Error", "details": self.to_string() })
        } else {
            json!({ "error": self.to_string() })
        };
        (status, Json(body)).into_response()
    }
}
