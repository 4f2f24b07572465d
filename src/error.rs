use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status. `message` is what the UI shows.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        AppError::Status { status, message: message.into() }
    }

    /// Human-readable string shown in place of content.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Http(e) if e.is_timeout() => "Request timed out".to_string(),
            AppError::Http(e) if e.is_connect() => "Unable to reach the server".to_string(),
            AppError::Http(_) => "Failed to fetch data".to_string(),
            AppError::Status { message, .. } => message.clone(),
            AppError::Json(_) => "Received malformed data from the server".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Status { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Http(_) | AppError::Json(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.user_message() }))).into_response()
    }
}
