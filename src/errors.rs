// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("League not found: {0}")]
    LeagueNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Invalid gameweek: {0}")]
    InvalidGameweek(u32),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Gameweek {0} is finalized")]
    GameweekFinalized(u32),

    #[error("Predictions locked for matches: {0}")]
    PredictionsLocked(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::MongoDB(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
            AppError::StorageError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Storage error"),
            AppError::LeagueNotFound(_) => (StatusCode::NOT_FOUND, "League not found"),
            AppError::UserNotFound(_) => (StatusCode::NOT_FOUND, "User not found"),
            AppError::InvalidGameweek(_) => (StatusCode::BAD_REQUEST, "Invalid gameweek"),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "Validation failed"),
            AppError::GameweekFinalized(_) => (StatusCode::CONFLICT, "Gameweek finalized"),
            AppError::PredictionsLocked(_) => (StatusCode::CONFLICT, "Predictions locked"),
            AppError::ConfigurationError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error")
            }
        };

        if status.is_server_error() {
            tracing::error!("❌ {}", self);
        }

        let body = Json(json!({
            "error": error_message,
            "message": self.to_string(),
            "success": false,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::StorageError(format!("BSON encoding failed: {}", err))
    }
}

impl From<mongodb::bson::de::Error> for AppError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        AppError::StorageError(format!("BSON decoding failed: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

// Helper conversion functions
impl AppError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        AppError::StorageError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
