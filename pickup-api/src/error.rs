use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pickup_core::CoreError;
use pickup_reminder::ReminderError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    /// Message is already caller-safe; provider detail was logged where it happened
    UpstreamError(String),
    SchedulingFault(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::UpstreamError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::SchedulingFault(msg) => {
                tracing::error!("Reminder error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(msg) => AppError::ValidationError(msg),
            CoreError::UpstreamUnavailable(msg) => AppError::UpstreamError(msg),
        }
    }
}

impl From<ReminderError> for AppError {
    fn from(err: ReminderError) -> Self {
        match err {
            ReminderError::InvalidInput(msg) => AppError::ValidationError(msg),
            ReminderError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            ReminderError::AlreadySettled(_) => AppError::ConflictError(err.to_string()),
            ReminderError::SchedulingFault(msg) => AppError::SchedulingFault(msg),
            ReminderError::RegistryFull => AppError::SchedulingFault(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}
