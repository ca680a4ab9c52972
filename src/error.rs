use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// The one user-facing failure message. Every upstream failure mode (empty
/// payload, schema violation, transport error) collapses into this string;
/// the technical cause only ever reaches the logs.
pub const SERVICE_ERROR_MESSAGE: &str =
    "مشکلی در یافتن دقیق عطرها یا تصاویر آن‌ها پیش آمد. لطفاً دوباره امتحان کنید.";

/// Opaque failure of the recommendation service.
///
/// Deliberately carries no detail: the provider logs the real cause before
/// constructing this, and the session only needs the stable localized message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{}", SERVICE_ERROR_MESSAGE)]
pub struct ServiceError;

impl ServiceError {
    /// The stable localized message shown to the user.
    pub fn user_message(&self) -> &'static str {
        SERVICE_ERROR_MESSAGE
    }
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
