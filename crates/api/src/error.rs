use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use stylist_core::error::CoreError;
use stylist_core::error_code::ErrorCode;

use crate::engine::submission::SubmissionError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `stylist_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<ErrorCode> for AppError {
    fn from(code: ErrorCode) -> Self {
        AppError::Core(CoreError::Service(code))
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Rejected(code) => code.into(),
            SubmissionError::Store(e) => AppError::Database(e),
            SubmissionError::Join(e) => AppError::InternalError(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, error_code) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
                CoreError::Unauthorized(msg) => (
                    StatusCode::UNAUTHORIZED,
                    ErrorCode::UserNotAuthorized.name(),
                    msg.clone(),
                    Some(ErrorCode::UserNotAuthorized.code()),
                ),
                CoreError::Forbidden(msg) => {
                    (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone(), None)
                }
                CoreError::Service(service) => service_error(*service),
            },

            // --- Store errors ---
            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                internal()
            }

            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(error_code) = error_code {
            body["errorCode"] = json!(error_code);
        }

        (status, axum::Json(body)).into_response()
    }
}

type ErrorParts = (StatusCode, &'static str, String, Option<i32>);

fn service_error(code: ErrorCode) -> ErrorParts {
    let status =
        StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(code = code.name(), "Request failed with server error");
    }
    (status, code.name(), code.message().to_string(), Some(code.code()))
}

/// Store and runtime failures never leak their details to the client.
fn internal() -> ErrorParts {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::InternalError.name(),
        "An internal error occurred".to_string(),
        Some(ErrorCode::InternalError.code()),
    )
}
