use crate::error_code::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A failure carrying one of the client-facing [`ErrorCode`]s.
    #[error("{}", .0.message())]
    Service(ErrorCode),
}

impl From<ErrorCode> for CoreError {
    fn from(code: ErrorCode) -> Self {
        CoreError::Service(code)
    }
}
