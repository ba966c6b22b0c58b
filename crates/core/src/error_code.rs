//! Client-facing error taxonomy.
//!
//! Every failure that reaches a client, either synchronously from the
//! submission endpoint or asynchronously through the notification channel,
//! carries one of these codes. Numeric codes are part of the wire contract
//! and must not be renumbered.

/// Broad category of an [`ErrorCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input rejected before a task exists.
    Validation,
    /// Task was created but its queue message could not be published.
    QueueDispatch,
    /// The remote transformer answered with an error.
    RemoteService,
    /// Anything unexpected.
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidRequest,
    FileFormatNotSupported,
    EmptyFile,
    FileTooLarge,
    UserNotAuthorized,
    StyleNotFound,
    StyleNotSupported,
    InvalidIntensity,
    TaskNotFound,
    QueueDispatchFailed,
    TransformerError,
    InternalError,
}

impl ErrorCode {
    /// Numeric code sent as `errorCode`.
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::InvalidRequest => -1,
            ErrorCode::FileFormatNotSupported => -8,
            ErrorCode::EmptyFile => -9,
            ErrorCode::FileTooLarge => -10,
            ErrorCode::UserNotAuthorized => -11,
            ErrorCode::StyleNotFound => -15,
            ErrorCode::StyleNotSupported => -16,
            ErrorCode::InvalidIntensity => -17,
            ErrorCode::TaskNotFound => -18,
            ErrorCode::QueueDispatchFailed => -103,
            ErrorCode::TransformerError => -104,
            ErrorCode::InternalError => -105,
        }
    }

    /// Human-readable message sent as `errorMessage`.
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "Bad request",
            ErrorCode::FileFormatNotSupported => "File format is not supported",
            ErrorCode::EmptyFile => "Empty file",
            ErrorCode::FileTooLarge => "File too large",
            ErrorCode::UserNotAuthorized => "User is not authorized",
            ErrorCode::StyleNotFound => "Style is not found",
            ErrorCode::StyleNotSupported => "Style is not supported",
            ErrorCode::InvalidIntensity => "Intensity must be a number between 0 and 1",
            ErrorCode::TaskNotFound => "Task is not found",
            ErrorCode::QueueDispatchFailed => "Failed to push task to the queue",
            ErrorCode::TransformerError => "Error on transformer",
            ErrorCode::InternalError => "Internal error",
        }
    }

    /// Stable upper-case name used as the `code` field of HTTP error bodies.
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::FileFormatNotSupported => "FILE_FORMAT_NOT_SUPPORTED",
            ErrorCode::EmptyFile => "EMPTY_FILE",
            ErrorCode::FileTooLarge => "FILE_TOO_LARGE",
            ErrorCode::UserNotAuthorized => "USER_NOT_AUTHORIZED",
            ErrorCode::StyleNotFound => "STYLE_NOT_FOUND",
            ErrorCode::StyleNotSupported => "STYLE_NOT_SUPPORTED",
            ErrorCode::InvalidIntensity => "INVALID_INTENSITY",
            ErrorCode::TaskNotFound => "TASK_NOT_FOUND",
            ErrorCode::QueueDispatchFailed => "QUEUE_DISPATCH_FAILED",
            ErrorCode::TransformerError => "TRANSFORMER_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// HTTP status used when the code is returned synchronously.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::InvalidRequest | ErrorCode::EmptyFile | ErrorCode::InvalidIntensity => 400,
            ErrorCode::UserNotAuthorized => 401,
            ErrorCode::StyleNotFound | ErrorCode::TaskNotFound => 404,
            ErrorCode::StyleNotSupported => 410,
            ErrorCode::FileTooLarge => 413,
            ErrorCode::FileFormatNotSupported => 415,
            ErrorCode::QueueDispatchFailed
            | ErrorCode::TransformerError
            | ErrorCode::InternalError => 500,
        }
    }

    pub fn kind(self) -> ErrorKind {
        match self {
            ErrorCode::QueueDispatchFailed => ErrorKind::QueueDispatch,
            ErrorCode::TransformerError => ErrorKind::RemoteService,
            ErrorCode::InternalError => ErrorKind::Internal,
            _ => ErrorKind::Validation,
        }
    }
}
