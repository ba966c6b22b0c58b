//! The [`Transformer`] seam and its tagged outcome.
//!
//! Error mapping:
//! - 5xx from the service -> [`ErrorCode::TransformerError`]
//! - 4xx from the service -> [`ErrorCode::InternalError`] (we built a bad request)
//! - anything else (network, timeout, bad body) -> [`TransformOutcome::Internal`]

use async_trait::async_trait;
use stylist_core::error_code::ErrorCode;

use crate::api::{TransformRequest, TransformResponse, TransformerApi, TransformerError};

/// Result of one transformer call, as seen by the worker.
#[derive(Debug, Clone)]
pub enum TransformOutcome {
    Completed(TransformResponse),
    /// The service answered with an error status.
    ServiceError(ErrorCode),
    /// The call never produced a usable answer.
    Internal(String),
}

impl TransformOutcome {
    /// Client-facing code for a failed outcome, `None` on success.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            TransformOutcome::Completed(_) => None,
            TransformOutcome::ServiceError(code) => Some(*code),
            TransformOutcome::Internal(_) => Some(ErrorCode::InternalError),
        }
    }
}

/// Map a raw client result onto a [`TransformOutcome`].
pub fn classify(result: Result<TransformResponse, TransformerError>) -> TransformOutcome {
    match result {
        Ok(response) => TransformOutcome::Completed(response),
        Err(TransformerError::ApiError { status, body }) => {
            tracing::error!(status, body = %body, "Transformer returned an error");
            if status >= 500 {
                TransformOutcome::ServiceError(ErrorCode::TransformerError)
            } else if status >= 400 {
                TransformOutcome::ServiceError(ErrorCode::InternalError)
            } else {
                TransformOutcome::Internal(format!("unexpected status {status}"))
            }
        }
        Err(TransformerError::Request(e)) => {
            tracing::error!(error = %e, timeout = e.is_timeout(), "Transformer request failed");
            TransformOutcome::Internal(e.to_string())
        }
    }
}

/// Remote style-transfer service.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(&self, request: TransformRequest) -> TransformOutcome;

    async fn styles(&self) -> Result<Vec<String>, TransformerError>;
}

/// [`Transformer`] backed by [`TransformerApi`].
pub struct HttpTransformer {
    api: TransformerApi,
}

impl HttpTransformer {
    pub fn new(api: TransformerApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Transformer for HttpTransformer {
    async fn transform(&self, request: TransformRequest) -> TransformOutcome {
        classify(self.api.process(&request).await)
    }

    async fn styles(&self) -> Result<Vec<String>, TransformerError> {
        self.api.styles().await
    }
}
