//! REST API client for the transformer HTTP endpoints.
//!
//! Wraps `POST /api/v1/process` and `GET /api/v1/styles` using
//! [`reqwest`]. The connect and read timeouts are both set to the
//! configured transformer timeout.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP client for a single transformer instance.
pub struct TransformerApi {
    client: reqwest::Client,
    api_url: String,
}

/// Body of `POST /api/v1/process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformRequest {
    /// Base64 encoded source image.
    pub image: String,
    pub style: String,
    /// Transfer intensity in `[0, 1]`.
    pub strength: f64,
    pub api_key: String,
}

/// Successful response of `POST /api/v1/process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformResponse {
    /// Base64 encoded result image.
    pub processed_image: String,
    /// Seconds spent on the remote side.
    pub processing_time: f64,
    pub style: String,
}

#[derive(Debug, Deserialize)]
struct StylesResponse {
    styles: Vec<String>,
}

/// Errors from the transformer REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum TransformerError {
    /// The HTTP request itself failed (network, DNS, timeout, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The transformer returned a non-2xx status code.
    #[error("Transformer API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl TransformerApi {
    /// Create a client with symmetric connect/read timeouts.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8000`.
    pub fn new(api_url: String, timeout: Duration) -> Result<Self, TransformerError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, api_url))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Run a style transfer.
    pub async fn process(
        &self,
        request: &TransformRequest,
    ) -> Result<TransformResponse, TransformerError> {
        let response = self
            .client
            .post(format!("{}/api/v1/process", self.api_url))
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// List the style names the transformer currently supports.
    pub async fn styles(&self) -> Result<Vec<String>, TransformerError> {
        let response = self
            .client
            .get(format!("{}/api/v1/styles", self.api_url))
            .send()
            .await?;

        let body: StylesResponse = Self::parse_response(response).await?;
        Ok(body.styles)
    }

    // ---- private helpers ----

    /// Turn a non-2xx response into [`TransformerError::ApiError`].
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, TransformerError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TransformerError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TransformerError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
