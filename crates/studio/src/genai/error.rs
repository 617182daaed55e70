//! Error types for the model client.

use thiserror::Error;

/// Errors from a single model round trip.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned an error body.
    #[error("API error ({status}): {message}")]
    Api {
        /// Status string from the API, e.g. `INVALID_ARGUMENT`.
        status: String,
        /// Error message.
        message: String,
    },

    /// Quota exhausted.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// API key rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse the response body.
    #[error("parse error: {0}")]
    Parse(String),

    /// The prompt or the answer was blocked by the safety filter.
    #[error("blocked by safety filter: {0}")]
    Blocked(String),

    /// No candidate or no content came back.
    #[error("model returned no content")]
    EmptyResponse,

    /// The client could not be built from its configuration.
    #[error("client configuration error: {0}")]
    Config(String),
}

/// Error body returned by the Gemini API.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    /// Numeric HTTP code.
    #[serde(default)]
    pub code: u16,
    /// Error message.
    pub message: String,
    /// Canonical status, e.g. `PERMISSION_DENIED`.
    #[serde(default)]
    pub status: String,
}
