//! Unified error handling for the HTTP service.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::flows::FlowError;
use crate::services::OrderStoreError;

/// Message returned for every failed generation. Clients get no detail to
/// branch on; the cause is logged and sent to Sentry.
pub const GENERATION_FAILED_MESSAGE: &str = "AI generation failed, please try again";

/// Application-level error type for the studio service.
#[derive(Debug, Error)]
pub enum AppError {
    /// A flow call failed.
    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    /// The order store failed.
    #[error("Order store error: {0}")]
    OrderStore(#[from] OrderStoreError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl AppError {
    fn is_client_error(&self) -> bool {
        match self {
            Self::BadRequest(_) => true,
            Self::Flow(err) => err.is_client_error(),
            Self::OrderStore(_) => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if !self.is_client_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Studio request error"
            );
        }

        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Flow(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Flow(_) => StatusCode::BAD_GATEWAY,
            Self::OrderStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::BadRequest(_) => self.to_string(),
            Self::Flow(err) if err.is_client_error() => err.to_string(),
            Self::Flow(_) => GENERATION_FAILED_MESSAGE.to_string(),
            Self::OrderStore(_) => "Internal server error".to_string(),
        };

        (status, message).into_response()
    }
}
