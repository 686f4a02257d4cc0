//! Error types for the API server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

// == API Error Enum ==
/// Unified error type for the request path.
///
/// A denied admission is deliberately its own variant rather than a generic
/// server error: the client did nothing wrong except arrive too fast, and
/// the response must say so.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Client identity could not be derived from the connection
    #[error("unable to determine client identity: {0}")]
    Admission(String),

    /// Admission check denied the request
    #[error("rate limit exceeded")]
    RateLimited,

    /// Invalid request data
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Admission(detail) => {
                error!(%detail, "admission identity error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "the server encountered a problem and could not process your request"
                        .to_string(),
                )
            }
            ApiError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Internal(detail) => {
                error!(%detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "the server encountered a problem and could not process your request"
                        .to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the request path.
pub type Result<T> = std::result::Result<T, ApiError>;
