//! Error responses: `{"success": false, "error": "..."}` with a status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use outreach_backend::BackendError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Backend failure already reduced to its public message.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Backend(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Backend(e) => e.public_message(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Backend(e) => {
                error!(error = %e, "Backend request failed");
                metrics::counter!("api.errors", "kind" => "backend").increment(1);
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                metrics::counter!("api.errors", "kind" => "backend").increment(1);
            }
            ApiError::ServiceUnavailable(msg) => {
                warn!(error = %msg, "Service unavailable");
                metrics::counter!("api.errors", "kind" => "unavailable").increment(1);
            }
            ApiError::BadRequest(_) | ApiError::NotFound(_) => {
                metrics::counter!("api.errors", "kind" => "client").increment(1);
            }
        }
        let body = ErrorResponse {
            success: false,
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
