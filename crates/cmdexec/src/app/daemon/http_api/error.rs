use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::adapters::ApiError;
use crate::adapters::dto::ErrorBody;
use crate::common::error_codes::{self, ErrorCategory};

/// Failures of the HTTP layer itself rather than of a command.
#[derive(Debug, Error)]
pub enum ApiServerError {
    #[error("Worker task failed: {0}")]
    Join(String),
}

impl From<ApiServerError> for ApiError {
    fn from(err: ApiServerError) -> Self {
        Self {
            status: 500,
            body: ErrorBody {
                error: err.to_string(),
                code: error_codes::DAEMON_ERROR,
                category: ErrorCategory::Internal.as_str().to_string(),
                suggestion: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}
