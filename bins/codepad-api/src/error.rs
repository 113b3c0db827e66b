// HTTP error mapping for the API layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use codepad_exec::{ErrorKind, ExecError};
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    Execution(ExecError),
    /// Request body could not be decoded
    InvalidBody(String),
    UsageDisabled,
    NotFound(String),
    Internal(String),
}

impl From<ExecError> for ApiError {
    fn from(e: ExecError) -> Self {
        ApiError::Execution(e)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Execution(e) => match e.kind() {
                ErrorKind::Validation | ErrorKind::UnsupportedLanguage => StatusCode::BAD_REQUEST,
                ErrorKind::Submission | ErrorKind::Poll => StatusCode::BAD_GATEWAY,
                ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::UsageDisabled => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Execution(e) => e.kind().as_str(),
            ApiError::InvalidBody(_) => ErrorKind::Validation.as_str(),
            ApiError::UsageDisabled => "usage_disabled",
            ApiError::NotFound(_) => "not_found",
            ApiError::Internal(_) => "internal",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Execution(e) => e.to_string(),
            ApiError::InvalidBody(detail) => format!("Invalid request body: {}", detail),
            ApiError::UsageDisabled => "Usage tracking is not enabled".to_string(),
            ApiError::NotFound(what) => format!("{} not found", what),
            // Details stay in the logs
            ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!(error = %detail, "Internal error");
        }
        let body = json!({
            "error": self.message(),
            "kind": self.kind(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}
