//! Error types for jobprep-server HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::ValidationErrors;
use crate::services::{CreatedJobReport, ReportError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Body could not be read as the expected JSON (status from the rejection)
    #[error("Invalid request body: {1}")]
    InvalidBody(StatusCode, String),

    /// Field-level validation failure (400)
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// External collaborator failed (502)
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Job report stored but the pipeline was not notified (502)
    #[error("Pipeline submission failed for job report {}: {message}", .created.job_report_id)]
    SubmissionFailed {
        created: CreatedJobReport,
        message: String,
    },

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// jobprep-common error
    #[error("Common error: {0}")]
    Common(#[from] jobprep_common::Error),
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::NotFound(id) => ApiError::NotFound(format!("Job report {} not found", id)),
            ReportError::Validation(errors) => ApiError::Validation(errors),
            ReportError::Upstream(e) => ApiError::UpstreamUnavailable(e.to_string()),
            ReportError::SubmissionFailed { created, source } => ApiError::SubmissionFailed {
                created,
                message: source.to_string(),
            },
            ReportError::Store(e) => ApiError::Common(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, extra) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            ApiError::InvalidBody(status, msg) => (status, "INVALID_BODY", msg, None),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                errors.to_string(),
                Some(("fields", json!(errors.errors))),
            ),
            ApiError::UpstreamUnavailable(msg) => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE", msg, None)
            }
            ApiError::SubmissionFailed { created, message } => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_UNAVAILABLE",
                message,
                Some(("job_report", json!(created))),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
                None,
            ),
            ApiError::Common(ref err) => {
                let status = match err {
                    jobprep_common::Error::NotFound(_) => StatusCode::NOT_FOUND,
                    jobprep_common::Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, "COMMON_ERROR", err.to_string(), None)
            }
        };

        let mut error = json!({
            "code": error_code,
            "message": message,
        });
        if let (Some((key, value)), Value::Object(map)) = (extra, &mut error) {
            map.insert(key.to_string(), value);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
