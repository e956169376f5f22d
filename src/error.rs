// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{repositories::StoreError, services::submission::SubmissionError};

/// Global Application Error Enum.
/// Centralizes mapping of failures to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    // 500 Internal Server Error
    #[error("internal server error: {0}")]
    InternalServerError(String),

    // 400 Bad Request
    #[error("bad request: {0}")]
    BadRequest(String),

    // 401 Unauthorized
    #[error("unauthorized: {0}")]
    AuthError(String),

    // 403 Forbidden
    #[error("forbidden: {0}")]
    Forbidden(String),

    // 404 Not Found
    #[error("not found: {0}")]
    NotFound(String),

    // 409 Conflict (e.g., exam already submitted)
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::ExamNotFound(_) => AppError::NotFound("Exam not found".to_string()),
            SubmissionError::LearnerNotFound(_) => AppError::NotFound("User not found".to_string()),
            SubmissionError::DuplicateSubmission { .. } => {
                AppError::Conflict("Exam already submitted".to_string())
            }
            SubmissionError::PersistenceFailure(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_errors_map_to_status_codes() {
        let duplicate: AppError = SubmissionError::DuplicateSubmission {
            user_id: 1,
            exam_id: 2,
        }
        .into();
        assert_eq!(duplicate.into_response().status(), StatusCode::CONFLICT);

        let missing: AppError = SubmissionError::ExamNotFound(2).into();
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let failed: AppError =
            SubmissionError::PersistenceFailure(StoreError::IdentityConflict(7)).into();
        assert_eq!(
            failed.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
