//! Error handling for the backend API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tutor_core::{ContentError, ExamError};

use crate::services::exam::ExamRunError;
use crate::services::pool_cache::CacheError;
use crate::services::scheduler::SchedulerError;
use crate::store::StoreError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Content fetch failed: {0}")]
    ContentFetchFailed(String),

    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::ContentFetchFailed(_) => (StatusCode::BAD_GATEWAY, "content_fetch_failed"),
            ApiError::PersistenceFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "persistence_failed")
            }
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        }

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::ContentFetchFailed(e) => ApiError::ContentFetchFailed(e.to_string()),
        }
    }
}

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::PersistenceFailed(e) => ApiError::PersistenceFailed(e.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::PersistenceFailed(err.to_string())
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ExamError> for ApiError {
    fn from(err: ExamError) -> Self {
        match err {
            ExamError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            ExamError::EmptyQuestionSet => ApiError::ContentFetchFailed(err.to_string()),
            ExamError::QuestionOutOfRange { .. } | ExamError::OptionOutOfRange { .. } => {
                ApiError::BadRequest(err.to_string())
            }
        }
    }
}

impl From<ExamRunError> for ApiError {
    fn from(err: ExamRunError) -> Self {
        match err {
            ExamRunError::ContentFetchFailed(e) => ApiError::ContentFetchFailed(e.to_string()),
            ExamRunError::Exam(e) => e.into(),
            ExamRunError::PersistenceFailed(e) => e.into(),
            ExamRunError::StartInProgress => ApiError::Conflict(err.to_string()),
        }
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
