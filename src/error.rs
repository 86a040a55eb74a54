use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::phase::AdvanceError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Unknown session, round or chat entry.
    #[error("not found: {0}")]
    NotFound(String),
    /// Mutation attempted on a finished session or a closed round.
    #[error("already finished: {0}")]
    AlreadyFinished(String),
    /// Malformed request payload or vote target.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Identifier collision when creating a record.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Operation exceeded its timeout limit.
    #[error("operation timed out")]
    Timeout,
    /// Anything else that should never reach a client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DuplicateKey { id } => ServiceError::DuplicateKey(id),
            StorageError::Corrupted { id, reason } => {
                ServiceError::Internal(format!("session `{id}` is unreadable: {reason}"))
            }
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<AdvanceError> for ServiceError {
    fn from(err: AdvanceError) -> Self {
        match err {
            AdvanceError::AlreadyFinished => ServiceError::AlreadyFinished(err.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("malformed body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(format!("malformed query: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(format!("malformed path: {}", rejection.body_text()))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Target already finished.
    #[error("conflict: {0}")]
    AlreadyFinished(String),
    /// Identifier collision.
    #[error("conflict: {0}")]
    DuplicateKey(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Operation exceeded its deadline.
    #[error("service unavailable: operation timed out")]
    Timeout,
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::AlreadyFinished(message) => AppError::AlreadyFinished(message),
            ServiceError::InvalidRequest(message) => AppError::BadRequest(message),
            ServiceError::DuplicateKey(message) => AppError::DuplicateKey(message),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Timeout => AppError::Timeout,
            ServiceError::Internal(message) => AppError::Internal(message),
        }
    }
}

impl AppError {
    /// Stable machine readable code exposed in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "invalid_request",
            AppError::NotFound(_) => "not_found",
            AppError::AlreadyFinished(_) => "already_finished",
            AppError::DuplicateKey(_) => "duplicate_key",
            AppError::ServiceUnavailable(_) => "unavailable",
            AppError::Timeout => "timeout",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyFinished(_) | AppError::DuplicateKey(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) | AppError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error payload returned by every failing endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable snake_case error code.
    pub code: String,
    /// Human readable description.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let payload = Json(ErrorBody {
            code: self.code().to_owned(),
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
