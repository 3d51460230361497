use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::services::ServiceError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `PERMISSION_DENIED`, `NOT_FOUND`, `ALREADY_JOINED`,
    /// `NOT_PARTICIPATING`, `CAPACITY_EXCEEDED`, `UPLOAD_FAILED`,
    /// `PERSISTENCE_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Title must be 1-256 characters")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    PermissionDenied,
    NotFound(String),
    AlreadyJoined,
    NotParticipating,
    CapacityExceeded(String),
    UploadFailed(String),
    Persistence(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: "Only the owner may modify this record".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::AlreadyJoined => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "ALREADY_JOINED",
                    message: "Already joined this event".into(),
                },
            ),
            AppError::NotParticipating => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "NOT_PARTICIPATING",
                    message: "Not participating in this event".into(),
                },
            ),
            AppError::CapacityExceeded(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CAPACITY_EXCEEDED",
                    message: msg,
                },
            ),
            AppError::UploadFailed(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    code: "UPLOAD_FAILED",
                    message: msg,
                },
            ),
            AppError::Persistence(detail) => {
                tracing::error!("Persistence error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "PERSISTENCE_ERROR",
                        message: "The record store rejected the operation".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unauthorized => AppError::TokenMissing,
            ServiceError::Forbidden => AppError::PermissionDenied,
            ServiceError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            ServiceError::AlreadyJoined => AppError::AlreadyJoined,
            ServiceError::NotParticipating => AppError::NotParticipating,
            e @ ServiceError::CapacityExceeded { .. } => AppError::CapacityExceeded(e.to_string()),
            e @ ServiceError::UploadFailed { .. } => {
                tracing::warn!("{e}");
                AppError::UploadFailed(e.to_string())
            }
            ServiceError::Persistence(e) => AppError::Persistence(e.to_string()),
            ServiceError::Validation(msg) => AppError::Validation(msg),
        }
    }
}
