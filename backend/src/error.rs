//! Application error handling
//!
//! This module provides unified error handling for the API,
//! converting internal errors to HTTP responses wrapped in the
//! `{success: false, error: {...}}` envelope.

use crate::media::MediaError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::error::ErrorKind;
use thiserror::Error;
use tracing::{error, warn};

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Media(#[from] MediaError),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    /// Wrap a repository failure. Unique and foreign-key violations become
    /// client errors, anything else stays internal.
    pub fn from_repo(err: anyhow::Error) -> Self {
        let kind = err
            .chain()
            .filter_map(|cause| cause.downcast_ref::<sqlx::Error>())
            .find_map(|db| db.as_database_error().map(|e| e.kind()));

        match kind {
            Some(ErrorKind::UniqueViolation) => {
                warn!("Unique constraint rejected write: {:#}", err);
                ApiError::Conflict("Resource already exists".to_string())
            }
            Some(ErrorKind::ForeignKeyViolation) => {
                warn!("Foreign key rejected write: {:#}", err);
                ApiError::Validation("Referenced resource does not exist".to_string())
            }
            _ => ApiError::Internal(err),
        }
    }

    /// HTTP status and stable code string
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            ApiError::Media(err) => match err {
                MediaError::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
                MediaError::UnsupportedExtension(_) | MediaError::Empty | MediaError::Decode(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_IMAGE")
                }
                MediaError::Encode(_) | MediaError::Io(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "MEDIA_ERROR")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            ApiError::Validation(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Conflict(msg)
            | ApiError::BadRequest(msg)
            | ApiError::PayloadTooLarge(msg) => msg.clone(),
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                "An internal error occurred".to_string()
            }
            ApiError::Database(err) => {
                error!("Database error: {:?}", err);
                "A database error occurred".to_string()
            }
            ApiError::Media(err) => {
                if status.is_server_error() {
                    error!("Media error: {:?}", err);
                    "Failed to store image".to_string()
                } else {
                    warn!("Rejected upload: {}", err);
                    err.to_string()
                }
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field: None,
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::fmt;

    #[derive(Debug)]
    struct FakeDbError(ErrorKind);

    impl fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "fake database error")
        }
    }

    impl std::error::Error for FakeDbError {}

    impl sqlx::error::DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "fake database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            None
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.0 {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn db_error(kind: ErrorKind) -> anyhow::Error {
        anyhow::Error::from(sqlx::Error::Database(Box::new(FakeDbError(kind))))
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let err = db_error(ErrorKind::UniqueViolation).context("Failed to insert food item");
        let mapped = ApiError::from_repo(err);
        assert_eq!(mapped.status_and_code(), (StatusCode::CONFLICT, "CONFLICT"));
    }

    #[test]
    fn test_foreign_key_violation_maps_to_validation() {
        let mapped = ApiError::from_repo(db_error(ErrorKind::ForeignKeyViolation));
        assert_eq!(mapped.status_and_code().0, StatusCode::BAD_REQUEST);
        assert!(matches!(mapped, ApiError::Validation(_)));
    }

    #[test]
    fn test_other_repo_errors_stay_internal() {
        let mapped = ApiError::from_repo(db_error(ErrorKind::CheckViolation));
        assert!(matches!(mapped, ApiError::Internal(_)));

        let mapped = ApiError::from_repo(anyhow::anyhow!("connection reset"));
        assert_eq!(mapped.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_error_status() {
        let error = ApiError::Validation("Invalid input".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_error_status() {
        let error = ApiError::NotFound("Feed not found".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unauthorized_error_status() {
        let error = ApiError::Unauthorized("Invalid token".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_media_errors_map_to_client_or_server_status() {
        let too_large = ApiError::Media(MediaError::TooLarge { size: 10, limit: 5 });
        assert_eq!(too_large.status_and_code().0, StatusCode::PAYLOAD_TOO_LARGE);

        let bad_ext = ApiError::Media(MediaError::UnsupportedExtension("bmp".to_string()));
        assert_eq!(bad_ext.status_and_code().0, StatusCode::BAD_REQUEST);

        let io = ApiError::Media(MediaError::Io(std::io::Error::other("disk full")));
        assert_eq!(io.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_error_body_uses_envelope() {
        let response = ApiError::Conflict("Email already registered".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "CONFLICT");
        assert_eq!(json["error"]["message"], "Email already registered");
    }
}
