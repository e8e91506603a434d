//! API error handling.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// API error type.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Conflict(msg)
            | ApiError::Unavailable(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.message()
        }));

        (status, body).into_response()
    }
}

impl From<campus_core::Error> for ApiError {
    fn from(err: campus_core::Error) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<campus_db::DbError> for ApiError {
    fn from(err: campus_db::DbError) -> Self {
        match err {
            campus_db::DbError::NotFound(msg) => ApiError::NotFound(msg),
            campus_db::DbError::Duplicate(msg) => ApiError::Conflict(msg),
            err @ campus_db::DbError::IncompleteOrder { .. } => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<campus_storage::StorageError> for ApiError {
    fn from(err: campus_storage::StorageError) -> Self {
        match err {
            campus_storage::StorageError::InvalidUpload(msg) => ApiError::BadRequest(msg),
            campus_storage::StorageError::NotFound(msg) => ApiError::NotFound(msg),
            campus_storage::StorageError::Backend(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<campus_crawler::CrawlError> for ApiError {
    fn from(err: campus_crawler::CrawlError) -> Self {
        match err {
            campus_crawler::CrawlError::Index(db) => db.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_errors_map_to_status() {
        let not_found: ApiError = campus_db::DbError::NotFound("unit x".to_string()).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let duplicate: ApiError = campus_db::DbError::Duplicate("slug".to_string()).into();
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);

        let partial: ApiError = campus_db::DbError::IncompleteOrder {
            expected: 3,
            given: 1,
        }
        .into();
        assert_eq!(partial.status(), StatusCode::BAD_REQUEST);
        assert!(partial.message().contains("1 of 3"));
    }

    #[test]
    fn test_storage_errors_map_to_status() {
        let invalid: ApiError =
            campus_storage::StorageError::InvalidUpload("too large".to_string()).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.message(), "too large");

        let backend: ApiError = campus_storage::StorageError::Backend("s3".to_string()).into();
        assert_eq!(backend.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
