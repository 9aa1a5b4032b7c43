//! # API Error Types
//!
//! Every failure leaves the service as a status code plus a JSON body:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CoreError / DbError                                                   │
//! │       │  From                                                          │
//! │       ▼                                                                 │
//! │  ApiError { code, message }                                            │
//! │       │  IntoResponse                                                  │
//! │       ▼                                                                 │
//! │  422 {"code":"INSUFFICIENT_STOCK","message":"Insufficient stock ..."}  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage failures are logged with their detail and answered with a
//! generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shopline_core::CoreError;
use shopline_db::DbError;

/// Machine-readable error kind, serialized in SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    EmptyCart,
    InsufficientStock,
    InsufficientOwnerStock,
    ConcurrencyConflict,
    Duplicate,
    ConstraintViolation,
    Forbidden,
    Unauthorized,
    InternalError,
}

impl ErrorCode {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError | ErrorCode::EmptyCart => StatusCode::BAD_REQUEST,
            ErrorCode::InsufficientStock | ErrorCode::InsufficientOwnerStock => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::ConcurrencyConflict
            | ErrorCode::Duplicate
            | ErrorCode::ConstraintViolation => StatusCode::CONFLICT,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error returned by every handler.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    fn internal() -> Self {
        Self::new(ErrorCode::InternalError, "Internal server error")
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::InsufficientOwnerStock { .. } => ErrorCode::InsufficientOwnerStock,
            CoreError::EmptyCart => ErrorCode::EmptyCart,
            CoreError::ConcurrencyConflict { .. } => ErrorCode::ConcurrencyConflict,
            CoreError::Forbidden(_) => ErrorCode::Forbidden,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            DbError::Conflict(_) => ApiError::new(ErrorCode::ConcurrencyConflict, err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::new(ErrorCode::Duplicate, err.to_string()),
            DbError::ForeignKeyViolation { .. } => {
                ApiError::new(ErrorCode::ConstraintViolation, err.to_string())
            }
            other => {
                tracing::error!(error = %other, "Storage failure");
                ApiError::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        if status.is_client_error() {
            tracing::debug!(code = ?self.code, message = %self.message, "Request rejected");
        }
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopline_core::ValidationError;

    #[test]
    fn test_core_errors_map_to_status() {
        let cases = [
            (CoreError::not_found("Shop", 3), StatusCode::NOT_FOUND),
            (CoreError::EmptyCart, StatusCode::BAD_REQUEST),
            (
                CoreError::InsufficientStock {
                    line: 2,
                    stock_id: 7,
                    available: 1,
                    requested: 3,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (CoreError::conflict("ShopStock", 4), StatusCode::CONFLICT),
            (CoreError::Forbidden("no".to_string()), StatusCode::FORBIDDEN),
            (
                CoreError::Validation(ValidationError::Required {
                    field: "phone".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).code.status_code(), status);
        }
    }

    #[test]
    fn test_storage_detail_is_hidden() {
        let err = ApiError::from(DbError::QueryFailed("no such column: secret".to_string()));
        assert_eq!(err.code, ErrorCode::InternalError);
        assert!(!err.message.contains("secret"));
    }

    #[test]
    fn test_body_shape() {
        let body = serde_json::to_value(ApiError::from(DbError::Conflict("locked".to_string()))).unwrap();
        assert_eq!(body["code"], "CONCURRENCY_CONFLICT");
        assert!(body["message"].as_str().unwrap().contains("locked"));
    }
}
