//! HTTP error mapping.
//!
//! Every handler returns [`ApiResult`]. Ledger failures are classified by
//! [`ErrorKind`] and rendered as
//!
//! ```json
//! { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for Laptop: available 3, requested 5" }
//! ```
//!
//! | Kind | Status |
//! |------|--------|
//! | `NOT_FOUND` | 404 |
//! | `VALIDATION_FAILURE`, `INSUFFICIENT_STOCK`, `ALREADY_REFUNDED`, `RANGE_EXCEEDED` | 400 |
//! | `UNAUTHORIZED` / `FORBIDDEN` | 401 / 403 |
//! | `STORAGE_FAILURE` | 500, details logged only |

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use tally_core::{CoreError, ErrorKind, ValidationError};
use tally_db::{DbError, LedgerError};

pub type ApiResult<T> = Result<T, ApiError>;

/// Error body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No `x-cashier-id` header (401).
    #[error("Cashier identity required")]
    Unauthorized,

    /// Identity present but lacks the role (403).
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Body or query string could not be decoded (400).
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ApiError {
    pub fn forbidden(action: &str) -> Self {
        ApiError::Forbidden(format!("admin role required to {}", action))
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILURE"),
            ApiError::Ledger(err) => match err.kind() {
                ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                ErrorKind::ValidationFailure => (StatusCode::BAD_REQUEST, "VALIDATION_FAILURE"),
                ErrorKind::InsufficientStock => (StatusCode::BAD_REQUEST, "INSUFFICIENT_STOCK"),
                ErrorKind::AlreadyRefunded => (StatusCode::BAD_REQUEST, "ALREADY_REFUNDED"),
                ErrorKind::RangeExceeded => (StatusCode::BAD_REQUEST, "RANGE_EXCEEDED"),
                ErrorKind::StorageFailure => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILURE")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(target: "storage", error = %self, "Storage failure");
            "Storage failure".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { code, message })).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Ledger(err.into())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::Ledger(err.into())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Ledger(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
