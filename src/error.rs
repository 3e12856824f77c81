/*
 * Responsibility
 * - Closed set of failures the service reports
 * - IntoResponse (HTTP status / JSON error body)
 * - Conversion from StorageError / ConfigError
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::services::auth::SubversionAttempt;
use crate::services::storage::StorageError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    SubversionAttempt(SubversionAttempt),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("not found: {key}")]
    NotFound { key: String },
    #[error("invalid reference: {reference}")]
    InvalidReference { reference: String },
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            // never echo the offending header back to the caller
            AppError::SubversionAttempt(_) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "unauthorized".into(),
            ),
            AppError::Configuration(message) => {
                tracing::error!(%message, "configuration error surfaced at request time");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "internal server error".into(),
                )
            }
            AppError::StorageUnavailable(message) => {
                tracing::warn!(%message, "object store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORAGE_UNAVAILABLE",
                    "object storage is unavailable, retry later".into(),
                )
            }
            AppError::NotFound { key } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("object {key} not found."),
            ),
            AppError::InvalidReference { reference } => (
                StatusCode::BAD_REQUEST,
                "INVALID_REFERENCE",
                format!("{reference} is not an object reference of this service"),
            ),
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Unavailable(message) => AppError::StorageUnavailable(message),
            StorageError::NotFound { key } => AppError::NotFound { key },
            StorageError::InvalidReference { reference } => {
                AppError::InvalidReference { reference }
            }
            StorageError::InvalidTtl { seconds } => {
                AppError::bad_request("INVALID_TTL", format!("ttl of {seconds}s is out of range"))
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Configuration(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_to_distinct_statuses() {
        let cases = [
            (StorageError::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (
                StorageError::NotFound { key: "k".into() },
                StatusCode::NOT_FOUND,
            ),
            (
                StorageError::invalid_reference("u"),
                StatusCode::BAD_REQUEST,
            ),
            (StorageError::InvalidTtl { seconds: 0 }, StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn subversion_attempt_is_unauthorized() {
        let err = AppError::SubversionAttempt(SubversionAttempt {
            header_value: Some("forged".into()),
            caller: "203.0.113.9".into(),
        });
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
