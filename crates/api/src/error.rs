use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use keygate_core::error::AuthError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`AuthError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `keygate_core`.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A request payload failed semantic validation (e.g. email format).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler and engine return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Auth(auth) => {
                let (status, code) = classify_auth_error(auth);
                (status, code, auth.to_string())
            }

            // Store failures surface as server errors, never as a
            // misleading domain error.
            AppError::Database(err) => classify_sqlx_error(err),

            AppError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", msg.clone())
            }

            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Fixed status mapping for the domain error taxonomy.
fn classify_auth_error(err: &AuthError) -> (StatusCode, &'static str) {
    match err {
        AuthError::AccountNotFound => (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND"),
        AuthError::AccountNotActive => (StatusCode::FORBIDDEN, "ACCOUNT_NOT_ACTIVE"),
        AuthError::AuthenticationFailed => (StatusCode::FORBIDDEN, "AUTHENTICATION_FAILED"),
        AuthError::PasswordMismatch => (StatusCode::BAD_REQUEST, "PASSWORD_MISMATCH"),
        AuthError::EmailAlreadyExists => (StatusCode::FORBIDDEN, "EMAIL_ALREADY_EXISTS"),
        AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
        AuthError::InvalidTokenType { .. } => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN_TYPE"),
        AuthError::MissingDeviceInfo => (StatusCode::BAD_REQUEST, "MISSING_DEVICE_INFO"),
        AuthError::InvalidDevice => (StatusCode::UNAUTHORIZED, "INVALID_DEVICE"),
        AuthError::DeviceNotFound => (StatusCode::NOT_FOUND, "DEVICE_NOT_FOUND"),
        AuthError::NoDevicesFound => (StatusCode::NOT_FOUND, "NO_DEVICES_FOUND"),
        AuthError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal auth error");
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Everything else maps to 500 with a sanitized message (the email
///   unique-violation is classified into a domain error by the session
///   engine before it can reach here).
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_UNAVAILABLE",
                "An internal error occurred".to_string(),
            )
        }
    }
}
