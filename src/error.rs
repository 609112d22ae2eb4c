//! Error handling module
//!
//! Centralized error types and HTTP response conversion. Storage and token
//! failures are translated here; their internals never reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::TokenError;
use crate::domain::AmountError;
use crate::ledger::LedgerError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Invalid login or password")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Login already taken: {0}")]
    Conflict(String),

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Constraint violation")]
    ConstraintViolation(String),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(login) => AppError::NotFound(login),
            LedgerError::Conflict(login) => AppError::Conflict(login),
            LedgerError::InsufficientFunds(_) => AppError::InsufficientFunds,
            LedgerError::ConstraintViolation(msg) => AppError::ConstraintViolation(msg),
            LedgerError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => AppError::Unauthorized,
            TokenError::Encoding(e) => AppError::Internal(format!("token encoding failed: {}", e)),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MalformedRequest(_) | AppError::InvalidAmount(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::InsufficientFunds | AppError::ConstraintViolation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::MalformedRequest(_) => "malformed_request",
            AppError::InvalidAmount(_) => "invalid_amount",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::Unauthorized => "unauthorized",
            AppError::NotFound(_) => "account_not_found",
            AppError::Conflict(_) => "login_taken",
            AppError::InsufficientFunds => "insufficient_funds",
            AppError::ConstraintViolation(_) => "constraint_violation",
            AppError::Database(_) => "database_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (error, details) = match &self {
            AppError::MalformedRequest(msg) => (self.to_string(), Some(msg.clone())),
            AppError::InvalidAmount(e) => (self.to_string(), Some(e.to_string())),
            AppError::NotFound(login) => (self.to_string(), Some(login.clone())),
            AppError::Conflict(login) => (self.to_string(), Some(login.clone())),
            AppError::ConstraintViolation(msg) => {
                tracing::warn!("Constraint violation: {}", msg);
                (self.to_string(), None)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ("Internal server error".to_string(), None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("Internal server error".to_string(), None)
            }
            AppError::InvalidCredentials | AppError::Unauthorized | AppError::InsufficientFunds => {
                (self.to_string(), None)
            }
        };

        let body = ErrorResponse {
            error,
            error_code: self.error_code().to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
