//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the
//! application. It is a closed set of tagged variants: every flow produces one
//! of these directly, and no downstream code pattern-matches on foreign error
//! shapes (store driver errors, JWT library errors and validation errors are
//! translated here, at the boundary, via `From` impls).
//!
//! `AppError` implements `actix_web::error::ResponseError` so handlers and
//! middleware can return it with `?` and have it rendered as a JSON response.
//! Authentication failures are internally distinguished (for logging and for
//! tests) but all map to 401; login failures use one shared message so an
//! attacker cannot tell a missing account from a wrong password.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::config;

/// Represents all possible errors that can occur within the application.
#[derive(Debug, PartialEq, Eq)]
pub enum AppError {
    /// Failed input validation (HTTP 422), carrying field-level messages.
    Validation(String),
    /// Malformed or unusable client input (HTTP 400), e.g. an invalid or
    /// expired password-reset token.
    BadRequest(String),
    /// No token was supplied with the request (HTTP 401).
    Unauthenticated,
    /// A token was supplied but its signature did not verify (HTTP 401).
    InvalidSession,
    /// A token was supplied but it has expired (HTTP 401).
    SessionExpired,
    /// The token verified but its account no longer exists (HTTP 401).
    StaleSession,
    /// The token predates the account's last password change (HTTP 401).
    PasswordChanged,
    /// Login failed. Deliberately identical for unknown email and wrong
    /// password (HTTP 401).
    InvalidCredentials,
    /// The current password given on a password update was wrong (HTTP 401).
    IncorrectPassword,
    /// The authenticated identity lacks the required role (HTTP 403).
    Forbidden,
    /// A requested resource was not found (HTTP 404).
    NotFound(String),
    /// A uniqueness constraint was violated, e.g. duplicate email (HTTP 409).
    Conflict(String),
    /// The external notifier failed to deliver a message (HTTP 500).
    DeliveryFailure,
    /// An unexpected server-side failure (HTTP 500). The detail is shown in
    /// development and masked in production.
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "{}", msg),
            AppError::BadRequest(msg) => write!(f, "{}", msg),
            AppError::Unauthenticated => {
                write!(f, "You are not logged in. Please log in to get access")
            }
            AppError::InvalidSession => write!(f, "Invalid token. Please log in again"),
            AppError::SessionExpired => write!(f, "Your token has expired. Please log in again"),
            AppError::StaleSession => {
                write!(f, "The user belonging to this token no longer exists")
            }
            AppError::PasswordChanged => {
                write!(f, "Password was recently changed. Please log in again")
            }
            AppError::InvalidCredentials => write!(f, "Incorrect email or password"),
            AppError::IncorrectPassword => write!(f, "Your current password is incorrect"),
            AppError::Forbidden => {
                write!(f, "You do not have permission to perform this action")
            }
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::Conflict(msg) => write!(f, "{}", msg),
            AppError::DeliveryFailure => {
                write!(f, "There was an error sending the email. Try again later")
            }
            AppError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated
            | AppError::InvalidSession
            | AppError::SessionExpired
            | AppError::StaleSession
            | AppError::PasswordChanged
            | AppError::InvalidCredentials
            | AppError::IncorrectPassword => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DeliveryFailure | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if status.is_server_error() {
            log::error!("request failed: {:?}", self);
        } else if status == StatusCode::UNAUTHORIZED {
            log::warn!("authentication rejected: {:?}", self);
        }

        // Internal details never reach the client outside development.
        let message = match self {
            AppError::Internal(_) if !config::is_development() => {
                "Something went wrong".to_string()
            }
            other => other.to_string(),
        };

        let label = if status.is_server_error() { "error" } else { "fail" };

        HttpResponse::build(status).json(json!({
            "status": label,
            "message": message,
        }))
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` maps to `NotFound`, unique-constraint violations map to
/// `Conflict` (duplicate email is the common case), everything else is an
/// internal error.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("Duplicate field value. Please use another value".into())
            }
            _ => AppError::Internal(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::Validation`,
/// preserving the field-level messages.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::Validation(error.to_string())
    }
}

/// Converts JWT processing failures into the two session-failure kinds the
/// authorization pipeline distinguishes.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        match error.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::SessionExpired,
            _ => AppError::InvalidSession,
        }
    }
}
