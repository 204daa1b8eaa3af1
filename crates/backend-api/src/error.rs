//! API error type and its envelope rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use billbuddy_auth::AuthError;
use chrono::Utc;
use serde_json::{json, Value};
use std::fmt::Display;
use tracing::error;

use crate::envelope::request_id;

/// An error reply carrying the taxonomy code surfaced to the caller.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: json!({}),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn user_exists() -> Self {
        Self::new(StatusCode::CONFLICT, "USER_EXISTS", "User already exists")
    }

    pub fn invalid_credentials() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            "Invalid username or password",
        )
    }

    pub fn no_token() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "NO_TOKEN",
            "Missing or invalid Authorization header",
        )
    }

    pub fn invalid_token() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "INVALID_TOKEN",
            "Invalid or expired token",
        )
    }

    pub fn missing_token() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "MISSING_TOKEN", "No token provided")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn rate_limited() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            "Too many requests, please try again later",
        )
    }

    /// Unexpected persistence or runtime failure; the underlying message
    /// rides along as diagnostic detail.
    pub fn server_error(message: impl Into<String>, cause: impl Display) -> Self {
        let message = message.into();
        let cause = cause.to_string();
        error!(%message, %cause, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR", message)
            .with_details(json!({ "error": cause }))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": {
                "code": self.code,
                "message": self.message,
                "details": self.details,
            },
            "meta": {
                "timestamp": Utc::now().to_rfc3339(),
                "requestId": request_id(),
            },
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MissingCredentials => ApiError::validation("Missing required fields"),
            AuthError::UserExists => ApiError::user_exists(),
            AuthError::InvalidCredentials => ApiError::invalid_credentials(),
            AuthError::InvalidToken => ApiError::invalid_token(),
            AuthError::UserNotFound => ApiError::not_found("User not found"),
            AuthError::TokenSigning(cause) => {
                ApiError::server_error("Failed to issue token", cause)
            }
            AuthError::Database(cause) => {
                ApiError::server_error("Failed to process request", cause)
            }
            AuthError::PasswordHash(cause) => {
                ApiError::server_error("Failed to process credentials", cause)
            }
        }
    }
}
