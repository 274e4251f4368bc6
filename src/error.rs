//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::PoolName;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2003,
///     "message": "no free credentials in pool staging"
///   }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Malformed pool creation or update request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No pool with the given name exists.
    #[error("pool not found: {0}")]
    PoolNotFound(PoolName),

    /// The pool exists but holds no record with the given username.
    #[error("credential {username} not found in pool {pool}")]
    CredentialNotFound {
        /// Pool that was searched.
        pool: PoolName,
        /// Username that was not found.
        username: String,
    },

    /// Every record in the pool is currently leased.
    #[error("no free credentials in pool {0}")]
    PoolExhausted(PoolName),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::PoolNotFound(_) => 2001,
            Self::CredentialNotFound { .. } => 2002,
            Self::PoolExhausted(_) => 2003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::PoolNotFound(_) | Self::CredentialNotFound { .. } => StatusCode::NOT_FOUND,
            Self::PoolExhausted(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

impl From<axum::extract::rejection::JsonRejection> for GatewayError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<axum::extract::rejection::QueryRejection> for GatewayError {
    fn from(rejection: axum::extract::rejection::QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}
