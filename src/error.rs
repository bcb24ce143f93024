//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the HTTP surface. Each
//! variant maps to a specific HTTP status code and structured JSON error
//! response. Registration failures keep their typed cause in the `reason`
//! field so remote clients can rebuild a
//! [`crate::domain::RegistrationError`].

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{EventStatus, RegistrationError};
use crate::ledger::LedgerError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "event 7c9e... is full",
///     "reason": "event_full"
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
    /// Registration failure code (`event_full`, `already_registered`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Optional additional details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                       |
/// |-----------|-------------------|-----------------------------------|
/// | 1000–1999 | Validation / auth | 400 / 401 / 403                   |
/// | 2000–2999 | State / Not Found | 404 Not Found / 409 Conflict      |
/// | 3000–3999 | Server            | 500 / 503 Service Unavailable     |
/// | 4000–4999 | Capacity rules    | 409 Conflict                      |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Event with the given ID was not found.
    #[error("event not found: {0}")]
    EventNotFound(uuid::Uuid),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No authenticated principal on the request.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The principal may not perform this operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The requested status change is not allowed.
    #[error("cannot move event from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: EventStatus,
        /// Requested status.
        to: EventStatus,
    },

    /// Registration was rejected or could not be completed.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Unauthorized(_) => 1002,
            Self::Forbidden(_) => 1003,
            Self::EventNotFound(_) | Self::Registration(RegistrationError::NotFound(_)) => 2001,
            Self::Registration(RegistrationError::AlreadyRegistered { .. }) => 2002,
            Self::InvalidStatusTransition { .. } => 2003,
            Self::Registration(RegistrationError::EventFull(_)) => 4001,
            Self::Registration(RegistrationError::EventNotPublished(_)) => 4002,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::Registration(RegistrationError::Contention) => 3002,
            Self::Registration(RegistrationError::TransportFailure(_)) => 3003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::EventNotFound(_) | Self::Registration(RegistrationError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            Self::InvalidStatusTransition { .. }
            | Self::Registration(
                RegistrationError::AlreadyRegistered { .. }
                | RegistrationError::EventFull(_)
                | RegistrationError::EventNotPublished(_),
            ) => StatusCode::CONFLICT,
            Self::Registration(
                RegistrationError::Contention | RegistrationError::TransportFailure(_),
            ) => StatusCode::SERVICE_UNAVAILABLE,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the registration failure code, if this is a registration error.
    #[must_use]
    pub const fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Registration(err) => Some(err.code()),
            _ => None,
        }
    }
}

impl From<LedgerError> for GatewayError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Rejected(e) => Self::Registration(e),
            LedgerError::NotFound(id) => Self::EventNotFound(id.into()),
            LedgerError::InvalidTransition { from, to, .. } => {
                Self::InvalidStatusTransition { from, to }
            }
            LedgerError::Conflict => Self::Registration(RegistrationError::Contention),
            LedgerError::Duplicate(id) => Self::Internal(format!("duplicate event id {id}")),
            LedgerError::Backend(msg) => Self::PersistenceError(msg),
        }
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                reason: self.reason().map(str::to_string),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
