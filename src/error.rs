//! Domain error taxonomy and its HTTP mapping.
//!
//! Business failures travel as `Err(DomainError)` from the service up to the
//! handlers, unchanged. The status mapping is an exhaustive `match`, so adding
//! a variant fails to compile until it is mapped.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// Public message for every `Internal` error; the cause only goes to the logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Referenced account does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Caller is not allowed to perform the operation.
    #[error("{0}")]
    Unauthorized(String),
    /// Resource already exists (duplicate email).
    #[error("{0}")]
    Conflict(String),
    /// Unclassified failure: persistence faults, timeouts, crypto errors.
    #[error("{0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Log an infrastructure failure and collapse it into `Internal`.
    pub fn internal_from(context: &str, cause: impl Display) -> Self {
        error!(error = %cause, "{context}");
        Self::Internal(context.to_string())
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NotFoundError",
            Self::Unauthorized(_) => "UnauthorizedError",
            Self::Conflict(_) => "ConflictError",
            Self::Internal(_) => "InternalServerError",
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(message)
            | Self::Unauthorized(message)
            | Self::Conflict(message)
            | Self::Internal(message) => message,
        }
    }

    fn public_message(&self) -> &str {
        match self {
            Self::Internal(_) => INTERNAL_ERROR_MESSAGE,
            _ => self.message(),
        }
    }
}

/// JSON body for every domain failure.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub status: u16,
    pub name: String,
    pub msg: String,
}

impl From<&DomainError> for ErrorBody {
    fn from(err: &DomainError) -> Self {
        Self {
            status: err.status().as_u16(),
            name: err.name().to_string(),
            msg: err.public_message().to_string(),
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::from(&self))).into_response()
    }
}
