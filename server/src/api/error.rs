//! HTTP error responses.
//!
//! Every failure leaves the API as `{success: false, error: <status>, message}`.
//! Authentication and authorization failures also carry a `code`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::auth::{AuthError, DenyReason};
use crate::store::StoreError;

/// A request outcome other than success.
#[derive(Debug)]
pub enum ApiError {
    /// The bearer token was missing or failed verification.
    Unauthorized(AuthError),
    /// The caller lacks the route's permission.
    Forbidden(DenyReason),
    /// The route or the requested drink does not exist.
    NotFound,
    /// The request body is missing required fields or is malformed.
    Unprocessable,
    /// The store failed.
    Internal,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: u16,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn message(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "permission error",
            Self::NotFound => "resource not found",
            Self::Unprocessable => "unprocessable",
            Self::Internal => "internal server error",
        }
    }

    const fn code(&self) -> Option<&'static str> {
        match self {
            Self::Unauthorized(e) => Some(e.code()),
            Self::Forbidden(reason) => Some(reason.code()),
            Self::NotFound | Self::Unprocessable | Self::Internal => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            success: false,
            error: status.as_u16(),
            message: self.message(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::Unauthorized(e)
    }
}

impl From<DenyReason> for ApiError {
    fn from(reason: DenyReason) -> Self {
        Self::Forbidden(reason)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateTitle(title) => {
                tracing::debug!("Rejected duplicate drink title '{title}'");
                Self::Unprocessable
            }
            other => {
                tracing::error!("Drink store failure: {other}");
                Self::Internal
            }
        }
    }
}
