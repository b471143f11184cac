//! Single translation point from domain errors to HTTP responses.

use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use roster_auth::{AuthError, AuthenticateError, AuthzError};
use roster_core::{InfrastructureError, ValidationError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error("Manager ID required")]
    ManagerIdRequired,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Path segment that axum could not extract, e.g. invalid percent-encoding.
    #[error("Invalid path")]
    Path(#[from] PathRejection),

    #[error("{0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

impl From<AuthenticateError> for ApiError {
    fn from(err: AuthenticateError) -> Self {
        match err {
            AuthenticateError::Rejected(e) => ApiError::Auth(e),
            AuthenticateError::Infrastructure(e) => ApiError::Infrastructure(e),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(AuthError::MissingCredential | AuthError::MalformedCredential) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Auth(AuthError::UnknownCredential) => StatusCode::FORBIDDEN,
            ApiError::Authz(AuthzError::RoleForbidden | AuthzError::NotOwner) => {
                StatusCode::FORBIDDEN
            }
            ApiError::Authz(AuthzError::ResourceIdRequired) | ApiError::ManagerIdRequired => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Authz(AuthzError::MethodNotAllowed) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Validation(_) | ApiError::Path(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code carried next to the message.
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::Auth(e) => e.reason().as_str(),
            ApiError::Authz(e) => e.reason().as_str(),
            ApiError::ManagerIdRequired => AuthzError::ResourceIdRequired.reason().as_str(),
            ApiError::Validation(_) | ApiError::Path(_) => "VALIDATION",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Infrastructure(_) => "INFRASTRUCTURE",
        }
    }

    /// Client-facing message. Storage details stay in the logs.
    pub fn message(&self) -> String {
        match self {
            ApiError::Validation(ValidationError::InvalidBody(_)) => "Invalid input".to_string(),
            ApiError::Validation(ValidationError::EmptyUpdate) => "Nothing to update".to_string(),
            ApiError::Validation(ValidationError::InvalidId(_)) => {
                "invalid employee id".to_string()
            }
            ApiError::Infrastructure(InfrastructureError::ConnectionFailed(_)) => {
                "DB connection failed".to_string()
            }
            ApiError::Infrastructure(InfrastructureError::Query(_)) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Infrastructure(e) = &self {
            error!(error = %e, "request failed on the persistence layer");
        }
        json_error(self.status(), self.message(), self.reason())
    }
}

pub fn json_error(
    status: StatusCode,
    message: impl Into<String>,
    reason: &'static str,
) -> Response {
    (
        status,
        axum::Json(json!({
            "error": message.into(),
            "reason": reason,
        })),
    )
        .into_response()
}
