// ABOUTME: Error taxonomy of the HTTP API and its mapping to status codes and JSON bodies.
// ABOUTME: Lower-layer failures are logged here and reported to clients as a generic message.

use agentdir_core::{FieldError, ValidationErrors};
use agentdir_store::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::auth::AuthError;

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Agent with id '{0}' already exists")]
    Conflict(String),

    /// The message is what the client sees; the cause has already been logged.
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    /// Map a store failure, logging the detail. Conflicts keep their meaning;
    /// everything else becomes `Internal` with the given client-facing message.
    pub fn from_store(message: &'static str) -> impl FnOnce(StoreError) -> ApiError {
        move |e| match e {
            StoreError::Conflict(id) => ApiError::Conflict(id),
            other => {
                tracing::error!(error = %other, "{}", message);
                ApiError::Internal(message)
            }
        }
    }

    /// Map a hashing failure, logging the detail.
    pub fn from_auth(message: &'static str) -> impl FnOnce(AuthError) -> ApiError {
        move |e| {
            tracing::error!(error = %e, "{}", message);
            ApiError::Internal(message)
        }
    }

    /// Map a blocking task that panicked or was cancelled, logging the detail.
    pub fn from_join(message: &'static str) -> impl FnOnce(tokio::task::JoinError) -> ApiError {
        move |e| {
            tracing::error!(error = %e, "{}", message);
            ApiError::Internal(message)
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::InvalidPassword => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => serde_json::json!({
                "error": "Invalid agent",
                "details": errors.errors().iter().collect::<Vec<&FieldError>>(),
            }),
            other => serde_json::json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
