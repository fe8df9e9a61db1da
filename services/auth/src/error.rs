//! Error type for the authentication service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::auth::AccessDenied;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::{repositories::StoreError, validation::ValidationError};

/// Custom error type for authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Too many failed login attempts, try again later")]
    TooManyAttempts,

    #[error("Internal server error")]
    InternalServerError,
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        error!("Account operation failed: {:#}", err);
        AuthError::InternalServerError
    }
}

impl From<AccessDenied> for AuthError {
    fn from(err: AccessDenied) -> Self {
        AuthError::Forbidden(err.to_string())
    }
}

impl From<ValidationError> for AuthError {
    fn from(err: ValidationError) -> Self {
        AuthError::BadRequest(err.to_string())
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UsernameTaken => AuthError::BadRequest(err.to_string()),
            StoreError::Other(err) => err.into(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            AuthError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Parse an account id from a path segment; garbage ids name nobody
pub fn parse_id(raw: &str, not_found: &str) -> AuthResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AuthError::NotFound(not_found.to_string()))
}
