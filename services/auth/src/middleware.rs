//! Middleware for JWT token validation and authentication

use axum::{extract::State, http::Request, middleware::Next, response::Response};
use common::auth::{AuthUser, bearer_token};
use tracing::debug;

use crate::{AppState, error::AuthError};

/// Extract and validate the bearer token, then expose the caller to handlers
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| AuthError::Unauthorized("Unauthorized".to_string()))?;

    let claims = state.verifier.verify(token).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        AuthError::Unauthorized("Invalid token".to_string())
    })?;

    req.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(req).await)
}
