//! Authentication middleware for JWT token validation

use axum::{extract::State, http::Request, middleware::Next, response::Response};
use common::auth::{AuthUser, bearer_token};
use tracing::debug;

use crate::{error::ApiError, state::AppState};

/// Authentication middleware
///
/// Verifies the bearer token and inserts the caller as an [`AuthUser`]
/// extension. Role checks are left to the operations themselves.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract the Authorization header
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(bearer_token)
        .ok_or(ApiError::Unauthorized)?;

    let claims = state.verifier.verify(token).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError::Unauthorized
    })?;

    req.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(req).await)
}
