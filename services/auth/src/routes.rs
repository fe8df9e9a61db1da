//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use common::auth::{AuthUser, Role};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    AppState, accounts,
    error::AuthError,
    middleware::auth_middleware,
    models::{CredentialsPayload, LoginCredentials, NewAccount, PasswordPayload, TargetPayload},
};

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth/me", get(me))
        .route("/super-admin/admins", get(list_admins).post(create_admin))
        .route("/super-admin/admins/:id", delete(delete_admin))
        .route("/super-admin/admins/:id/password", put(change_admin_password))
        .route("/super-admin/all-users", get(all_users))
        .route("/super-admin/users/admins", get(admin_credentials))
        .route("/super-admin/users/agents", get(agent_credentials))
        .route("/super-admin/users/:id/credentials", put(update_credentials))
        .route("/super-admin/agents", post(create_agent))
        .route("/admin/agents", get(list_agents).post(create_agent))
        .route("/admin/agents/:id/target", put(set_agent_target))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(login))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.health_check().await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "auth-service"
            })),
        ),
        other => {
            if let Err(e) = other {
                warn!("Health check failed: {:#}", e);
            }
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "service": "auth-service"
                })),
            )
        }
    }
}

/// Login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<LoginCredentials>,
) -> Result<impl IntoResponse, AuthError> {
    let response =
        accounts::login(&*state.store, &state.jwt, &state.throttle, &credentials).await?;
    Ok(Json(response))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(accounts::me(&*state.store, &user).await?))
}

pub async fn list_admins(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(accounts::list_admins(&*state.store, &user).await?))
}

pub async fn create_admin(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(account): Json<NewAccount>,
) -> Result<impl IntoResponse, AuthError> {
    let admin_id = accounts::create_admin(&*state.store, &user, account).await?;
    Ok(Json(json!({
        "message": "Admin created successfully",
        "admin_id": admin_id
    })))
}

pub async fn change_admin_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<PasswordPayload>,
) -> Result<impl IntoResponse, AuthError> {
    accounts::change_admin_password(&*state.store, &user, &id, payload.new_password.as_deref())
        .await?;
    Ok(Json(json!({"message": "Password updated successfully"})))
}

pub async fn delete_admin(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AuthError> {
    accounts::delete_admin(&*state.store, &user, &id).await?;
    Ok(Json(json!({"message": "Admin deleted successfully"})))
}

pub async fn all_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AuthError> {
    let users =
        accounts::credential_views(&*state.store, &user, &[Role::Admin, Role::Agent]).await?;
    Ok(Json(users))
}

pub async fn admin_credentials(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(
        accounts::credential_views(&*state.store, &user, &[Role::Admin]).await?,
    ))
}

pub async fn agent_credentials(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(
        accounts::credential_views(&*state.store, &user, &[Role::Agent]).await?,
    ))
}

pub async fn update_credentials(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<impl IntoResponse, AuthError> {
    accounts::update_credentials(&*state.store, &user, &id, payload).await?;
    Ok(Json(json!({"message": "User credentials updated successfully"})))
}

/// Shared by `/super-admin/agents` and `/admin/agents`
pub async fn create_agent(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(account): Json<NewAccount>,
) -> Result<impl IntoResponse, AuthError> {
    let agent_id = accounts::create_agent(&*state.store, &user, account).await?;
    Ok(Json(json!({
        "message": "Agent created successfully",
        "agent_id": agent_id
    })))
}

pub async fn list_agents(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(accounts::list_agents(&*state.store, &user).await?))
}

pub async fn set_agent_target(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<TargetPayload>,
) -> Result<impl IntoResponse, AuthError> {
    accounts::set_agent_target(&*state.store, &user, &id, payload.target_monthly).await?;
    Ok(Json(json!({"message": "Agent target updated successfully"})))
}
