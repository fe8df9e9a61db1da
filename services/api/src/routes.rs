//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use common::auth::AuthUser;
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    agents, catalog,
    error::ApiError,
    middleware::auth_middleware,
    models::{CreatePrizePayload, CreateSaleRequestPayload, RedeemPayload, UpdatePrizePayload},
    shop,
    state::AppState,
    workflow,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/agent/sale-request", post(create_sale_request))
        .route("/agent/dashboard", get(agent_dashboard))
        .route("/agent/leaderboard", get(agent_leaderboard))
        .route("/agent/reward-bag", get(reward_bag))
        .route("/agent/reward-bag/:id/request-use", post(request_reward_use))
        .route("/admin/sale-requests", get(pending_sale_requests))
        .route("/admin/sale-requests/:id/approve", put(approve_sale_request))
        .route("/admin/sale-requests/:id/reject", put(reject_sale_request))
        .route("/admin/reward-requests", get(pending_reward_requests))
        .route("/admin/reward-requests/:id/approve", put(approve_reward_request))
        .route("/shop/prizes", get(active_prizes))
        .route("/shop/redeem", post(redeem_prize))
        .route("/super-admin/prizes", get(all_prizes).post(create_prize))
        .route(
            "/super-admin/prizes/:id",
            put(update_prize).delete(delete_prize),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
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
                "service": "api-service"
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
                    "service": "api-service"
                })),
            )
        }
    }
}

pub async fn create_sale_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateSaleRequestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let request =
        workflow::create_sale_request(&*state.store, &user, payload.sale_amount())
            .await?;

    Ok(Json(json!({
        "message": "Sale request submitted successfully",
        "request_id": request.id
    })))
}

pub async fn pending_sale_requests(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(workflow::list_pending(&*state.store, &user).await?))
}

pub async fn approve_sale_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    workflow::approve(&*state.store, &user, &id).await?;
    Ok(Json(json!({"message": "Sale request approved successfully"})))
}

pub async fn reject_sale_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    workflow::reject(&*state.store, &user, &id).await?;
    Ok(Json(json!({"message": "Sale request rejected"})))
}

pub async fn agent_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(agents::dashboard(&*state.store, &user).await?))
}

pub async fn agent_leaderboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(agents::leaderboard(&*state.store, &user).await?))
}

/// Active prizes; open to every role
pub async fn active_prizes(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(shop::list_active_prizes(&*state.store).await?))
}

pub async fn redeem_prize(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RedeemPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let item = shop::redeem(&*state.store, &user, payload.prize_id()?).await?;

    Ok(Json(json!({
        "message": "Prize redeemed successfully",
        "item_id": item.id
    })))
}

pub async fn reward_bag(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(shop::reward_bag(&*state.store, &user).await?))
}

pub async fn request_reward_use(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    shop::request_use(&*state.store, &user, &id).await?;
    Ok(Json(json!({"message": "Use request submitted for admin approval"})))
}

pub async fn pending_reward_requests(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(shop::pending_uses(&*state.store, &user).await?))
}

pub async fn approve_reward_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    shop::approve_use(&*state.store, &user, &id).await?;
    Ok(Json(json!({"message": "Reward use approved successfully"})))
}

pub async fn all_prizes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(catalog::list_all(&*state.store, &user).await?))
}

pub async fn create_prize(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreatePrizePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let prize = catalog::create(&*state.store, &user, payload).await?;

    Ok(Json(json!({
        "message": "Prize created successfully",
        "prize_id": prize.id
    })))
}

pub async fn update_prize(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePrizePayload>,
) -> Result<impl IntoResponse, ApiError> {
    catalog::update(&*state.store, &user, &id, payload).await?;
    Ok(Json(json!({"message": "Prize updated successfully"})))
}

pub async fn delete_prize(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    catalog::delete(&*state.store, &user, &id).await?;
    Ok(Json(json!({"message": "Prize deleted successfully"})))
}
