//! Prize catalog administration for super admins

use chrono::Utc;
use common::{
    auth::{AuthUser, Role, authorize},
    database::fits_money_column,
};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult, parse_id},
    models::{
        CreatePrizePayload, UpdatePrizePayload,
        shop::{Prize, PrizeChanges},
    },
    repositories::ShopRepository,
};

const NOT_FOUND: &str = "Prize not found";
const CURATORS: &[Role] = &[Role::SuperAdmin];

/// Checks every prize must pass, whether freshly created or edited
fn validate(prize: &Prize) -> ApiResult<()> {
    if prize.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Prize name is required".to_string()));
    }
    if prize.coin_cost <= Decimal::ZERO {
        return Err(ApiError::BadRequest(
            "coin_cost must be greater than 0".to_string(),
        ));
    }
    if !fits_money_column(prize.coin_cost) {
        return Err(ApiError::BadRequest(
            "coin_cost must have at most 2 decimals and stay below 10^12".to_string(),
        ));
    }
    if prize.is_limited && !prize.quantity_available.is_some_and(|q| q >= 0) {
        return Err(ApiError::BadRequest(
            "Limited prizes need a non-negative quantity_available".to_string(),
        ));
    }
    Ok(())
}

pub async fn list_all<S: ShopRepository + ?Sized>(
    store: &S,
    actor: &AuthUser,
) -> ApiResult<Vec<Prize>> {
    authorize(actor, CURATORS)?;
    Ok(store.all_prizes().await?)
}

pub async fn create<S: ShopRepository + ?Sized>(
    store: &S,
    actor: &AuthUser,
    payload: CreatePrizePayload,
) -> ApiResult<Prize> {
    authorize(actor, CURATORS)?;

    let coin_cost = payload
        .coin_cost
        .ok_or_else(|| ApiError::BadRequest("coin_cost is required".to_string()))?;
    let prize = Prize {
        id: Uuid::new_v4(),
        name: payload.name.unwrap_or_default().trim().to_string(),
        description: payload.description.unwrap_or_default(),
        coin_cost,
        is_limited: payload.is_limited,
        quantity_available: payload.quantity_available.filter(|_| payload.is_limited),
        is_active: true,
        created_by: actor.id,
        created_at: Utc::now(),
    };
    validate(&prize)?;

    store.insert_prize(&prize).await?;
    info!(prize_id = %prize.id, name = %prize.name, "Prize created");
    Ok(prize)
}

pub async fn update<S: ShopRepository + ?Sized>(
    store: &S,
    actor: &AuthUser,
    id: &str,
    payload: UpdatePrizePayload,
) -> ApiResult<Prize> {
    authorize(actor, CURATORS)?;
    let id = parse_id(id, NOT_FOUND)?;

    let current = store
        .find_prize(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    let changes = PrizeChanges {
        name: payload.name.map(|name| name.trim().to_string()),
        description: payload.description,
        coin_cost: payload.coin_cost,
        is_limited: payload.is_limited,
        quantity_available: payload.quantity_available,
        is_active: payload.is_active,
    };
    if changes.is_empty() {
        return Ok(current);
    }
    validate(&changes.apply_to(&current))?;

    let updated = store
        .update_prize(id, &changes)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;
    info!(prize_id = %id, "Prize updated");
    Ok(updated)
}

pub async fn delete<S: ShopRepository + ?Sized>(
    store: &S,
    actor: &AuthUser,
    id: &str,
) -> ApiResult<()> {
    authorize(actor, CURATORS)?;
    let id = parse_id(id, NOT_FOUND)?;

    if !store.delete_prize(id).await? {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }
    info!(prize_id = %id, "Prize deleted");
    Ok(())
}
