//! Prize shop and reward bag
//!
//! Redemption debits coins, takes stock and creates the bag item in one store
//! operation. Bag items then move `unused -> pending_use -> used`.

use chrono::Utc;
use common::auth::{AuthUser, Role, STAFF, authorize};
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult, parse_id},
    models::shop::{PendingRewardUse, Prize, RedeemOutcome, RewardBagItem},
    repositories::{ShopRepository, Transition},
};

const PRIZE_NOT_FOUND: &str = "Prize not found";
const REWARD_NOT_FOUND: &str = "Reward not found";
const REWARD_REQUEST_NOT_FOUND: &str = "Reward request not found";

/// Active prizes, for any authenticated role
pub async fn list_active_prizes<S: ShopRepository + ?Sized>(store: &S) -> ApiResult<Vec<Prize>> {
    Ok(store.active_prizes().await?)
}

pub async fn redeem<S: ShopRepository + ?Sized>(
    store: &S,
    actor: &AuthUser,
    prize_id: Option<&str>,
) -> ApiResult<RewardBagItem> {
    authorize(actor, &[Role::Agent])?;
    let prize_id = prize_id
        .ok_or_else(|| ApiError::BadRequest("prize_id is required".to_string()))?;
    let prize_id = parse_id(prize_id, PRIZE_NOT_FOUND)?;

    match store.redeem(actor.id, prize_id, Utc::now()).await? {
        RedeemOutcome::Redeemed(item) => {
            info!(
                item_id = %item.id,
                agent_id = %actor.id,
                prize_id = %prize_id,
                "Prize redeemed"
            );
            Ok(item)
        }
        RedeemOutcome::PrizeNotFound => Err(ApiError::NotFound(PRIZE_NOT_FOUND.to_string())),
        RedeemOutcome::InsufficientCoins => {
            Err(ApiError::Conflict("Insufficient coins".to_string()))
        }
        RedeemOutcome::OutOfStock => {
            warn!(prize_id = %prize_id, "Redemption of sold-out prize");
            Err(ApiError::Conflict("Prize out of stock".to_string()))
        }
    }
}

/// The caller's items, newest first
pub async fn reward_bag<S: ShopRepository + ?Sized>(
    store: &S,
    actor: &AuthUser,
) -> ApiResult<Vec<RewardBagItem>> {
    authorize(actor, &[Role::Agent])?;
    Ok(store.reward_bag(actor.id).await?)
}

pub async fn request_use<S: ShopRepository + ?Sized>(
    store: &S,
    actor: &AuthUser,
    item_id: &str,
) -> ApiResult<RewardBagItem> {
    authorize(actor, &[Role::Agent])?;
    let item_id = parse_id(item_id, REWARD_NOT_FOUND)?;

    match store.request_reward_use(item_id, actor.id).await? {
        Transition::Applied(item) => {
            info!(item_id = %item.id, agent_id = %actor.id, "Reward use requested");
            Ok(item)
        }
        Transition::NotFound => Err(ApiError::NotFound(REWARD_NOT_FOUND.to_string())),
        Transition::WrongState => Err(ApiError::Conflict(
            "Reward is not available for use".to_string(),
        )),
    }
}

pub async fn pending_uses<S: ShopRepository + ?Sized>(
    store: &S,
    actor: &AuthUser,
) -> ApiResult<Vec<PendingRewardUse>> {
    authorize(actor, STAFF)?;
    Ok(store.pending_reward_uses().await?)
}

pub async fn approve_use<S: ShopRepository + ?Sized>(
    store: &S,
    actor: &AuthUser,
    item_id: &str,
) -> ApiResult<RewardBagItem> {
    authorize(actor, STAFF)?;
    let item_id = parse_id(item_id, REWARD_REQUEST_NOT_FOUND)?;

    match store.approve_reward_use(item_id, actor.id, Utc::now()).await? {
        Transition::Applied(item) => {
            info!(item_id = %item.id, approver = %actor.id, "Reward use approved");
            Ok(item)
        }
        Transition::NotFound => Err(ApiError::NotFound(REWARD_REQUEST_NOT_FOUND.to_string())),
        Transition::WrongState => Err(ApiError::Conflict(
            "Reward is not pending use".to_string(),
        )),
    }
}
