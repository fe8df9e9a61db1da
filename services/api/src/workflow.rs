//! Sale request workflow
//!
//! Agents file a request for one sale; staff approve it (crediting the agent)
//! or reject it. Either decision applies at most once per request.

use chrono::Utc;
use common::auth::{AuthUser, Role, STAFF, authorize};
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult, parse_id},
    ledger::SaleAmount,
    models::sale_request::{OwnerScope, PendingSaleRequest, SaleRequest},
    repositories::{SaleRequestRepository, Transition},
};

const NOT_FOUND: &str = "Sale request not found";
const ALREADY_DECIDED: &str = "Sale request has already been processed";

/// File a pending request for the calling agent
pub async fn create_sale_request<S: SaleRequestRepository + ?Sized>(
    store: &S,
    actor: &AuthUser,
    sale_amount: Option<&str>,
) -> ApiResult<SaleRequest> {
    authorize(actor, &[Role::Agent])?;

    let amount: SaleAmount = sale_amount
        .ok_or_else(|| ApiError::BadRequest("Invalid sale amount".to_string()))?
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("{}", e)))?;

    let request = SaleRequest::pending(actor.id, amount, Utc::now());
    store.insert_sale_request(&request).await?;

    info!(
        request_id = %request.id,
        agent_id = %actor.id,
        sale_amount = %amount,
        "Sale request submitted"
    );
    Ok(request)
}

/// Pending queue; admins only see requests of agents visible to them
pub async fn list_pending<S: SaleRequestRepository + ?Sized>(
    store: &S,
    actor: &AuthUser,
) -> ApiResult<Vec<PendingSaleRequest>> {
    authorize(actor, STAFF)?;

    let scope = match actor.role {
        Role::Admin => Some(OwnerScope { admin_id: actor.id }),
        _ => None,
    };
    Ok(store.pending_sale_requests(scope).await?)
}

pub async fn approve<S: SaleRequestRepository + ?Sized>(
    store: &S,
    actor: &AuthUser,
    id: &str,
) -> ApiResult<SaleRequest> {
    authorize(actor, STAFF)?;
    let id = parse_id(id, NOT_FOUND)?;

    match store.approve_sale_request(id, actor.id, Utc::now()).await? {
        Transition::Applied(request) => {
            info!(
                request_id = %request.id,
                agent_id = %request.agent_id,
                approver = %actor.id,
                coins = %request.coins_requested,
                deposits = %request.deposits_requested,
                "Sale request approved"
            );
            Ok(request)
        }
        Transition::NotFound => Err(ApiError::NotFound(NOT_FOUND.to_string())),
        Transition::WrongState => {
            warn!(request_id = %id, "Sale request already decided");
            Err(ApiError::Conflict(ALREADY_DECIDED.to_string()))
        }
    }
}

/// Decide against a pending request; balances are left alone
pub async fn reject<S: SaleRequestRepository + ?Sized>(
    store: &S,
    actor: &AuthUser,
    id: &str,
) -> ApiResult<SaleRequest> {
    authorize(actor, STAFF)?;
    let id = parse_id(id, NOT_FOUND)?;

    match store.reject_sale_request(id, actor.id, Utc::now()).await? {
        Transition::Applied(request) => {
            info!(request_id = %request.id, approver = %actor.id, "Sale request rejected");
            Ok(request)
        }
        Transition::NotFound => Err(ApiError::NotFound(NOT_FOUND.to_string())),
        Transition::WrongState => Err(ApiError::Conflict(ALREADY_DECIDED.to_string())),
    }
}
