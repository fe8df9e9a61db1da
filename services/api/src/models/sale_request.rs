//! Sale request models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::ledger::SaleAmount;

/// Sale request lifecycle. `Pending` moves once to a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(anyhow::anyhow!("unknown sale request status: {}", other)),
        }
    }
}

/// An agent's claim for the credit of one sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub sale_amount: SaleAmount,
    pub coins_requested: Decimal,
    pub deposits_requested: Decimal,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl SaleRequest {
    /// New pending request with the credit fixed from the amount tier
    pub fn pending(agent_id: Uuid, sale_amount: SaleAmount, created_at: DateTime<Utc>) -> Self {
        let credit = sale_amount.credit();
        Self {
            id: Uuid::new_v4(),
            agent_id,
            sale_amount,
            coins_requested: credit.coins,
            deposits_requested: credit.deposits,
            status: RequestStatus::Pending,
            created_at,
            approved_by: None,
            approved_at: None,
        }
    }
}

/// Pending request joined with its agent at read time
#[derive(Debug, Clone, Serialize)]
pub struct PendingSaleRequest {
    #[serde(flatten)]
    pub request: SaleRequest,
    pub agent_name: Option<String>,
    pub agent_username: Option<String>,
}

/// Restricts a listing to the agents an admin may see: those it created,
/// those created by a super admin, and those with no recorded creator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerScope {
    pub admin_id: Uuid,
}
