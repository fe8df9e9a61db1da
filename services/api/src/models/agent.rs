//! Agent ledger views

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// An agent's balances as stored on the account
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub coins: Decimal,
    pub deposits: Decimal,
    pub total_sales: Decimal,
    pub target_monthly: Decimal,
}

/// One agent's standing, before ranking
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub agent_id: Uuid,
    pub name: String,
    pub deposits: Decimal,
    pub total_sales: Decimal,
    pub coins_redeemed: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub name: String,
    pub deposits: Decimal,
    pub coins_redeemed: Decimal,
    pub total_sales: Decimal,
    pub is_current_user: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    pub name: String,
    pub coins: Decimal,
    pub deposits: Decimal,
    pub total_sales: Decimal,
    pub target_monthly: Decimal,
    pub achievement_percentage: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub agent_info: AgentInfo,
    pub pending_requests: i64,
}
