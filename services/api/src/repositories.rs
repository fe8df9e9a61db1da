//! Repositories for database operations
//!
//! Every balance or state mutation is a single conditional operation on the
//! store: approval only applies to a pending request, a coin debit only
//! applies while the balance covers it, and stock only decrements while some
//! is left. Implementations must apply each multi-row effect all-or-nothing.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    agent::{Agent, LeaderboardRow},
    sale_request::{OwnerScope, PendingSaleRequest, SaleRequest},
    shop::{PendingRewardUse, Prize, PrizeChanges, RedeemOutcome, RewardBagItem},
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// Outcome of a guarded state change
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<T> {
    /// The precondition held and the change was written
    Applied(T),
    /// No record with that id (for the caller, where ownership applies)
    NotFound,
    /// The record exists but is not in the required state
    WrongState,
}

#[async_trait]
pub trait SaleRequestRepository: Send + Sync {
    async fn insert_sale_request(&self, request: &SaleRequest) -> Result<()>;

    /// Pending requests, oldest first, joined with agent name and username
    async fn pending_sale_requests(
        &self,
        scope: Option<OwnerScope>,
    ) -> Result<Vec<PendingSaleRequest>>;

    /// Flip a pending request to approved and credit the agent, together
    async fn approve_sale_request(
        &self,
        id: Uuid,
        approver: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Transition<SaleRequest>>;

    /// Flip a pending request to rejected; the ledger is not touched
    async fn reject_sale_request(
        &self,
        id: Uuid,
        approver: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Transition<SaleRequest>>;

    async fn count_pending_for_agent(&self, agent_id: Uuid) -> Result<i64>;
}

#[async_trait]
pub trait ShopRepository: Send + Sync {
    async fn active_prizes(&self) -> Result<Vec<Prize>>;

    async fn all_prizes(&self) -> Result<Vec<Prize>>;

    async fn find_prize(&self, id: Uuid) -> Result<Option<Prize>>;

    async fn insert_prize(&self, prize: &Prize) -> Result<()>;

    /// Apply only the given fields; returns the updated prize
    async fn update_prize(&self, id: Uuid, changes: &PrizeChanges) -> Result<Option<Prize>>;

    async fn delete_prize(&self, id: Uuid) -> Result<bool>;

    /// Debit the agent, take one unit of stock if limited, and create an
    /// unused bag item, all against current state
    async fn redeem(
        &self,
        agent_id: Uuid,
        prize_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<RedeemOutcome>;

    async fn reward_bag(&self, agent_id: Uuid) -> Result<Vec<RewardBagItem>>;

    /// `unused -> pending_use` on an item owned by `agent_id`
    async fn request_reward_use(
        &self,
        item_id: Uuid,
        agent_id: Uuid,
    ) -> Result<Transition<RewardBagItem>>;

    async fn pending_reward_uses(&self) -> Result<Vec<PendingRewardUse>>;

    /// `pending_use -> used`, stamping approver and time
    async fn approve_reward_use(
        &self,
        item_id: Uuid,
        approver: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Transition<RewardBagItem>>;
}

#[async_trait]
pub trait AgentRepository: Send + Sync {
    async fn find_agent(&self, id: Uuid) -> Result<Option<Agent>>;

    /// Every agent with redeemed coin totals, in no particular order
    async fn leaderboard_rows(&self) -> Result<Vec<LeaderboardRow>>;
}

/// The full store handle the service runs against
#[async_trait]
pub trait IncentiveStore: SaleRequestRepository + ShopRepository + AgentRepository {
    async fn health_check(&self) -> Result<bool>;
}
