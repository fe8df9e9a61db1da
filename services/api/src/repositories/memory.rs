//! In-memory store for tests
//!
//! All tables sit behind one mutex, so every operation observes and mutates
//! a consistent snapshot, the same guarantee the PostgreSQL transactions give.

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::auth::Role;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    AgentRepository, IncentiveStore, SaleRequestRepository, ShopRepository, Transition,
};
use crate::models::{
    agent::{Agent, LeaderboardRow},
    sale_request::{OwnerScope, PendingSaleRequest, RequestStatus, SaleRequest},
    shop::{PendingRewardUse, Prize, PrizeChanges, RedeemOutcome, RewardBagItem, RewardStatus},
};

#[derive(Debug, Clone)]
struct UserRow {
    username: String,
    name: String,
    role: Role,
    created_by: Option<Uuid>,
    coins: Decimal,
    deposits: Decimal,
    total_sales: Decimal,
    target_monthly: Decimal,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserRow>,
    sale_requests: Vec<SaleRequest>,
    prizes: Vec<Prize>,
    reward_items: Vec<RewardBagItem>,
}

impl Tables {
    fn visible_to(&self, agent_id: Uuid, scope: Option<OwnerScope>) -> bool {
        let Some(scope) = scope else {
            return true;
        };
        let Some(agent) = self.users.get(&agent_id) else {
            return true;
        };

        match agent.created_by {
            None => true,
            Some(creator) if creator == scope.admin_id => true,
            Some(creator) => self
                .users
                .get(&creator)
                .is_some_and(|user| user.role == Role::SuperAdmin),
        }
    }

    fn decide(
        &mut self,
        id: Uuid,
        approver: Uuid,
        at: DateTime<Utc>,
        status: RequestStatus,
    ) -> Result<Transition<SaleRequest>> {
        let Some(index) = self.sale_requests.iter().position(|r| r.id == id) else {
            return Ok(Transition::NotFound);
        };
        if self.sale_requests[index].status != RequestStatus::Pending {
            return Ok(Transition::WrongState);
        }

        if status == RequestStatus::Approved {
            let request = &self.sale_requests[index];
            let Some(agent) = self
                .users
                .get_mut(&request.agent_id)
                .filter(|user| user.role == Role::Agent)
            else {
                bail!(
                    "agent {} of sale request {} no longer exists",
                    request.agent_id,
                    request.id
                );
            };
            agent.coins += request.coins_requested;
            agent.deposits += request.deposits_requested;
            agent.total_sales += Decimal::from(request.sale_amount.value());
        }

        let request = &mut self.sale_requests[index];
        request.status = status;
        request.approved_by = Some(approver);
        request.approved_at = Some(at);
        Ok(Transition::Applied(request.clone()))
    }
}

/// Test double for [`IncentiveStore`]
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account; returns its id
    pub async fn add_user(&self, role: Role, username: &str, created_by: Option<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.lock().await.users.insert(
            id,
            UserRow {
                username: username.to_string(),
                name: format!("{} name", username),
                role,
                created_by,
                coins: Decimal::ZERO,
                deposits: Decimal::ZERO,
                total_sales: Decimal::ZERO,
                target_monthly: Decimal::ZERO,
            },
        );
        id
    }

    pub async fn remove_user(&self, id: Uuid) {
        self.tables.lock().await.users.remove(&id);
    }

    pub async fn set_coins(&self, id: Uuid, coins: Decimal) {
        if let Some(user) = self.tables.lock().await.users.get_mut(&id) {
            user.coins = coins;
        }
    }

    pub async fn set_target(&self, id: Uuid, target_monthly: Decimal) {
        if let Some(user) = self.tables.lock().await.users.get_mut(&id) {
            user.target_monthly = target_monthly;
        }
    }
}

#[async_trait]
impl SaleRequestRepository for MemoryStore {
    async fn insert_sale_request(&self, request: &SaleRequest) -> Result<()> {
        self.tables.lock().await.sale_requests.push(request.clone());
        Ok(())
    }

    async fn pending_sale_requests(
        &self,
        scope: Option<OwnerScope>,
    ) -> Result<Vec<PendingSaleRequest>> {
        let tables = self.tables.lock().await;

        Ok(tables
            .sale_requests
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .filter(|r| tables.visible_to(r.agent_id, scope))
            .map(|r| {
                let agent = tables.users.get(&r.agent_id);
                PendingSaleRequest {
                    request: r.clone(),
                    agent_name: agent.map(|a| a.name.clone()),
                    agent_username: agent.map(|a| a.username.clone()),
                }
            })
            .collect())
    }

    async fn approve_sale_request(
        &self,
        id: Uuid,
        approver: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Transition<SaleRequest>> {
        self.tables
            .lock()
            .await
            .decide(id, approver, at, RequestStatus::Approved)
    }

    async fn reject_sale_request(
        &self,
        id: Uuid,
        approver: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Transition<SaleRequest>> {
        self.tables
            .lock()
            .await
            .decide(id, approver, at, RequestStatus::Rejected)
    }

    async fn count_pending_for_agent(&self, agent_id: Uuid) -> Result<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sale_requests
            .iter()
            .filter(|r| r.agent_id == agent_id && r.status == RequestStatus::Pending)
            .count() as i64)
    }
}

#[async_trait]
impl ShopRepository for MemoryStore {
    async fn active_prizes(&self) -> Result<Vec<Prize>> {
        let tables = self.tables.lock().await;
        Ok(tables.prizes.iter().filter(|p| p.is_active).cloned().collect())
    }

    async fn all_prizes(&self) -> Result<Vec<Prize>> {
        Ok(self.tables.lock().await.prizes.clone())
    }

    async fn find_prize(&self, id: Uuid) -> Result<Option<Prize>> {
        let tables = self.tables.lock().await;
        Ok(tables.prizes.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_prize(&self, prize: &Prize) -> Result<()> {
        self.tables.lock().await.prizes.push(prize.clone());
        Ok(())
    }

    async fn update_prize(&self, id: Uuid, changes: &PrizeChanges) -> Result<Option<Prize>> {
        let mut tables = self.tables.lock().await;
        let Some(prize) = tables.prizes.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        *prize = changes.apply_to(prize);
        Ok(Some(prize.clone()))
    }

    async fn delete_prize(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.prizes.len();
        tables.prizes.retain(|p| p.id != id);
        Ok(tables.prizes.len() < before)
    }

    async fn redeem(
        &self,
        agent_id: Uuid,
        prize_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<RedeemOutcome> {
        let mut tables = self.tables.lock().await;

        let Some(index) = tables
            .prizes
            .iter()
            .position(|p| p.id == prize_id && p.is_active)
        else {
            return Ok(RedeemOutcome::PrizeNotFound);
        };
        let prize = tables.prizes[index].clone();

        let affordable = tables
            .users
            .get(&agent_id)
            .is_some_and(|u| u.role == Role::Agent && u.coins >= prize.coin_cost);
        if !affordable {
            return Ok(RedeemOutcome::InsufficientCoins);
        }
        if !prize.in_stock() {
            return Ok(RedeemOutcome::OutOfStock);
        }

        if let Some(agent) = tables.users.get_mut(&agent_id) {
            agent.coins -= prize.coin_cost;
        }
        if prize.is_limited {
            let stock = &mut tables.prizes[index].quantity_available;
            *stock = stock.map(|left| left - 1);
        }

        let item = RewardBagItem::unused(agent_id, &prize, at);
        tables.reward_items.push(item.clone());
        Ok(RedeemOutcome::Redeemed(item))
    }

    async fn reward_bag(&self, agent_id: Uuid) -> Result<Vec<RewardBagItem>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reward_items
            .iter()
            .rev()
            .filter(|item| item.agent_id == agent_id)
            .cloned()
            .collect())
    }

    async fn request_reward_use(
        &self,
        item_id: Uuid,
        agent_id: Uuid,
    ) -> Result<Transition<RewardBagItem>> {
        let mut tables = self.tables.lock().await;
        let Some(item) = tables
            .reward_items
            .iter_mut()
            .find(|item| item.id == item_id && item.agent_id == agent_id)
        else {
            return Ok(Transition::NotFound);
        };

        if item.status != RewardStatus::Unused {
            return Ok(Transition::WrongState);
        }
        item.status = RewardStatus::PendingUse;
        Ok(Transition::Applied(item.clone()))
    }

    async fn pending_reward_uses(&self) -> Result<Vec<PendingRewardUse>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reward_items
            .iter()
            .filter(|item| item.status == RewardStatus::PendingUse)
            .map(|item| PendingRewardUse {
                item: item.clone(),
                agent_name: tables.users.get(&item.agent_id).map(|a| a.name.clone()),
            })
            .collect())
    }

    async fn approve_reward_use(
        &self,
        item_id: Uuid,
        approver: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Transition<RewardBagItem>> {
        let mut tables = self.tables.lock().await;
        let Some(item) = tables.reward_items.iter_mut().find(|item| item.id == item_id) else {
            return Ok(Transition::NotFound);
        };

        if item.status != RewardStatus::PendingUse {
            return Ok(Transition::WrongState);
        }
        item.status = RewardStatus::Used;
        item.used_at = Some(at);
        item.approved_by = Some(approver);
        Ok(Transition::Applied(item.clone()))
    }
}

#[async_trait]
impl AgentRepository for MemoryStore {
    async fn find_agent(&self, id: Uuid) -> Result<Option<Agent>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .get(&id)
            .filter(|user| user.role == Role::Agent)
            .map(|user| Agent {
                id,
                username: user.username.clone(),
                name: user.name.clone(),
                coins: user.coins,
                deposits: user.deposits,
                total_sales: user.total_sales,
                target_monthly: user.target_monthly,
            }))
    }

    async fn leaderboard_rows(&self) -> Result<Vec<LeaderboardRow>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .filter(|(_, user)| user.role == Role::Agent)
            .map(|(id, user)| {
                let coins_redeemed = tables
                    .reward_items
                    .iter()
                    .filter(|item| item.agent_id == *id)
                    .filter_map(|item| tables.prizes.iter().find(|p| p.id == item.prize_id))
                    .map(|prize| prize.coin_cost)
                    .sum();

                LeaderboardRow {
                    agent_id: *id,
                    name: user.name.clone(),
                    deposits: user.deposits,
                    total_sales: user.total_sales,
                    coins_redeemed,
                }
            })
            .collect())
    }
}

#[async_trait]
impl IncentiveStore for MemoryStore {
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
