//! PostgreSQL implementation of the incentive store

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{error, info};
use uuid::Uuid;

use super::{
    AgentRepository, IncentiveStore, SaleRequestRepository, ShopRepository, Transition,
};
use crate::{
    ledger::SaleAmount,
    models::{
        agent::{Agent, LeaderboardRow},
        sale_request::{OwnerScope, PendingSaleRequest, RequestStatus, SaleRequest},
        shop::{PendingRewardUse, Prize, PrizeChanges, RedeemOutcome, RewardBagItem},
    },
};

/// Store backed by the shared PostgreSQL database
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store over an open pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn sale_request_exists(&self, id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM sale_requests WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn reward_item_exists(&self, id: Uuid, owner: Option<Uuid>) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM reward_bag_items
                WHERE id = $1 AND ($2::uuid IS NULL OR agent_id = $2)
            )
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Move a pending request to `status`; approval also credits the agent
    /// inside the same transaction
    async fn decide(
        &self,
        id: Uuid,
        approver: Uuid,
        at: DateTime<Utc>,
        status: RequestStatus,
    ) -> Result<Transition<SaleRequest>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            UPDATE sale_requests
            SET status = $4, approved_by = $2, approved_at = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING id, agent_id, sale_amount, coins_requested, deposits_requested,
                      status, created_at, approved_by, approved_at
            "#,
        )
        .bind(id)
        .bind(approver)
        .bind(at)
        .bind(status.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return if self.sale_request_exists(id).await? {
                Ok(Transition::WrongState)
            } else {
                Ok(Transition::NotFound)
            };
        };

        let request = sale_request_from_row(&row)?;

        if status == RequestStatus::Approved {
            let credited = sqlx::query(
                r#"
                UPDATE users
                SET coins = coins + $2,
                    deposits = deposits + $3,
                    total_sales = total_sales + $4
                WHERE id = $1 AND role = 'agent'
                "#,
            )
            .bind(request.agent_id)
            .bind(request.coins_requested)
            .bind(request.deposits_requested)
            .bind(Decimal::from(request.sale_amount.value()))
            .execute(&mut *tx)
            .await?;

            if credited.rows_affected() == 0 {
                // Dropping the transaction rolls the status change back
                bail!(
                    "agent {} of sale request {} no longer exists",
                    request.agent_id,
                    request.id
                );
            }
        }

        tx.commit().await?;
        Ok(Transition::Applied(request))
    }
}

fn sale_request_from_row(row: &PgRow) -> Result<SaleRequest> {
    let sale_amount: i32 = row.try_get("sale_amount")?;
    let status: String = row.try_get("status")?;

    Ok(SaleRequest {
        id: row.try_get("id")?,
        agent_id: row.try_get("agent_id")?,
        sale_amount: SaleAmount::try_from(sale_amount)
            .map_err(|_| anyhow!("unexpected stored sale amount {}", sale_amount))?,
        coins_requested: row.try_get("coins_requested")?,
        deposits_requested: row.try_get("deposits_requested")?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
        approved_by: row.try_get("approved_by")?,
        approved_at: row.try_get("approved_at")?,
    })
}

fn prize_from_row(row: &PgRow) -> Result<Prize> {
    Ok(Prize {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        coin_cost: row.try_get("coin_cost")?,
        is_limited: row.try_get("is_limited")?,
        quantity_available: row.try_get("quantity_available")?,
        is_active: row.try_get("is_active")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
    })
}

fn reward_item_from_row(row: &PgRow) -> Result<RewardBagItem> {
    let status: String = row.try_get("status")?;

    Ok(RewardBagItem {
        id: row.try_get("id")?,
        agent_id: row.try_get("agent_id")?,
        prize_id: row.try_get("prize_id")?,
        prize_name: row.try_get("prize_name")?,
        status: status.parse()?,
        redeemed_at: row.try_get("redeemed_at")?,
        used_at: row.try_get("used_at")?,
        approved_by: row.try_get("approved_by")?,
    })
}

#[async_trait]
impl SaleRequestRepository for PgStore {
    async fn insert_sale_request(&self, request: &SaleRequest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_requests (id, agent_id, sale_amount, coins_requested,
                                       deposits_requested, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(request.id)
        .bind(request.agent_id)
        .bind(request.sale_amount.value())
        .bind(request.coins_requested)
        .bind(request.deposits_requested)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn pending_sale_requests(
        &self,
        scope: Option<OwnerScope>,
    ) -> Result<Vec<PendingSaleRequest>> {
        let rows = sqlx::query(
            r#"
            SELECT sr.id, sr.agent_id, sr.sale_amount, sr.coins_requested,
                   sr.deposits_requested, sr.status, sr.created_at, sr.approved_by,
                   sr.approved_at, u.name AS agent_name, u.username AS agent_username
            FROM sale_requests sr
            LEFT JOIN users u ON u.id = sr.agent_id
            WHERE sr.status = 'pending'
              AND (
                  $1::uuid IS NULL
                  OR u.created_by IS NULL
                  OR u.created_by = $1
                  OR u.created_by IN (SELECT id FROM users WHERE role = 'super_admin')
              )
            ORDER BY sr.created_at
            "#,
        )
        .bind(scope.map(|s| s.admin_id))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(PendingSaleRequest {
                    request: sale_request_from_row(row)?,
                    agent_name: row.try_get("agent_name")?,
                    agent_username: row.try_get("agent_username")?,
                })
            })
            .collect()
    }

    async fn approve_sale_request(
        &self,
        id: Uuid,
        approver: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Transition<SaleRequest>> {
        self.decide(id, approver, at, RequestStatus::Approved).await
    }

    async fn reject_sale_request(
        &self,
        id: Uuid,
        approver: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Transition<SaleRequest>> {
        self.decide(id, approver, at, RequestStatus::Rejected).await
    }

    async fn count_pending_for_agent(&self, agent_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sale_requests WHERE agent_id = $1 AND status = 'pending'",
        )
        .bind(agent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[async_trait]
impl ShopRepository for PgStore {
    async fn active_prizes(&self) -> Result<Vec<Prize>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, coin_cost, is_limited, quantity_available,
                   is_active, created_by, created_at
            FROM prizes
            WHERE is_active
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(prize_from_row).collect()
    }

    async fn all_prizes(&self) -> Result<Vec<Prize>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, coin_cost, is_limited, quantity_available,
                   is_active, created_by, created_at
            FROM prizes
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(prize_from_row).collect()
    }

    async fn find_prize(&self, id: Uuid) -> Result<Option<Prize>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, coin_cost, is_limited, quantity_available,
                   is_active, created_by, created_at
            FROM prizes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(prize_from_row).transpose()
    }

    async fn insert_prize(&self, prize: &Prize) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO prizes (id, name, description, coin_cost, is_limited,
                                quantity_available, is_active, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(prize.id)
        .bind(&prize.name)
        .bind(&prize.description)
        .bind(prize.coin_cost)
        .bind(prize.is_limited)
        .bind(prize.quantity_available)
        .bind(prize.is_active)
        .bind(prize.created_by)
        .bind(prize.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_prize(&self, id: Uuid, changes: &PrizeChanges) -> Result<Option<Prize>> {
        let row = sqlx::query(
            r#"
            UPDATE prizes
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                coin_cost = COALESCE($4, coin_cost),
                is_limited = COALESCE($5, is_limited),
                quantity_available = CASE WHEN $6 THEN $7 ELSE quantity_available END,
                is_active = COALESCE($8, is_active)
            WHERE id = $1
            RETURNING id, name, description, coin_cost, is_limited, quantity_available,
                      is_active, created_by, created_at
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.coin_cost)
        .bind(changes.is_limited)
        .bind(changes.quantity_available.is_some())
        .bind(changes.quantity_available.flatten())
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(prize_from_row).transpose()
    }

    async fn delete_prize(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM prizes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn redeem(
        &self,
        agent_id: Uuid,
        prize_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<RedeemOutcome> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT id, name, description, coin_cost, is_limited, quantity_available,
                   is_active, created_by, created_at
            FROM prizes
            WHERE id = $1 AND is_active
            "#,
        )
        .bind(prize_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(RedeemOutcome::PrizeNotFound);
        };
        let prize = prize_from_row(&row)?;

        let debited = sqlx::query(
            r#"
            UPDATE users
            SET coins = coins - $2
            WHERE id = $1 AND role = 'agent' AND coins >= $2
            "#,
        )
        .bind(agent_id)
        .bind(prize.coin_cost)
        .execute(&mut *tx)
        .await?;

        if debited.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(RedeemOutcome::InsufficientCoins);
        }

        if prize.is_limited {
            let taken = sqlx::query(
                r#"
                UPDATE prizes
                SET quantity_available = quantity_available - 1
                WHERE id = $1 AND quantity_available > 0
                "#,
            )
            .bind(prize.id)
            .execute(&mut *tx)
            .await?;

            if taken.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(RedeemOutcome::OutOfStock);
            }
        }

        let item = RewardBagItem::unused(agent_id, &prize, at);
        sqlx::query(
            r#"
            INSERT INTO reward_bag_items (id, agent_id, prize_id, prize_name, status, redeemed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.id)
        .bind(item.agent_id)
        .bind(item.prize_id)
        .bind(&item.prize_name)
        .bind(item.status.as_str())
        .bind(item.redeemed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Agent {} redeemed prize {} as item {}", agent_id, prize.id, item.id);

        Ok(RedeemOutcome::Redeemed(item))
    }

    async fn reward_bag(&self, agent_id: Uuid) -> Result<Vec<RewardBagItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, agent_id, prize_id, prize_name, status, redeemed_at, used_at, approved_by
            FROM reward_bag_items
            WHERE agent_id = $1
            ORDER BY redeemed_at DESC
            "#,
        )
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(reward_item_from_row).collect()
    }

    async fn request_reward_use(
        &self,
        item_id: Uuid,
        agent_id: Uuid,
    ) -> Result<Transition<RewardBagItem>> {
        let row = sqlx::query(
            r#"
            UPDATE reward_bag_items
            SET status = 'pending_use'
            WHERE id = $1 AND agent_id = $2 AND status = 'unused'
            RETURNING id, agent_id, prize_id, prize_name, status, redeemed_at, used_at, approved_by
            "#,
        )
        .bind(item_id)
        .bind(agent_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Transition::Applied(reward_item_from_row(&row)?)),
            None if self.reward_item_exists(item_id, Some(agent_id)).await? => {
                Ok(Transition::WrongState)
            }
            None => Ok(Transition::NotFound),
        }
    }

    async fn pending_reward_uses(&self) -> Result<Vec<PendingRewardUse>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.agent_id, r.prize_id, r.prize_name, r.status, r.redeemed_at,
                   r.used_at, r.approved_by, u.name AS agent_name
            FROM reward_bag_items r
            LEFT JOIN users u ON u.id = r.agent_id
            WHERE r.status = 'pending_use'
            ORDER BY r.redeemed_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(PendingRewardUse {
                    item: reward_item_from_row(row)?,
                    agent_name: row.try_get("agent_name")?,
                })
            })
            .collect()
    }

    async fn approve_reward_use(
        &self,
        item_id: Uuid,
        approver: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Transition<RewardBagItem>> {
        let row = sqlx::query(
            r#"
            UPDATE reward_bag_items
            SET status = 'used', used_at = $3, approved_by = $2
            WHERE id = $1 AND status = 'pending_use'
            RETURNING id, agent_id, prize_id, prize_name, status, redeemed_at, used_at, approved_by
            "#,
        )
        .bind(item_id)
        .bind(approver)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Transition::Applied(reward_item_from_row(&row)?)),
            None if self.reward_item_exists(item_id, None).await? => Ok(Transition::WrongState),
            None => Ok(Transition::NotFound),
        }
    }
}

#[async_trait]
impl AgentRepository for PgStore {
    async fn find_agent(&self, id: Uuid) -> Result<Option<Agent>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, name, coins, deposits, total_sales, target_monthly
            FROM users
            WHERE id = $1 AND role = 'agent'
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Agent {
                id: row.try_get("id")?,
                username: row.try_get("username")?,
                name: row.try_get("name")?,
                coins: row.try_get("coins")?,
                deposits: row.try_get("deposits")?,
                total_sales: row.try_get("total_sales")?,
                target_monthly: row.try_get("target_monthly")?,
            })),
            None => Ok(None),
        }
    }

    async fn leaderboard_rows(&self) -> Result<Vec<LeaderboardRow>> {
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.name, u.deposits, u.total_sales,
                   COALESCE(SUM(p.coin_cost), 0) AS coins_redeemed
            FROM users u
            LEFT JOIN reward_bag_items r ON r.agent_id = u.id
            LEFT JOIN prizes p ON p.id = r.prize_id
            WHERE u.role = 'agent'
            GROUP BY u.id, u.name, u.deposits, u.total_sales
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(LeaderboardRow {
                    agent_id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    deposits: row.try_get("deposits")?,
                    total_sales: row.try_get("total_sales")?,
                    coins_redeemed: row.try_get("coins_redeemed")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl IncentiveStore for PgStore {
    async fn health_check(&self) -> Result<bool> {
        match common::database::health_check(&self.pool).await {
            Ok(healthy) => Ok(healthy),
            Err(e) => {
                error!("Database health check failed: {}", e);
                Ok(false)
            }
        }
    }
}
