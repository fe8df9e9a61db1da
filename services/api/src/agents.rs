//! Agent dashboard and leaderboard

use common::auth::{AuthUser, Role, authorize};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    error::{ApiError, ApiResult},
    models::agent::{AgentInfo, DashboardResponse, LeaderboardEntry, LeaderboardRow},
    repositories::{AgentRepository, SaleRequestRepository},
};

/// `deposits / target * 100` to two places; 0 without a target
pub fn achievement_percentage(deposits: Decimal, target_monthly: Decimal) -> Decimal {
    if target_monthly <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (deposits / target_monthly * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub async fn dashboard<S>(store: &S, actor: &AuthUser) -> ApiResult<DashboardResponse>
where
    S: AgentRepository + SaleRequestRepository + ?Sized,
{
    authorize(actor, &[Role::Agent])?;

    let agent = store
        .find_agent(actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Agent not found".to_string()))?;
    let pending_requests = store.count_pending_for_agent(actor.id).await?;

    Ok(DashboardResponse {
        agent_info: AgentInfo {
            achievement_percentage: achievement_percentage(agent.deposits, agent.target_monthly),
            name: agent.name,
            coins: agent.coins,
            deposits: agent.deposits,
            total_sales: agent.total_sales,
            target_monthly: agent.target_monthly,
        },
        pending_requests,
    })
}

/// Order rows by deposits, highest first, and number them from 1
pub fn rank(mut rows: Vec<LeaderboardRow>, current: &AuthUser) -> Vec<LeaderboardEntry> {
    rows.sort_by(|a, b| b.deposits.cmp(&a.deposits).then_with(|| a.name.cmp(&b.name)));

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| LeaderboardEntry {
            rank: index + 1,
            is_current_user: row.agent_id == current.id,
            name: row.name,
            deposits: row.deposits,
            coins_redeemed: row.coins_redeemed,
            total_sales: row.total_sales,
        })
        .collect()
}

pub async fn leaderboard<S: AgentRepository + ?Sized>(
    store: &S,
    actor: &AuthUser,
) -> ApiResult<Vec<LeaderboardEntry>> {
    authorize(actor, &[Role::Agent])?;
    Ok(rank(store.leaderboard_rows().await?, actor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{repositories::memory::MemoryStore, workflow};
    use uuid::Uuid;

    fn row(name: &str, deposits: i64) -> LeaderboardRow {
        LeaderboardRow {
            agent_id: Uuid::new_v4(),
            name: name.to_string(),
            deposits: Decimal::from(deposits),
            total_sales: Decimal::ZERO,
            coins_redeemed: Decimal::ZERO,
        }
    }

    #[test]
    fn percentage_rounds_and_guards_zero_target() {
        assert_eq!(
            achievement_percentage(Decimal::from(1), Decimal::from(3)),
            Decimal::new(3333, 2)
        );
        assert_eq!(
            achievement_percentage(Decimal::from(5), Decimal::ZERO),
            Decimal::ZERO
        );
        assert_eq!(
            achievement_percentage(Decimal::new(15, 1), Decimal::from(1)),
            Decimal::from(150)
        );
    }

    #[test]
    fn rank_orders_by_deposits() {
        let rows = vec![row("low", 1), row("high", 9), row("mid", 4)];
        let me = AuthUser {
            id: rows[2].agent_id,
            username: "mid".to_string(),
            role: Role::Agent,
        };

        let ranked = rank(rows, &me);
        let names: Vec<&str> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["high", "mid", "low"]);
        assert_eq!(ranked[0].rank, 1);
        assert!(ranked[1].is_current_user);
        assert!(!ranked[0].is_current_user);
    }

    #[tokio::test]
    async fn dashboard_reports_ledger_and_queue() {
        let store = MemoryStore::new();
        let id = store.add_user(Role::Agent, "seller", None).await;
        store.set_target(id, Decimal::from(10)).await;
        let agent = AuthUser {
            id,
            username: "seller".to_string(),
            role: Role::Agent,
        };
        let admin = AuthUser {
            id: store.add_user(Role::Admin, "boss", None).await,
            username: "boss".to_string(),
            role: Role::Admin,
        };

        let approved = workflow::create_sale_request(&store, &agent, Some("250"))
            .await
            .unwrap();
        workflow::approve(&store, &admin, &approved.id.to_string())
            .await
            .unwrap();
        workflow::create_sale_request(&store, &agent, Some("100"))
            .await
            .unwrap();

        let view = dashboard(&store, &agent).await.unwrap();
        assert_eq!(view.pending_requests, 1);
        assert_eq!(view.agent_info.coins, Decimal::ONE);
        assert_eq!(view.agent_info.deposits, Decimal::new(15, 1));
        assert_eq!(view.agent_info.achievement_percentage, Decimal::from(15));

        assert!(matches!(dashboard(&store, &admin).await, Err(ApiError::Forbidden)));
    }
}
