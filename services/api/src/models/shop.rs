//! Prize catalog and reward bag models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Catalog entry an agent can spend coins on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prize {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub coin_cost: Decimal,
    pub is_limited: bool,
    /// Remaining stock, only meaningful when `is_limited`
    pub quantity_available: Option<i32>,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Prize {
    /// Whether one more unit can be handed out
    pub fn in_stock(&self) -> bool {
        !self.is_limited || self.quantity_available.is_some_and(|left| left > 0)
    }
}

/// Partial prize update. `quantity_available: Some(None)` clears the stock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrizeChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub coin_cost: Option<Decimal>,
    pub is_limited: Option<bool>,
    pub quantity_available: Option<Option<i32>>,
    pub is_active: Option<bool>,
}

impl PrizeChanges {
    pub fn is_empty(&self) -> bool {
        *self == PrizeChanges::default()
    }

    /// The prize as it would look after applying these changes
    pub fn apply_to(&self, prize: &Prize) -> Prize {
        Prize {
            name: self.name.clone().unwrap_or_else(|| prize.name.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| prize.description.clone()),
            coin_cost: self.coin_cost.unwrap_or(prize.coin_cost),
            is_limited: self.is_limited.unwrap_or(prize.is_limited),
            quantity_available: self.quantity_available.unwrap_or(prize.quantity_available),
            is_active: self.is_active.unwrap_or(prize.is_active),
            ..prize.clone()
        }
    }
}

/// Reward bag item lifecycle: `Unused -> PendingUse -> Used`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardStatus {
    Unused,
    PendingUse,
    Used,
}

impl RewardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardStatus::Unused => "unused",
            RewardStatus::PendingUse => "pending_use",
            RewardStatus::Used => "used",
        }
    }
}

impl FromStr for RewardStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unused" => Ok(RewardStatus::Unused),
            "pending_use" => Ok(RewardStatus::PendingUse),
            "used" => Ok(RewardStatus::Used),
            other => Err(anyhow::anyhow!("unknown reward status: {}", other)),
        }
    }
}

/// A redeemed prize held by an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardBagItem {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub prize_id: Uuid,
    /// Prize name at redemption time, never refreshed
    pub prize_name: String,
    pub status: RewardStatus,
    pub redeemed_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
}

impl RewardBagItem {
    pub fn unused(agent_id: Uuid, prize: &Prize, redeemed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id,
            prize_id: prize.id,
            prize_name: prize.name.clone(),
            status: RewardStatus::Unused,
            redeemed_at,
            used_at: None,
            approved_by: None,
        }
    }
}

/// Use request joined with the owning agent's display name
#[derive(Debug, Clone, Serialize)]
pub struct PendingRewardUse {
    #[serde(flatten)]
    pub item: RewardBagItem,
    pub agent_name: Option<String>,
}

/// Result of a redemption attempt. Anything but `Redeemed` left the store
/// untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum RedeemOutcome {
    Redeemed(RewardBagItem),
    PrizeNotFound,
    InsufficientCoins,
    OutOfStock,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prize(is_limited: bool, quantity_available: Option<i32>) -> Prize {
        Prize {
            id: Uuid::new_v4(),
            name: "Headphones".to_string(),
            description: String::new(),
            coin_cost: Decimal::from(2),
            is_limited,
            quantity_available,
            is_active: true,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn stock_only_matters_for_limited_prizes() {
        assert!(prize(false, None).in_stock());
        assert!(prize(true, Some(1)).in_stock());
        assert!(!prize(true, Some(0)).in_stock());
        assert!(!prize(true, None).in_stock());
    }

    #[test]
    fn changes_keep_untouched_fields() {
        let original = prize(true, Some(3));
        let changes = PrizeChanges {
            coin_cost: Some(Decimal::new(25, 1)),
            quantity_available: Some(None),
            is_limited: Some(false),
            ..Default::default()
        };

        let updated = changes.apply_to(&original);
        assert_eq!(updated.name, original.name);
        assert_eq!(updated.coin_cost, Decimal::new(25, 1));
        assert_eq!(updated.quantity_available, None);
        assert!(!updated.is_limited);
        assert_eq!(updated.id, original.id);
        assert!(PrizeChanges::default().is_empty());
        assert!(!changes.is_empty());
    }
}
