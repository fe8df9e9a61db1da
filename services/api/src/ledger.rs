//! Sale amount tiers and the credit each tier earns
//!
//! Coins and deposits on an agent only ever move through an approved sale
//! request. The credit for a request is fixed from this table when the request
//! is created and is never recomputed afterwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raised for any sale amount outside the three tiers
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid sale amount")]
pub struct InvalidSaleAmount;

/// Sale amount tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleAmount {
    #[serde(rename = "100")]
    Small,
    #[serde(rename = "250")]
    Medium,
    #[serde(rename = "500")]
    Large,
}

/// Ledger movement produced by approving one sale request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credit {
    pub coins: Decimal,
    pub deposits: Decimal,
    pub sales: Decimal,
}

impl SaleAmount {
    /// Numeric sale value, added to `total_sales` on approval
    pub fn value(&self) -> i32 {
        match self {
            SaleAmount::Small => 100,
            SaleAmount::Medium => 250,
            SaleAmount::Large => 500,
        }
    }

    /// Coins and deposits earned by this tier
    pub fn credit(&self) -> Credit {
        let (coins, deposits) = match self {
            SaleAmount::Small => (Decimal::new(5, 1), Decimal::ONE),
            SaleAmount::Medium => (Decimal::ONE, Decimal::new(15, 1)),
            SaleAmount::Large => (Decimal::from(3), Decimal::from(3)),
        };

        Credit {
            coins,
            deposits,
            sales: Decimal::from(self.value()),
        }
    }
}

impl fmt::Display for SaleAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl FromStr for SaleAmount {
    type Err = InvalidSaleAmount;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "100" => Ok(SaleAmount::Small),
            "250" => Ok(SaleAmount::Medium),
            "500" => Ok(SaleAmount::Large),
            _ => Err(InvalidSaleAmount),
        }
    }
}

impl TryFrom<i32> for SaleAmount {
    type Error = InvalidSaleAmount;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            100 => Ok(SaleAmount::Small),
            250 => Ok(SaleAmount::Medium),
            500 => Ok(SaleAmount::Large),
            _ => Err(InvalidSaleAmount),
        }
    }
}

/// Credit for a raw sale amount tag
pub fn calculate(sale_amount: &str) -> Result<Credit, InvalidSaleAmount> {
    sale_amount.parse::<SaleAmount>().map(|amount| amount.credit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculate_matches_policy_table() {
        let small = calculate("100").unwrap();
        assert_eq!(small.coins, Decimal::new(5, 1));
        assert_eq!(small.deposits, Decimal::from(1));
        assert_eq!(small.sales, Decimal::from(100));

        let medium = calculate("250").unwrap();
        assert_eq!(medium.coins, Decimal::from(1));
        assert_eq!(medium.deposits, Decimal::new(15, 1));
        assert_eq!(medium.sales, Decimal::from(250));

        let large = calculate("500").unwrap();
        assert_eq!(large.coins, Decimal::from(3));
        assert_eq!(large.deposits, Decimal::from(3));
        assert_eq!(large.sales, Decimal::from(500));
    }

    #[test]
    fn calculate_rejects_other_amounts() {
        for raw in ["", "0", "99", "100.0", " 100", "1000", "-100", "abc"] {
            assert_eq!(calculate(raw), Err(InvalidSaleAmount), "accepted {:?}", raw);
        }
    }

    #[test]
    fn stored_integer_maps_back_to_tier() {
        for amount in [SaleAmount::Small, SaleAmount::Medium, SaleAmount::Large] {
            assert_eq!(SaleAmount::try_from(amount.value()), Ok(amount));
        }
        assert!(SaleAmount::try_from(300).is_err());
    }

    #[test]
    fn serializes_as_string_tag() {
        assert_eq!(serde_json::to_string(&SaleAmount::Medium).unwrap(), "\"250\"");
        let parsed: SaleAmount = serde_json::from_str("\"500\"").unwrap();
        assert_eq!(parsed, SaleAmount::Large);
    }
}
